//! Remote compilation client: one submission, sequential polling.
//!
//! The client binds an HTTP session, a payload codec and a resolved
//! [`ServiceEndpoints`] pair, uploads one compilation payload, then polls the
//! download URL at a fixed interval until a decodable result, a terminal
//! error, a timeout, or cancellation.
//!
//! Lifecycle:
//!
//! ```text
//!   Created ──submit──▶ Submitted ──poll──▶ { Ready | TimedOut | Failed | Cancelled }
//! ```
//!
//! Terminal states are final; exactly one submission occurs per client
//! instance and polling never resubmits.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::codec::PayloadCodec;
use crate::discovery::ServiceEndpoints;
use crate::error::{AlsvidError, AlsvidResult};
use crate::session::{HttpResponse, Session};
use crate::status::{ApiJobStatus, StatusResponse};

/// Default fixed poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// JSON key the compiler options are merged under in the upload body.
const OPTIONS_KEY: &str = "compile_options";

/// An upload payload plus optional compiler configuration.
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    payload: Value,
    options: Option<serde_json::Map<String, Value>>,
}

impl SubmissionRequest {
    /// Wrap an encoded payload with no compiler options.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            options: None,
        }
    }

    /// Attach compiler options, merged into the upload body at submission.
    pub fn with_options(mut self, options: serde_json::Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    /// The encoded payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The compiler options, if any.
    pub fn options(&self) -> Option<&serde_json::Map<String, Value>> {
        self.options.as_ref()
    }

    /// Build the upload body: the payload object with any options merged
    /// under a single configuration key.
    fn to_body(&self) -> AlsvidResult<Value> {
        let mut body = match &self.payload {
            Value::Object(map) => map.clone(),
            other => {
                return Err(AlsvidError::InvalidRequest(format!(
                    "upload payload must be a JSON object, got {other}"
                )));
            }
        };
        if let Some(options) = &self.options {
            body.insert(OPTIONS_KEY.to_string(), Value::Object(options.clone()));
        }
        Ok(Value::Object(body))
    }
}

/// Backoff growth applied to the poll interval after each attempt.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    factor: f64,
    max_interval: Duration,
}

/// Polling behavior: fixed interval by default, optional overall timeout,
/// optional multiplicative backoff.
#[derive(Debug, Clone)]
pub struct PollConfig {
    interval: Duration,
    timeout: Option<Duration>,
    backoff: Option<Backoff>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollConfig {
    /// Poll at a fixed interval with no overall timeout.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            backoff: None,
        }
    }

    /// Bound the total time spent polling.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Grow the interval by `factor` after each attempt, capped at
    /// `max_interval`. Factors below 1.0 are clamped to 1.0.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = Some(Backoff {
            factor: factor.max(1.0),
            max_interval,
        });
        self
    }

    /// The initial poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The overall timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The interval to use after one more attempt at `current`.
    fn next_interval(&self, current: Duration) -> Duration {
        match self.backoff {
            None => current,
            Some(backoff) => current.mul_f64(backoff.factor).min(backoff.max_interval),
        }
    }
}

/// Classification of a single poll attempt. Never persisted.
#[derive(Debug)]
pub enum PollResult {
    /// No result yet; keep polling.
    Pending,
    /// A decodable payload arrived.
    Ready(Value),
    /// A terminal failure; polling stops.
    Failed(AlsvidError),
}

/// Classify one download-URL response.
///
/// - 404, 204, an empty body, or a status document in a non-terminal state
///   are the "not ready" sentinels → [`PollResult::Pending`].
/// - Any other non-success status → [`AlsvidError::Remote`].
/// - A status document reporting an error or cancelled job → terminal
///   failure.
/// - Any other 2xx JSON body is the result payload → [`PollResult::Ready`];
///   a 2xx body that is not JSON at all is malformed and terminal.
fn classify_response(response: &HttpResponse) -> PollResult {
    if response.status == 404 || response.status == 204 {
        return PollResult::Pending;
    }
    if !response.is_success() {
        return PollResult::Failed(AlsvidError::Remote {
            status: response.status,
            body: response.body.clone(),
        });
    }
    if response.body.trim().is_empty() {
        return PollResult::Pending;
    }

    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => return PollResult::Failed(AlsvidError::Decode(e.to_string())),
    };

    if let Ok(doc) = serde_json::from_value::<StatusResponse>(value.clone()) {
        if doc.status.is_pending() {
            return PollResult::Pending;
        }
        if doc.status.is_terminal() && doc.status != ApiJobStatus::Completed {
            return PollResult::Failed(AlsvidError::CompilationFailed(doc.status.to_string()));
        }
        // COMPLETED: the result payload replaces the status document at the
        // download URL, so fall through and let the codec decide.
    }

    PollResult::Ready(value)
}

/// Client lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Constructed; nothing uploaded yet.
    Created,
    /// Payload uploaded; polling may begin.
    Submitted,
    /// A decoded result was returned. Terminal.
    Ready,
    /// The poll timeout elapsed. Terminal.
    TimedOut,
    /// Submission or polling hit a terminal error. Terminal.
    Failed,
    /// Polling was cancelled. Terminal.
    Cancelled,
}

impl ClientState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created | Self::Submitted)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Submitted => "Submitted",
            Self::Ready => "Ready",
            Self::TimedOut => "TimedOut",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Opaque acknowledgement returned by the upload POST.
///
/// The remote is not required to return a job identifier — the endpoint
/// pair itself is the correlation token — so the body is kept raw.
#[derive(Debug, Clone)]
pub struct Acknowledgement {
    /// HTTP status of the upload response.
    pub status: u16,
    /// Raw acknowledgement body.
    pub body: String,
}

/// One or more compiled computations plus poll diagnostics.
///
/// Owned exclusively by the caller once returned.
#[derive(Debug)]
pub struct CompilationOutcome<T> {
    /// The decoded computations.
    pub computations: Vec<T>,
    /// Time elapsed between the start of polling and the result.
    pub elapsed: Duration,
    /// Number of GET attempts issued.
    pub attempts: u32,
}

/// Orchestrates one submission to the upload URL and sequential polling of
/// the download URL until success, timeout, or cancellation.
///
/// Construction performs no network I/O. The endpoint pair is consumed at
/// most once for upload and thereafter only for download polls.
pub struct RemoteCompilationClient<S, C> {
    session: S,
    codec: C,
    endpoints: ServiceEndpoints,
    state: ClientState,
}

impl<S: Session, C: PayloadCodec> RemoteCompilationClient<S, C> {
    /// Bind a session, codec and resolved endpoint pair.
    pub fn new(session: S, codec: C, endpoints: ServiceEndpoints) -> Self {
        Self {
            session,
            codec,
            endpoints,
            state: ClientState::Created,
        }
    }

    /// The client's current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// The bound endpoint pair.
    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// The bound HTTP session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// POST the payload (with options merged) to the upload URL.
    ///
    /// Exactly one submission is permitted per client instance. A rejected
    /// or failed upload is not retried internally and leaves the client in
    /// `Created`; the caller decides whether to resubmit — typically with a
    /// fresh endpoint pair, since the pair is effectively single-use.
    #[instrument(skip(self, request))]
    pub async fn submit(&mut self, request: &SubmissionRequest) -> AlsvidResult<Acknowledgement> {
        if self.state != ClientState::Created {
            return Err(AlsvidError::InvalidState {
                state: self.state.name(),
                attempted: "submit",
            });
        }

        let body = request.to_body()?;
        info!("uploading compilation payload to {}", self.endpoints.upload_url);

        let response = self.session.post_json(&self.endpoints.upload_url, &body).await?;
        if !response.is_success() {
            // Submission failures are transport-class regardless of whether
            // the connection or the HTTP exchange failed.
            return Err(AlsvidError::Transport(format!(
                "upload rejected with HTTP {}: {}",
                response.status, response.body
            )));
        }

        self.state = ClientState::Submitted;
        info!("compilation payload submitted");
        Ok(Acknowledgement {
            status: response.status,
            body: response.body,
        })
    }

    /// Poll the download URL until a decodable payload arrives, a terminal
    /// error occurs, the timeout elapses, or `cancel` fires.
    ///
    /// Each iteration checks cancellation, checks the timeout against a
    /// monotonic start time, sleeps for the current interval (racing the
    /// cancellation token, so no network call is issued after cancellation
    /// is observed), then issues one GET. Without a timeout and with a
    /// remote that never produces a payload or terminal error, the loop
    /// runs indefinitely — by design; callers wanting a bound must set one.
    #[instrument(skip_all)]
    pub async fn poll(
        &mut self,
        config: &PollConfig,
        cancel: &CancellationToken,
    ) -> AlsvidResult<CompilationOutcome<C::Computation>> {
        if self.state != ClientState::Submitted {
            return Err(AlsvidError::InvalidState {
                state: self.state.name(),
                attempted: "poll",
            });
        }

        let start = Instant::now();
        let mut interval = config.interval();
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                self.state = ClientState::Cancelled;
                return Err(AlsvidError::Cancelled);
            }

            let elapsed = start.elapsed();
            if let Some(timeout) = config.timeout() {
                if elapsed >= timeout {
                    self.state = ClientState::TimedOut;
                    return Err(AlsvidError::TimeoutExceeded { elapsed });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.state = ClientState::Cancelled;
                    return Err(AlsvidError::Cancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }

            attempts += 1;
            let classified = match self.session.get_json(&self.endpoints.download_url).await {
                // The download URL may not exist in object storage yet;
                // connection-level failures during polling are retryable.
                Err(AlsvidError::Transport(reason)) => {
                    debug!("poll transport failure treated as pending: {}", reason);
                    PollResult::Pending
                }
                Err(other) => {
                    self.state = ClientState::Failed;
                    return Err(other);
                }
                Ok(response) => classify_response(&response),
            };

            match classified {
                PollResult::Pending => {
                    debug!(
                        "result not ready (attempt {}, elapsed {:?})",
                        attempts,
                        start.elapsed()
                    );
                }
                PollResult::Ready(payload) => {
                    let computations = match self.codec.decode(&payload) {
                        Ok(computations) => computations,
                        Err(e) => {
                            self.state = ClientState::Failed;
                            return Err(e);
                        }
                    };
                    self.state = ClientState::Ready;
                    let elapsed = start.elapsed();
                    info!(
                        "compilation result ready after {:?} ({} poll attempts)",
                        elapsed, attempts
                    );
                    return Ok(CompilationOutcome {
                        computations,
                        elapsed,
                        attempts,
                    });
                }
                PollResult::Failed(err) => {
                    self.state = ClientState::Failed;
                    return Err(err);
                }
            }

            interval = config.next_interval(interval);
        }
    }

    /// Submit then poll to completion without external cancellation.
    pub async fn run(
        &mut self,
        request: &SubmissionRequest,
        config: &PollConfig,
    ) -> AlsvidResult<CompilationOutcome<C::Computation>> {
        self.submit(request).await?;
        self.poll(config, &CancellationToken::new()).await
    }
}
