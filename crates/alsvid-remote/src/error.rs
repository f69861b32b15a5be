//! Error types for the remote compilation client.

use std::time::Duration;

use thiserror::Error;

/// Result type for remote compilation operations.
pub type AlsvidResult<T> = Result<T, AlsvidError>;

/// Errors that can occur while submitting or polling a compilation job.
///
/// "Not ready yet" is never an error — it drives continued polling and is
/// handled inside the poll loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlsvidError {
    /// Connection-level failure (DNS, TLS, refused connection, hung request),
    /// or a rejected upload during submission.
    ///
    /// Distinct from [`AlsvidError::Remote`]: a transport failure means no
    /// well-formed HTTP exchange completed. During polling this class is
    /// retryable; during submission it is surfaced and the caller decides
    /// whether to resubmit.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote answered a poll with a non-success HTTP status that is not
    /// a "not ready" signal.
    #[error("remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// A payload was received but could not be parsed. Terminal: a
    /// structurally invalid payload will never become valid by polling again.
    #[error("decode error: {0}")]
    Decode(String),

    /// The remote reported that the compilation job itself failed.
    #[error("compilation failed with status {0}")]
    CompilationFailed(String),

    /// The configured poll timeout elapsed before a result arrived.
    #[error("timeout exceeded after {elapsed:?} waiting for compilation result")]
    TimeoutExceeded { elapsed: Duration },

    /// The poll loop was cancelled before a result arrived.
    #[error("compilation polling cancelled")]
    Cancelled,

    /// The API token is not a valid HTTP header value.
    #[error("invalid API token: not a valid header value")]
    InvalidToken,

    /// The submission request could not be serialized for upload.
    #[error("invalid submission request: {0}")]
    InvalidRequest(String),

    /// Operation not permitted in the client's current lifecycle state.
    #[error("cannot {attempted} in state {state}")]
    InvalidState {
        state: &'static str,
        attempted: &'static str,
    },
}

impl From<serde_json::Error> for AlsvidError {
    fn from(e: serde_json::Error) -> Self {
        AlsvidError::Decode(e.to_string())
    }
}
