//! Alsvid Remote — transpiler service client
//!
//! This crate implements the submit-and-poll protocol of a cloud
//! transpilation service backed by object storage. A directory call yields a
//! short-lived upload/download URL pair; the payload is POSTed to the upload
//! URL and the download URL is polled until the compiled result appears.
//! The endpoint pair, not a job identifier, correlates a submission with its
//! result.
//!
//! # Protocol
//!
//! | Step | Call | Outcome |
//! |------|------|---------|
//! | Discover | `GET {base}/transpilerService-{ts}-{preset}` | [`ServiceEndpoints`] |
//! | Submit | `POST upload_url` with payload + options | opaque [`Acknowledgement`] |
//! | Poll | `GET download_url` every interval | pending sentinel, result payload, or error |
//!
//! A poll response classifies as *pending* (404, 204, empty body, transport
//! failure, or a [`StatusResponse`] in a non-terminal state), *ready* (a
//! decodable payload), or *terminal* (HTTP error status, failed job status,
//! or a malformed payload — malformed data is never retried).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use alsvid_remote::{
//!     EndpointResolver, HttpSession, JsonCodec, PollConfig, RemoteCompilationClient,
//!     SubmissionRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = HttpSession::with_token(std::env::var("ALSVID_TOKEN")?)?;
//!     let endpoints = EndpointResolver::new("https://api.example/v1", 2)
//!         .resolve(&session)
//!         .await?;
//!
//!     let mut client = RemoteCompilationClient::new(session, JsonCodec, endpoints);
//!     let request = SubmissionRequest::new(serde_json::json!({"n_qubits": 5}));
//!     let config = PollConfig::default().with_timeout(Duration::from_secs(300));
//!
//!     let outcome = client.run(&request, &config).await?;
//!     println!("compiled {} circuits in {:?}", outcome.computations.len(), outcome.elapsed);
//!     Ok(())
//! }
//! ```

mod client;
mod codec;
mod discovery;
mod error;
mod session;
mod status;

pub use client::{
    Acknowledgement, ClientState, CompilationOutcome, DEFAULT_POLL_INTERVAL, PollConfig,
    PollResult, RemoteCompilationClient, SubmissionRequest,
};
pub use codec::{JsonCodec, PayloadCodec};
pub use discovery::{EndpointResolver, ServiceEndpoints};
pub use error::{AlsvidError, AlsvidResult};
pub use session::{CONNECT_TIMEOUT, HttpResponse, HttpSession, REQUEST_TIMEOUT, Session};
pub use status::{ApiJobStatus, InfoQueue, StatusResponse};

// Re-export the cancellation token type used by `RemoteCompilationClient::poll`.
pub use tokio_util::sync::CancellationToken;
