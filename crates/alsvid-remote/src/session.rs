//! Authenticated HTTP session.
//!
//! The poll loop and discovery call work against the [`Session`] trait rather
//! than a concrete client, so tests can script exchanges without a network.
//! [`HttpSession`] is the reqwest-backed implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;

use crate::error::{AlsvidError, AlsvidResult};

/// Per-request timeout for a single HTTP call.
///
/// Bounds one hung call independently of the overall poll timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection establishment timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A completed HTTP exchange: status code plus body text.
///
/// Non-success statuses are data, not errors — the caller classifies them.
/// Only connection-level failures surface as [`AlsvidError::Transport`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> AlsvidResult<Value> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// Authenticated JSON GET/POST over HTTP.
///
/// Implementations must surface connection failures as
/// [`AlsvidError::Transport`] and return `Ok` for any completed exchange,
/// whatever the status code. Implementations must be safe for reuse across
/// sequential calls.
#[async_trait]
pub trait Session: Send + Sync {
    /// Issue a GET request and return the raw exchange.
    async fn get_json(&self, url: &str) -> AlsvidResult<HttpResponse>;

    /// Issue a POST request with a JSON body and return the raw exchange.
    async fn post_json(&self, url: &str, body: &Value) -> AlsvidResult<HttpResponse>;
}

/// reqwest-backed [`Session`] with per-request timeouts and optional
/// Bearer-token authentication.
pub struct HttpSession {
    /// HTTP client with timeouts and default headers configured.
    client: Client,
    /// Whether a token was configured (the token itself lives in the
    /// client's default headers).
    authenticated: bool,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("token", &if self.authenticated { "[REDACTED]" } else { "<none>" })
            .finish()
    }
}

impl HttpSession {
    /// Create an unauthenticated session.
    pub fn new() -> AlsvidResult<Self> {
        Self::build(None)
    }

    /// Create a session authenticated with a Bearer token.
    pub fn with_token(token: impl Into<String>) -> AlsvidResult<Self> {
        Self::build(Some(token.into()))
    }

    fn build(token: Option<String>) -> AlsvidResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let authenticated = token.is_some();
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| AlsvidError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AlsvidError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            authenticated,
        })
    }

    /// Convert a reqwest response into an [`HttpResponse`].
    async fn into_response(resp: reqwest::Response) -> AlsvidResult<HttpResponse> {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AlsvidError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn get_json(&self, url: &str) -> AlsvidResult<HttpResponse> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AlsvidError::Transport(e.to_string()))?;
        Self::into_response(resp).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> AlsvidResult<HttpResponse> {
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AlsvidError::Transport(e.to_string()))?;
        Self::into_response(resp).await
    }
}
