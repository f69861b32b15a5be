//! Endpoint discovery for the transpiler service.
//!
//! A directory call returns a fresh upload/download URL pair per session.
//! The pair is the correlation token for a submission — the remote issues no
//! job identifier in this protocol.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{AlsvidError, AlsvidResult};
use crate::session::Session;

/// Path prefix of the transpiler service directory call.
const SERVICE_PATH_PREFIX: &str = "transpilerService";

/// The upload/download URI pair correlating a submission with its result.
///
/// Treat the pair as an opaque, short-lived capability: the service derives
/// it from the request path, making it effectively single-use. Do not cache
/// a pair across sessions or reuse one for a second submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEndpoints {
    /// Object-storage URL the payload is uploaded to.
    pub upload_url: String,
    /// Object-storage URL polled for the result.
    pub download_url: String,
}

/// Resolves a fresh [`ServiceEndpoints`] pair from the directory call.
///
/// Whether `base_url` is a full third-party function endpoint or a path on
/// the main API host is deployment configuration; the resolver does not care.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    base_url: String,
    preset: u32,
}

impl EndpointResolver {
    /// Create a resolver for the given API base URL and compiler preset.
    pub fn new(base_url: impl Into<String>, preset: u32) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            preset,
        }
    }

    /// The configured compiler preset.
    pub fn preset(&self) -> u32 {
        self.preset
    }

    /// Issue the directory call and return a fresh endpoint pair.
    ///
    /// Each call uses a new timestamped path, so each call yields a distinct
    /// pair.
    #[instrument(skip(self, session))]
    pub async fn resolve<S: Session>(&self, session: &S) -> AlsvidResult<ServiceEndpoints> {
        let url = format!(
            "{}/{}",
            self.base_url,
            service_path(Utc::now().timestamp(), self.preset)
        );
        debug!("resolving transpiler service endpoints via {}", url);

        let response = session.get_json(&url).await?;
        if !response.is_success() {
            return Err(AlsvidError::Remote {
                status: response.status,
                body: response.body,
            });
        }

        let endpoints: ServiceEndpoints = serde_json::from_str(&response.body)?;
        Ok(endpoints)
    }
}

/// Build the timestamped directory path for one discovery call.
fn service_path(timestamp: i64, preset: u32) -> String {
    format!("{SERVICE_PATH_PREFIX}-{timestamp}-{preset}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::HttpResponse;
    use async_trait::async_trait;
    use serde_json::Value;

    #[test]
    fn test_service_path_format() {
        assert_eq!(service_path(1700000000, 2), "transpilerService-1700000000-2");
    }

    #[test]
    fn test_endpoints_deserialize() {
        let endpoints: ServiceEndpoints = serde_json::from_str(
            r#"{"upload_url":"https://storage.example/up","download_url":"https://storage.example/down"}"#,
        )
        .unwrap();
        assert_eq!(endpoints.upload_url, "https://storage.example/up");
        assert_eq!(endpoints.download_url, "https://storage.example/down");
    }

    #[test]
    fn test_endpoints_require_both_urls() {
        let result: Result<ServiceEndpoints, _> =
            serde_json::from_str(r#"{"upload_url":"https://storage.example/up"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let resolver = EndpointResolver::new("https://api.example/v1/", 3);
        assert_eq!(resolver.base_url, "https://api.example/v1");
    }

    /// Session answering every GET with one canned response.
    struct CannedSession {
        response: HttpResponse,
    }

    #[async_trait]
    impl Session for CannedSession {
        async fn get_json(&self, _url: &str) -> AlsvidResult<HttpResponse> {
            Ok(self.response.clone())
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> AlsvidResult<HttpResponse> {
            unreachable!("discovery never POSTs")
        }
    }

    #[tokio::test]
    async fn test_resolve_parses_endpoint_pair() {
        let session = CannedSession {
            response: HttpResponse {
                status: 200,
                body: r#"{"upload_url":"https://s3/up","download_url":"https://s3/down"}"#.into(),
            },
        };
        let endpoints = EndpointResolver::new("https://api.example", 1)
            .resolve(&session)
            .await
            .unwrap();
        assert_eq!(endpoints.upload_url, "https://s3/up");
        assert_eq!(endpoints.download_url, "https://s3/down");
    }

    #[tokio::test]
    async fn test_resolve_surfaces_http_error() {
        let session = CannedSession {
            response: HttpResponse {
                status: 503,
                body: "service unavailable".into(),
            },
        };
        let err = EndpointResolver::new("https://api.example", 1)
            .resolve(&session)
            .await
            .unwrap_err();
        assert!(matches!(err, AlsvidError::Remote { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_resolve_rejects_malformed_body() {
        let session = CannedSession {
            response: HttpResponse {
                status: 200,
                body: "<html>gateway</html>".into(),
            },
        };
        let err = EndpointResolver::new("https://api.example", 1)
            .resolve(&session)
            .await
            .unwrap_err();
        assert!(matches!(err, AlsvidError::Decode(_)));
    }
}
