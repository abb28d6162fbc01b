//! Attestation store client.
//!
//! The `OccurrenceStore` trait allows swapping backends (e.g. an
//! in-memory store in tests) without touching admission logic. The HTTP
//! implementation issues a single GET per call; callers are expected to
//! fetch once per admission request and share the result across
//! containers. Retry policy, if any, belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::occurrence::{ListOccurrencesResponse, Occurrence};

/// Default bound on one store round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the HTTP occurrence store.
///
/// The base URL and project id are explicit constructor inputs; there
/// are no package-level route constants.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the attestation store, e.g. `http://grafeas:8080`.
    pub base_url: String,
    /// Project whose occurrences are listed.
    pub project: String,
    /// Bound on a single request round trip.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create a config with the default request timeout.
    pub fn new(base_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project: project.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Abstraction over occurrence storage backends.
#[async_trait]
pub trait OccurrenceStore: Send + Sync {
    /// Fetch the full occurrence set for the configured project.
    async fn list_occurrences(&self) -> Result<Vec<Occurrence>, StoreError>;
}

/// HTTP/JSON occurrence store speaking the v1alpha1 listing API.
pub struct HttpOccurrenceStore {
    occurrences_url: String,
    http: reqwest::Client,
}

impl HttpOccurrenceStore {
    /// Build a client for the given store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("client construction failed: {e}")))?;

        Ok(Self {
            occurrences_url: format!(
                "{}/v1alpha1/projects/{}/occurrences",
                config.base_url.trim_end_matches('/'),
                config.project
            ),
            http,
        })
    }

    /// The fully resolved listing URL this client queries.
    #[must_use]
    pub fn occurrences_url(&self) -> &str {
        &self.occurrences_url
    }
}

#[async_trait]
impl OccurrenceStore for HttpOccurrenceStore {
    async fn list_occurrences(&self) -> Result<Vec<Occurrence>, StoreError> {
        debug!(url = %self.occurrences_url, "fetching occurrences");

        let resp = self
            .http
            .get(&self.occurrences_url)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Transport(format!(
                "non-success status {status} from {}",
                self.occurrences_url
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Transport(format!("reading response body failed: {e}")))?;

        let listing: ListOccurrencesResponse = serde_json::from_str(&body)?;
        debug!(count = listing.occurrences.len(), "occurrences fetched");
        Ok(listing.occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Serve a fixed HTTP response on a loopback socket; returns the
    /// base URL to point a client at.
    async fn canned_server(status_line: &str, body: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let response = format!(
            "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                let response = response.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = sock.read(&mut buf).await;
                    let _ = sock.write_all(response.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn url_built_from_config() {
        let store = HttpOccurrenceStore::new(&StoreConfig::new(
            "http://grafeas:8080/",
            "image-signing",
        ))
        .expect("client");
        assert_eq!(
            store.occurrences_url(),
            "http://grafeas:8080/v1alpha1/projects/image-signing/occurrences"
        );
    }

    #[tokio::test]
    async fn lists_occurrences_from_store() {
        let body = r#"{"occurrences":[{"resourceUrl":"reg/img:1"},{"resourceUrl":"reg/img:2"}]}"#;
        let base = canned_server("HTTP/1.1 200 OK", body).await;

        let store =
            HttpOccurrenceStore::new(&StoreConfig::new(base, "image-signing")).expect("client");
        let occurrences = store.list_occurrences().await.expect("listing");
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].resource_url, "reg/img:1");
    }

    #[tokio::test]
    async fn empty_listing_is_ok() {
        let base = canned_server("HTTP/1.1 200 OK", "{}").await;
        let store =
            HttpOccurrenceStore::new(&StoreConfig::new(base, "image-signing")).expect("client");
        assert!(store.list_occurrences().await.expect("listing").is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let base = canned_server("HTTP/1.1 500 Internal Server Error", "oops").await;
        let store =
            HttpOccurrenceStore::new(&StoreConfig::new(base, "image-signing")).expect("client");

        let err = store.list_occurrences().await.expect_err("must fail");
        assert!(matches!(err, StoreError::Transport(_)), "got {err:?}");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let base = canned_server("HTTP/1.1 200 OK", "{not json").await;
        let store =
            HttpOccurrenceStore::new(&StoreConfig::new(base, "image-signing")).expect("client");

        let err = store.list_occurrences().await.expect_err("must fail");
        assert!(matches!(err, StoreError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_store_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let store = HttpOccurrenceStore::new(&StoreConfig::new(
            format!("http://{addr}"),
            "image-signing",
        ))
        .expect("client");

        let err = store.list_occurrences().await.expect_err("must fail");
        assert!(matches!(err, StoreError::Transport(_)), "got {err:?}");
    }
}
