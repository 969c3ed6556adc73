//! Byte fetching abstraction.
//!
//! Every network read the client performs goes through [`Fetcher`]: one
//! GET, one timeout, bytes or a typed failure. No retries live here — a
//! timeout is a [`FetchError`] like any other, and callers wanting
//! resilience wrap the orchestrator, not the transport.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use miette::Diagnostic;
use thiserror::Error;
use url::Url;

/// Errors from a single fetch attempt.
#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    #[diagnostic(
        code(gantry_client::fetch_failed),
        help("check network connectivity and the repository origin url")
    )]
    Failed { url: String, reason: String },

    #[error("request to {url} timed out after {timeout:?}")]
    #[diagnostic(code(gantry_client::fetch_timeout))]
    TimedOut { url: String, timeout: Duration },

    #[error("unexpected HTTP status {status} from {url}")]
    #[diagnostic(code(gantry_client::fetch_status))]
    Status { url: String, status: u16 },
}

/// Bounded-wait byte fetching.
///
/// `Clone` so closure downloads can fan the fetcher out across concurrent
/// requests; implementations share connection state internally (the reqwest
/// client is already an `Arc` inside).
#[trait_variant::make(Send)]
pub trait Fetcher: Clone {
    /// Fetch `url`, waiting at most `timeout`
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Bytes, FetchError>;
}

/// HTTP fetcher over a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher with a fresh client
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher over an existing client (shared pools, custom TLS, ...)
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::TimedOut {
                        url: url.to_string(),
                        timeout,
                    }
                } else {
                    FetchError::Failed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::TimedOut {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                FetchError::Failed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

/// Fixture-backed fetcher serving a url → bytes map.
///
/// Useful for tests and offline mirrors. Unknown urls fail the same way an
/// unreachable server would.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    responses: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bytes served for `url`
    pub fn insert(&self, url: &Url, bytes: impl Into<Bytes>) {
        self.responses
            .write()
            .expect("fetcher map lock poisoned")
            .insert(url.to_string(), bytes.into());
    }

    /// Remove a fixture, simulating the file disappearing from the origin
    pub fn remove(&self, url: &Url) {
        self.responses
            .write()
            .expect("fetcher map lock poisoned")
            .remove(&url.to_string());
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> Result<Bytes, FetchError> {
        self.responses
            .read()
            .expect("fetcher map lock poisoned")
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Failed {
                url: url.to_string(),
                reason: "no fixture registered for url".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_fetcher_roundtrip() {
        let fetcher = MemoryFetcher::new();
        let url = Url::parse("https://repo.example/manifest.json").unwrap();
        fetcher.insert(&url, &b"{}"[..]);

        let bytes = fetcher.fetch(&url, Duration::from_secs(1)).await.unwrap();
        assert_eq!(&bytes[..], b"{}");

        fetcher.remove(&url);
        assert!(matches!(
            fetcher.fetch(&url, Duration::from_secs(1)).await,
            Err(FetchError::Failed { .. })
        ));
    }
}
