//! HTTP client abstraction for testability.
//!
//! The update engine performs exactly two kinds of request: fetching an
//! artifact's bytes and fetching its published digest as text. Both are
//! modeled on a trait so tests can inject canned responses, with a blocking
//! `reqwest` implementation for real use. The transport carries no retry
//! logic; failures surface as errors to the caller.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{UpdaterError, UpdaterResult};

/// Trait for HTTP client operations.
///
/// Implementations must be callable from multiple download threads at once.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body as bytes.
    ///
    /// A non-success status is an error; the status code is carried in the
    /// error's reason string.
    fn get_bytes(&self, url: &str) -> UpdaterResult<Vec<u8>>;

    /// Performs an HTTP GET request and returns the response body as text.
    fn get_text(&self, url: &str) -> UpdaterResult<String> {
        let bytes = self.get_bytes(url)?;
        String::from_utf8(bytes).map_err(|e| UpdaterError::FetchFailed {
            url: url.to_string(),
            reason: format!("response was not valid UTF-8: {}", e),
        })
    }
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a new client with the default request timeout.
    pub fn new() -> UpdaterResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> UpdaterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpdaterError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// The request timeout this client enforces.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    fn get_bytes(&self, url: &str) -> UpdaterResult<Vec<u8>> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                UpdaterError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                UpdaterError::FetchFailed {
                    url: url.to_string(),
                    reason: format!("request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| UpdaterError::FetchFailed {
                url: url.to_string(),
                reason: format!("failed to read response body: {}", e),
            })
    }
}
