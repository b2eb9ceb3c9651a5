//! Remote asset fetching for report images.
//!
//! The builder talks to the image host through the [`AssetFetcher`] trait so
//! tests can substitute [`MockFetcher`] and never touch the network. The
//! real client is a blocking `reqwest` client with a bounded timeout; the
//! original design blocked indefinitely, which is resolved here with a
//! 30-second default.

use std::collections::HashMap;

use thiserror::Error;

/// Default per-request timeout for image downloads.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid image URL: {url:?}")]
    InvalidUrl { url: String },

    #[error("Image fetch for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Image fetch for {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// The URL the failing request was issued against.
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url }
            | FetchError::Status { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Network { url, .. } => url,
        }
    }
}

/// Seam between the report builder and the remote image host.
pub trait AssetFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher used in production.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_secs,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT_SECS)
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url.trim().is_empty() || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
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

        let bytes = response.bytes().map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// In-memory fetcher for tests: serves configured byte payloads and
/// answers 404 for everything else.
pub struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    pub fn with_response(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFetcher for MockFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
