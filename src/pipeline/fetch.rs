//! Network fetch: download the bytes behind a URL.
//!
//! The resolver only needs "give me the bytes at this URL or tell me why
//! not", so the capability is a one-method trait. [`HttpFetcher`] is the
//! production implementation; tests substitute a recording fake.

use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Why a fetch failed. Converted to
/// [`crate::error::GatewayError::BibliographyFetchFailed`] by the resolver.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("unsupported URL scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("{0}")]
    Transport(String),
}

/// Capability: return the body at `url` or fail.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher backed by a shared `reqwest::Client` with a total timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("pandoc-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        info!("Downloading bibliography from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        info!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
