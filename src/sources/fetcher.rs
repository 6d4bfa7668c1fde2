//! Fetcher trait - the network seam for archive downloads.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use url::Url;

/// A failed download or extraction. Recorded in the run log; never fatal
/// for the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid registry URL `{registry}`: {message}")]
    InvalidRegistry { registry: String, message: String },

    #[error("failed to download {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to download {url}: HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("failed to extract {}: {message}", archive.display())]
    Extract { archive: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive did not unpack to {}", expected.display())]
    MissingDirectory { expected: PathBuf },
}

/// Something that can download a package archive.
pub trait ArchiveFetcher {
    /// Download the archive at `url` and return its bytes.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher backed by a blocking HTTP client.
///
/// Redirects are followed (the public registry answers downloads with a
/// redirect to its CDN). There are no retries.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher sending `user_agent`, with an optional per-request
    /// timeout. `None` waits indefinitely.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: format!("{:#}", anyhow::Error::new(e)),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(bytes.to_vec())
    }
}
