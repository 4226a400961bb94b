//! Fetching granted images

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use thiserror::Error;

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while fetching an image
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed
    #[error("Image request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The object service answered with a non-success status
    #[error("Image request returned status {0}")]
    Status(u16),

    /// Nothing is stored at the address
    #[error("No image at {0}")]
    NotFound(String),

    /// The object is empty
    #[error("Image is empty")]
    Empty,
}

/// Loads image bytes from an object address
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetches the image stored at `address`
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the image cannot be loaded
    async fn fetch(&self, address: &str) -> Result<Bytes, FetchError>;
}

/// Fetches images over HTTP(S)
pub struct HttpImageFetcher {
    http_client: Client,
}

impl HttpImageFetcher {
    /// Creates a new fetcher
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, address: &str) -> Result<Bytes, FetchError> {
        let response = self.http_client.get(address).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(address.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(bytes)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ImageFetcher for crate::media_storage::mock::InMemoryObjectStore {
    async fn fetch(&self, address: &str) -> Result<Bytes, FetchError> {
        self.get_by_address(address)
            .map(|(bytes, _)| bytes)
            .ok_or_else(|| FetchError::NotFound(address.to_string()))
    }
}
