//! HTTP client for the share API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::routes::v1::shares::RedeemResponse;
use crate::share::{Grant, RedeemError, TokenRedemption, UnavailableReason};
use crate::types::ApiErrorResponse;

/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Redeems tokens through a running share service
pub struct HttpShareClient {
    base_url: String,
    http_client: Client,
}

impl HttpShareClient {
    /// Creates a new client for the service at `base_url`
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }
}

#[async_trait]
impl TokenRedemption for HttpShareClient {
    async fn redeem(&self, token: &str) -> Result<Grant, RedeemError> {
        // Tokens outside the URL-safe alphabet can never be valid
        if token.is_empty()
            || !token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RedeemError::Unavailable(UnavailableReason::NotFound));
        }

        let url = format!("{}/v1/shares/{token}/redeem", self.base_url);
        let response = self
            .http_client
            .post(url)
            .send()
            .await
            .map_err(|e| RedeemError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<RedeemResponse>()
                    .await
                    .map_err(|e| RedeemError::Transport(e.to_string()))?;
                Ok(Grant {
                    token: token.to_string(),
                    object_address: body.image_url,
                    display_secs: body.display_secs,
                })
            }
            StatusCode::GONE => {
                let reason = match response.json::<ApiErrorResponse>().await {
                    Ok(body) if body.error.code == UnavailableReason::AlreadyViewed.code() => {
                        UnavailableReason::AlreadyViewed
                    }
                    _ => UnavailableReason::NotFound,
                };
                Err(RedeemError::Unavailable(reason))
            }
            status => Err(RedeemError::Transport(format!(
                "share service returned status {status}"
            ))),
        }
    }
}
