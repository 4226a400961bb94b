//! Token redemption: exchanges a token for its object address exactly once

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use backend_storage::share_record::{MarkViewed, ShareRecordStorageError, ShareRecordStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::expiry::DEFAULT_VIEW_WINDOW_SECS;
use super::token::ShareToken;

/// Why a token cannot be redeemed
///
/// Both reasons are the same terminal outcome; the distinction only selects the
/// message shown to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No record exists for the token
    NotFound,
    /// The token was already redeemed
    AlreadyViewed,
}

impl UnavailableReason {
    /// Machine-readable code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AlreadyViewed => "already_viewed",
        }
    }

    /// Message shown to the viewer
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::NotFound => "Image not found or already viewed",
            Self::AlreadyViewed => "This image has already been viewed",
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur during redemption
#[derive(Debug, Error)]
pub enum RedeemError {
    /// The token is unknown or consumed; terminal, never retried
    #[error("Share unavailable: {0}")]
    Unavailable(UnavailableReason),

    /// The record store failed
    #[error("Failed to redeem share: {0}")]
    Store(#[from] ShareRecordStorageError),

    /// The share service could not be reached or answered unexpectedly
    #[error("Share service request failed: {0}")]
    Transport(String),
}

impl RedeemError {
    /// Message shown to the viewer
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unavailable(reason) => reason.user_message(),
            Self::Store(_) | Self::Transport(_) => "Error loading image",
        }
    }
}

/// A successful redemption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// The redeemed token
    pub token: String,
    /// Address of the image the token unlocked
    pub object_address: String,
    /// Seconds the image may stay on screen
    pub display_secs: u64,
}

/// Anything that can redeem a share token
#[async_trait]
pub trait TokenRedemption: Send + Sync {
    /// Redeems `token`, consuming it
    ///
    /// At most one call per token ever returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `RedeemError::Unavailable` for unknown or consumed tokens
    async fn redeem(&self, token: &str) -> Result<Grant, RedeemError>;
}

/// Redeems tokens against the share record store
pub struct TokenRedeemer {
    records: Arc<dyn ShareRecordStore>,
    display_secs: u64,
}

impl TokenRedeemer {
    /// Creates a new redeemer granting the default 30 second display window
    #[must_use]
    pub fn new(records: Arc<dyn ShareRecordStore>) -> Self {
        Self {
            records,
            display_secs: DEFAULT_VIEW_WINDOW_SECS,
        }
    }

    /// Sets the display window handed out with every grant
    #[must_use]
    pub const fn with_display_secs(mut self, display_secs: u64) -> Self {
        self.display_secs = display_secs;
        self
    }

    /// Display window handed out with every grant
    #[must_use]
    pub const fn display_secs(&self) -> u64 {
        self.display_secs
    }

    /// Picks the message for a lost conditional write
    ///
    /// The outcome is already decided; this read only tells "missing" from "consumed".
    async fn unavailable_reason(&self, token: &str) -> UnavailableReason {
        match self.records.find_by_token(token).await {
            Ok(Some(record)) if record.viewed => UnavailableReason::AlreadyViewed,
            Ok(_) => UnavailableReason::NotFound,
            Err(err) => {
                debug!("Could not classify unavailable token: {err}");
                UnavailableReason::NotFound
            }
        }
    }
}

#[async_trait]
impl TokenRedemption for TokenRedeemer {
    async fn redeem(&self, token: &str) -> Result<Grant, RedeemError> {
        let Some(token) = ShareToken::parse(token) else {
            warn!("Rejected malformed share token");
            return Err(RedeemError::Unavailable(UnavailableReason::NotFound));
        };

        match self.records.conditional_mark_viewed(token.as_str()).await? {
            MarkViewed::Applied(record) => {
                info!(
                    token_prefix = token.log_prefix(),
                    display_secs = self.display_secs,
                    "Share token redeemed"
                );
                Ok(Grant {
                    token: record.token,
                    object_address: record.object_address,
                    display_secs: self.display_secs,
                })
            }
            MarkViewed::Conflict => {
                let reason = self.unavailable_reason(token.as_str()).await;
                warn!(token_prefix = token.log_prefix(), %reason, "Share token unavailable");
                Err(RedeemError::Unavailable(reason))
            }
        }
    }
}
