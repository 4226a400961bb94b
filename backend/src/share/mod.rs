//! One-time share lifecycle: issue, redeem, display window

mod expiry;
mod issuer;
mod redeemer;
mod token;
mod upload;

pub use expiry::{
    spawn_countdown, ExpiryEvent, ExpiryHandle, ExpiryState, ExpiryTimer,
    DEFAULT_VIEW_WINDOW_SECS,
};
pub use issuer::{IssueError, ShareLink, TokenIssuer};
pub use redeemer::{Grant, RedeemError, TokenRedeemer, TokenRedemption, UnavailableReason};
pub use token::{ShareToken, TOKEN_LEN};
pub use upload::{ImageUpload, UploadError, UploadService, ValidationError, MAX_UPLOAD_BYTES};
