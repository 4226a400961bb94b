//! Viewer side of a share link
//!
//! A [`ViewSession`] redeems a token, loads the granted image and owns the display
//! countdown. The countdown starts only once the image is in hand and stops when
//! the session is closed or dropped.

mod client;
mod fetcher;

use std::time::Duration;

use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub use client::HttpShareClient;
pub use fetcher::{FetchError, HttpImageFetcher, ImageFetcher};

use crate::share::{spawn_countdown, ExpiryEvent, ExpiryHandle, Grant, RedeemError, TokenRedemption};

/// Path of the upload screen the viewer returns to
pub const UPLOAD_SCREEN_PATH: &str = "/";

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Errors that can end a view before the image is shown
#[derive(Debug, Error)]
pub enum ViewError {
    /// Redemption failed; the image was never granted
    #[error(transparent)]
    Redeem(#[from] RedeemError),

    /// The image was granted but could not be loaded
    ///
    /// The grant stays consumed: a failed render still burns the view.
    #[error("Granted image could not be displayed: {0}")]
    Display(#[source] FetchError),
}

impl ViewError {
    /// Message shown to the viewer
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Redeem(err) => err.user_message(),
            Self::Display(_) => "Failed to load image",
        }
    }
}

/// How a view ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewExit {
    /// The display window elapsed; the viewer is sent back to the upload screen
    Expired,
    /// The session was torn down before the window elapsed
    Closed,
}

impl ViewExit {
    /// Where the viewer is sent once the view ends
    ///
    /// Only an elapsed window forces navigation; a closed session is already gone.
    #[must_use]
    pub const fn redirect_to(self) -> Option<&'static str> {
        match self {
            Self::Expired => Some(UPLOAD_SCREEN_PATH),
            Self::Closed => None,
        }
    }
}

/// A granted image on screen with its running countdown
#[derive(Debug)]
pub struct ViewSession {
    grant: Grant,
    image: Bytes,
    seconds_left: u64,
    countdown: ExpiryHandle,
    events: mpsc::UnboundedReceiver<ExpiryEvent>,
}

impl ViewSession {
    /// Redeems `token`, fetches the image and starts the granted countdown
    ///
    /// # Errors
    ///
    /// - `ViewError::Redeem` - the token was unknown, consumed, or redemption failed
    /// - `ViewError::Display` - the image could not be fetched after the grant
    pub async fn open<R, F>(
        redeemer: &R,
        fetcher: &F,
        token: &str,
    ) -> Result<Self, ViewError>
    where
        R: TokenRedemption + ?Sized,
        F: ImageFetcher + ?Sized,
    {
        let grant = redeemer.redeem(token).await?;

        let image = fetcher.fetch(&grant.object_address).await.map_err(|err| {
            warn!("Granted image failed to load: {err}");
            ViewError::Display(err)
        })?;

        let window_secs = grant.display_secs;
        let (countdown, events) = spawn_countdown(window_secs, TICK_PERIOD);
        info!(window_secs, "Displaying granted image");

        Ok(Self {
            grant,
            image,
            seconds_left: window_secs,
            countdown,
            events,
        })
    }

    /// The redemption behind this session
    #[must_use]
    pub const fn grant(&self) -> &Grant {
        &self.grant
    }

    /// The image bytes
    #[must_use]
    pub const fn image(&self) -> &Bytes {
        &self.image
    }

    /// Seconds left on screen as of the last observed event
    #[must_use]
    pub const fn seconds_left(&self) -> u64 {
        self.seconds_left
    }

    /// Waits for the next countdown event
    ///
    /// Returns `None` once the countdown is over or cancelled.
    pub async fn next_event(&mut self) -> Option<ExpiryEvent> {
        let event = self.events.recv().await?;
        self.seconds_left = match event {
            ExpiryEvent::Tick { seconds_left } => seconds_left,
            ExpiryEvent::Expired => 0,
        };
        Some(event)
    }

    /// Drives the countdown to its end
    pub async fn wait(mut self) -> ViewExit {
        while let Some(event) = self.next_event().await {
            if event == ExpiryEvent::Expired {
                return ViewExit::Expired;
            }
        }
        ViewExit::Closed
    }

    /// Tears the session down, stopping the countdown
    pub async fn close(self) -> ViewExit {
        self.countdown.shutdown().await;
        ViewExit::Closed
    }
}
