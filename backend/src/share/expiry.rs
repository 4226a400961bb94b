//! Client-side display window for a granted image
//!
//! [`ExpiryTimer`] is the pure `Idle -> Counting -> Expired` state machine;
//! [`spawn_countdown`] drives it once per period on a tokio task that stops as
//! soon as its [`ExpiryHandle`] is cancelled or dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Seconds a granted image stays on screen
pub const DEFAULT_VIEW_WINDOW_SECS: u64 = 30;

/// State of the display countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryState {
    /// No image shown yet
    Idle,
    /// Image shown, this many seconds left
    Counting(u64),
    /// Window elapsed; the viewer must leave
    Expired,
}

/// Observable countdown transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryEvent {
    /// One second elapsed
    Tick {
        /// Seconds remaining after this tick
        seconds_left: u64,
    },
    /// The window is over; navigate away from the image
    Expired,
}

/// Countdown state machine
#[derive(Debug, Clone)]
pub struct ExpiryTimer {
    state: ExpiryState,
    window_secs: u64,
}

impl ExpiryTimer {
    /// Creates an idle timer for a window of `window_secs`
    #[must_use]
    pub const fn new(window_secs: u64) -> Self {
        Self {
            state: ExpiryState::Idle,
            window_secs,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ExpiryState {
        self.state
    }

    /// Starts counting; call once the image has been granted
    ///
    /// Has no effect unless the timer is idle. A zero-length window expires at once.
    pub fn start(&mut self) -> ExpiryState {
        if self.state == ExpiryState::Idle {
            self.state = if self.window_secs == 0 {
                ExpiryState::Expired
            } else {
                ExpiryState::Counting(self.window_secs)
            };
        }
        self.state
    }

    /// Advances the countdown by one second
    ///
    /// Returns `None` when idle or already expired, so expiry fires exactly once.
    pub fn tick(&mut self) -> Option<ExpiryEvent> {
        let ExpiryState::Counting(seconds_left) = self.state else {
            return None;
        };

        let seconds_left = seconds_left.saturating_sub(1);
        if seconds_left == 0 {
            self.state = ExpiryState::Expired;
            Some(ExpiryEvent::Expired)
        } else {
            self.state = ExpiryState::Counting(seconds_left);
            Some(ExpiryEvent::Tick { seconds_left })
        }
    }
}

/// Owner of a running countdown
///
/// Dropping the handle cancels the countdown; no event is delivered afterwards.
#[derive(Debug)]
pub struct ExpiryHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ExpiryHandle {
    /// Stops the countdown
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the countdown has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels the countdown and waits for its task to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ExpiryHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts a countdown of `window_secs` ticks, one every `period`
///
/// Events arrive on the returned receiver; the channel closes after
/// [`ExpiryEvent::Expired`] or on cancellation.
#[must_use]
pub fn spawn_countdown(
    window_secs: u64,
    period: Duration,
) -> (ExpiryHandle, mpsc::UnboundedReceiver<ExpiryEvent>) {
    let cancel = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let mut timer = ExpiryTimer::new(window_secs);
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        if timer.start() == ExpiryState::Expired {
            let _ = events_tx.send(ExpiryEvent::Expired);
            return;
        }

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("Display countdown cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(event) = timer.tick() else { break };
                    if events_tx.send(event).is_err() || event == ExpiryEvent::Expired {
                        break;
                    }
                }
            }
        }
    });

    (
        ExpiryHandle {
            cancel,
            task: Some(task),
        },
        events_rx,
    )
}
