//! Debouncing of change notifications into settle signals.
//!
//! At most one settle timer is pending. Every notification restarts it for
//! the full delay; a timer that runs out sends exactly one [`Settled`].

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// A quiet period elapsed after the last change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// When the timer fired.
    pub at: Instant,
    /// Notifications coalesced into this signal.
    pub notifications: usize,
}

/// Debouncer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending,
}

/// Coalesces bursts of notifications.
///
/// The timer handle is owned here and only touched through `&mut self`, so
/// notify and restart never race with each other.
pub struct Debouncer {
    delay: Duration,
    settled: UnboundedSender<Settled>,
    timer: Option<JoinHandle<()>>,
    pending_notifications: usize,
}

impl Debouncer {
    pub fn new(delay: Duration, settled: UnboundedSender<Settled>) -> Self {
        Self {
            delay,
            settled,
            timer: None,
            pending_notifications: 0,
        }
    }

    pub fn state(&self) -> DebounceState {
        match self.timer {
            Some(ref handle) if !handle.is_finished() => DebounceState::Pending,
            _ => DebounceState::Idle,
        }
    }

    /// Record a change and restart the settle timer.
    ///
    /// A running timer is aborted and its termination awaited before the new
    /// one starts. If it already fired, the abort is a no-op.
    pub async fn notify(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
            // Ok means the timer fired before the abort landed, so this
            // notification opens a new window.
            if handle.await.is_ok() {
                self.pending_notifications = 0;
            }
        }

        if self.pending_notifications == 0 {
            trace!("Settle timer armed for {:?}", self.delay);
        }
        self.pending_notifications += 1;
        let deadline = Instant::now() + self.delay;
        let notifications = self.pending_notifications;
        let settled = self.settled.clone();

        self.timer = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            // A dropped receiver just means nobody is listening anymore.
            let _ = settled.send(Settled {
                at: Instant::now(),
                notifications,
            });
        }));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}
