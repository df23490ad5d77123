//! Cancellable single-shot reconnect timer.
//!
//! Reconnect scheduling is modeled as an explicit handle instead of a
//! detached sleep task: the worker polls [`ReconnectTimer::fired`] inside
//! its select loop, and `disconnect` cancels the pending attempt by
//! dropping the deadline. Tests drive it deterministically with tokio's
//! paused clock.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;

use crate::session::SessionTarget;

/// At most one pending reconnect, as a cancellable handle.
#[derive(Debug)]
pub struct ReconnectTimer {
    pending: Option<(Pin<Box<Sleep>>, SessionTarget)>,
}

impl ReconnectTimer {
    /// Create a timer with nothing scheduled.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Schedule `target` to be retried after `delay`, replacing any
    /// previously scheduled attempt.
    pub fn schedule(&mut self, delay: Duration, target: SessionTarget) {
        self.pending = Some((Box::pin(tokio::time::sleep(delay)), target));
    }

    /// Cancel the pending attempt, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether an attempt is scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Target of the pending attempt.
    #[must_use]
    pub fn target(&self) -> Option<&SessionTarget> {
        self.pending.as_ref().map(|(_, target)| target)
    }

    /// Wait for the pending attempt to fire and take its target.
    ///
    /// Resolves only when an attempt is scheduled and its delay elapses;
    /// with nothing scheduled the future stays pending forever, which
    /// makes it safe as a bare select arm. Cancellation-safe: dropping
    /// the future leaves the deadline in place.
    pub async fn fired(&mut self) -> SessionTarget {
        if let Some((sleep, _)) = self.pending.as_mut() {
            sleep.as_mut().await;
            if let Some((_, target)) = self.pending.take() {
                return target;
            }
        }
        std::future::pending().await
    }
}

impl Default for ReconnectTimer {
    fn default() -> Self {
        Self::new()
    }
}
