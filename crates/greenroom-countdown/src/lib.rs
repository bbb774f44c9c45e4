//! Cancellable one-shot countdown for Greenroom.
//!
//! A [`Countdown`] is a deadline that can be armed, cancelled, and awaited.
//! While unarmed (or disabled) the [`expired`](Countdown::expired) future
//! pends forever, which makes it safe to use as a permanent branch in a
//! `tokio::select!` loop: the branch simply never fires until something
//! arms the countdown.
//!
//! The lobby uses this twice per room: once for the auto-start grace
//! period (armed when everyone is ready, cancelled the moment anyone
//! un-readies or leaves) and once for the optional round time limit.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* may arm or cancel */ }
//!         _ = grace.expired() => {
//!             // Re-check the start condition here — the world may have
//!             // changed between arming and firing.
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::trace;

/// A one-shot countdown with explicit arm/cancel control.
///
/// Three states:
///
/// - **disabled** — no window configured; [`arm`](Self::arm) is a no-op
///   and [`expired`](Self::expired) never resolves.
/// - **unarmed** — a window is configured but no deadline is pending.
/// - **armed** — a deadline is pending; [`expired`](Self::expired)
///   resolves once it passes, disarming the countdown.
///
/// Cancellation is a plain field write, so firing after [`cancel`]
/// (Self::cancel) is impossible — there is no task to race against.
#[derive(Debug)]
pub struct Countdown {
    window: Option<Duration>,
    deadline: Option<TokioInstant>,
}

impl Countdown {
    /// Creates an unarmed countdown with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window: Some(window),
            deadline: None,
        }
    }

    /// Creates a disabled countdown that can never fire.
    pub fn disabled() -> Self {
        Self {
            window: None,
            deadline: None,
        }
    }

    /// Creates a countdown from an optional window. `None` = disabled.
    ///
    /// Convenient for config fields like an optional round time limit.
    pub fn from_window(window: Option<Duration>) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the countdown: the deadline becomes
    /// now + window. On a disabled countdown this is a no-op.
    ///
    /// Re-arming an already-armed countdown restarts the full window.
    pub fn arm(&mut self) {
        if let Some(window) = self.window {
            self.deadline = Some(TokioInstant::now() + window);
            trace!(window_ms = window.as_millis() as u64, "countdown armed");
        }
    }

    /// Clears any pending deadline. Idempotent — cancelling an unarmed
    /// countdown does nothing.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            trace!("countdown cancelled");
        }
    }

    /// Resolves once the armed deadline passes, disarming the countdown.
    ///
    /// Unarmed or disabled countdowns pend forever, so this is safe as a
    /// permanent `select!` branch. After resolving, a fresh call pends
    /// until the countdown is armed again.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
                trace!("countdown expired");
            }
            None => {
                // Never completes — select! still processes other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether this countdown has a window at all.
    pub fn is_enabled(&self) -> bool {
        self.window.is_some()
    }

    /// Time left until the pending deadline, or `None` if unarmed.
    ///
    /// Saturates at zero for a deadline that has already passed but not
    /// yet been observed by [`expired`](Self::expired).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(TokioInstant::now()))
    }

    /// The configured window, or `None` if disabled.
    pub fn window(&self) -> Option<Duration> {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_unarmed() {
        let c = Countdown::new(Duration::from_secs(3));
        assert!(!c.is_armed());
        assert!(c.is_enabled());
        assert_eq!(c.remaining(), None);
    }

    #[test]
    fn test_disabled_is_not_enabled() {
        let c = Countdown::disabled();
        assert!(!c.is_enabled());
        assert!(!c.is_armed());
    }

    #[test]
    fn test_from_window_none_is_disabled() {
        let c = Countdown::from_window(None);
        assert!(!c.is_enabled());

        let c = Countdown::from_window(Some(Duration::from_secs(1)));
        assert!(c.is_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_sets_deadline() {
        let mut c = Countdown::new(Duration::from_secs(3));
        c.arm();
        assert!(c.is_armed());
        assert_eq!(c.remaining(), Some(Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_on_disabled_is_noop() {
        let mut c = Countdown::disabled();
        c.arm();
        assert!(!c.is_armed());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut c = Countdown::new(Duration::from_secs(3));
        c.cancel();
        c.cancel();
        assert!(!c.is_armed());
    }
}
