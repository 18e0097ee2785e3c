//! Cancellable turn countdown for Scrawl.
//!
//! A [`TurnTimer`] drives the phase transitions of a lobby: the Drawing
//! phase ends when it fires (unless everyone guessed first), the Revealing
//! phase ends when it fires again. It is built to sit inside the lobby
//! actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         () = timer.expired() => { /* advance the phase */ }
//!     }
//! }
//! ```
//!
//! While no countdown is armed, [`TurnTimer::expired`] pends forever, so
//! the `select!` simply never takes that branch. Expiry is exactly-once:
//! firing clears the armed deadline, so a stale future can never produce a
//! second phase transition, and [`TurnTimer::cancel`] after a fire is a
//! harmless no-op.
//!
//! Deadlines are absolute (`sleep_until`), so a turn's end does not drift
//! with how long command processing takes in between.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// A single-shot, cancellable countdown.
///
/// One per lobby actor. Re-armed with [`start`](Self::start) at every
/// phase transition that needs a deadline; any transition that makes the
/// running countdown moot calls [`cancel`](Self::cancel) first.
#[derive(Debug, Default)]
pub struct TurnTimer {
    /// Absolute deadline of the armed countdown. `None` = idle.
    deadline: Option<Instant>,
    /// Duration the current countdown was armed with.
    duration: Option<Duration>,
}

impl TurnTimer {
    /// Creates an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the countdown for `duration` from now.
    ///
    /// Re-arming while a countdown is already running replaces it — the
    /// previous deadline can no longer fire.
    pub fn start(&mut self, duration: Duration) {
        self.deadline = Some(Instant::now() + duration);
        self.duration = Some(duration);
        trace!(?duration, "turn timer armed");
    }

    /// Disarms the countdown. Returns `true` if a countdown was running.
    ///
    /// Idempotent: cancelling an idle timer (including one that has
    /// already fired) does nothing and returns `false`.
    pub fn cancel(&mut self) -> bool {
        let was_armed = self.deadline.take().is_some();
        self.duration = None;
        if was_armed {
            trace!("turn timer cancelled");
        }
        was_armed
    }

    /// Returns `true` while a countdown is armed and has not fired.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left on the armed countdown, or `None` when idle.
    ///
    /// Saturates at zero for a deadline that has passed but not yet been
    /// observed by [`expired`](Self::expired).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fraction of the armed duration still remaining, in `0.0..=1.0`.
    ///
    /// `None` when idle. Used by the scoring path, which rewards guesses
    /// by how much of the turn was left.
    pub fn remaining_ratio(&self) -> Option<f64> {
        let remaining = self.remaining()?;
        let total = self.duration?;
        if total.is_zero() {
            return Some(0.0);
        }
        Some((remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
    }

    /// Waits until the armed countdown elapses.
    ///
    /// Pends forever while the timer is idle — `select!` handles the other
    /// branches. On fire the deadline is cleared, so each `start` produces
    /// at most one completion.
    pub async fn expired(&mut self) {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        self.deadline = None;
        self.duration = None;
        debug!("turn timer fired");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_idle() {
        let timer = TurnTimer::new();
        assert!(!timer.is_armed());
        assert_eq!(timer.remaining(), None);
        assert_eq!(timer.remaining_ratio(), None);
    }

    #[test]
    fn test_cancel_idle_returns_false() {
        let mut timer = TurnTimer::new();
        assert!(!timer.cancel());
    }
}
