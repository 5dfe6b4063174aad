//! One-shot phase timer for Quizforge.
//!
//! A trivia room has exactly one autonomous clock: the deadline of the
//! question currently on screen. [`PhaseTimer`] holds that deadline.
//!
//! # Ownership instead of callbacks
//!
//! The timer is a plain value owned by the room actor, not a spawned
//! task. Arming replaces the previous deadline and cancelling clears it,
//! so a superseded question can never fire late against newer state.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         fired = timer.expired() => {
//!             advance_question();
//!         }
//!     }
//! }
//! ```
//!
//! While disarmed, [`PhaseTimer::expired`] pends forever, leaving the
//! other `select!` branches in charge.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// How late a fire may be before it is reported as an overrun.
const DEFAULT_LATE_THRESHOLD: Duration = Duration::from_millis(50);

/// Information about a fired deadline, returned by [`PhaseTimer::expired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    /// Phase number the deadline was armed for (starts at 1).
    pub phase: u64,
    /// How far past the deadline the timer actually woke up.
    pub late_by: Duration,
    /// `true` if `late_by` exceeded the late threshold.
    pub overrun: bool,
}

/// An owned, cancellable one-shot deadline.
#[derive(Debug)]
pub struct PhaseTimer {
    deadline: Option<Instant>,
    /// Incremented on every `arm`, so callers can tell phases apart.
    phase: u64,
    late_threshold: Duration,
    fired_count: u64,
}

impl PhaseTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self {
            deadline: None,
            phase: 0,
            late_threshold: DEFAULT_LATE_THRESHOLD,
            fired_count: 0,
        }
    }

    /// Creates a disarmed timer with a custom late-fire threshold.
    pub fn with_late_threshold(late_threshold: Duration) -> Self {
        Self {
            late_threshold,
            ..Self::new()
        }
    }

    /// Arms the timer to fire `after` from now, replacing any pending
    /// deadline. Returns the new phase number.
    pub fn arm(&mut self, after: Duration) -> u64 {
        if self.deadline.is_some() {
            debug!(phase = self.phase, "re-arming phase timer");
        }
        self.phase += 1;
        self.deadline = Some(Instant::now() + after);
        trace!(
            phase = self.phase,
            after_ms = after.as_millis() as u64,
            "phase timer armed"
        );
        self.phase
    }

    /// Disarms the timer. Idempotent.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!(phase = self.phase, "phase timer cancelled");
        }
    }

    /// Waits for the armed deadline and disarms the timer.
    ///
    /// Pends forever while disarmed. Cancel safe: dropping the future
    /// before it resolves leaves the deadline armed.
    pub async fn expired(&mut self) -> TimerFired {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        self.deadline = None;
        self.fired_count += 1;

        let late_by = Instant::now().saturating_duration_since(deadline);
        let overrun = late_by > self.late_threshold;
        if overrun {
            warn!(
                phase = self.phase,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "phase timer fired late"
            );
        }

        TimerFired {
            phase: self.phase,
            late_by,
            overrun,
        }
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The phase number of the most recent `arm`.
    pub fn phase(&self) -> u64 {
        self.phase
    }

    /// How many deadlines have fired.
    pub fn fired_count(&self) -> u64 {
        self.fired_count
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}
