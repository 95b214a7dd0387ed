//! Session countdown.
//!
//! [`SessionClock`] is a plain counter advanced one second per [`tick`]. It
//! knows nothing about time sources, so session logic stays testable without
//! a runtime. [`ClockDriver`] is the periodic resource that feeds ticks into
//! a shared session from a tokio task; it is stopped explicitly, on drop, or
//! on its own once the session leaves the running state.
//!
//! [`tick`]: SessionClock::tick

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::session::{SessionState, SharedSession, TickOutcome};

/// Result of advancing the clock by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The clock is not running.
    Idle,
    Counted { remaining: u64 },
    /// The active question reached its own time limit on this tick.
    QuestionTimeUp { remaining: u64 },
    /// The session budget ran out on this tick. Reported exactly once.
    Expired,
}

/// Countdown for one session plus the per-question elapsed counter.
#[derive(Debug, Clone)]
pub struct SessionClock {
    duration: u64,
    remaining: u64,
    running: bool,
    question_elapsed: u64,
    question_limit: Option<u64>,
    question_alerted: bool,
}

impl SessionClock {
    pub fn new(duration_seconds: u64) -> Self {
        Self {
            duration: duration_seconds,
            remaining: duration_seconds,
            running: false,
            question_elapsed: 0,
            question_limit: None,
            question_alerted: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining > 0 || self.duration == 0 {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Seconds counted since start.
    pub fn elapsed(&self) -> u64 {
        self.duration - self.remaining
    }

    pub fn question_elapsed(&self) -> u64 {
        self.question_elapsed
    }

    /// Restart the per-question counter for a newly active question.
    /// `limit` of `None` disables the per-question alert.
    pub fn reset_question(&mut self, limit: Option<u64>) {
        self.question_elapsed = 0;
        self.question_limit = limit.filter(|l| *l > 0);
        self.question_alerted = false;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        self.question_elapsed += 1;

        if self.remaining == 0 {
            self.running = false;
            return Tick::Expired;
        }

        match self.question_limit {
            Some(limit) if !self.question_alerted && self.question_elapsed >= limit => {
                self.question_alerted = true;
                Tick::QuestionTimeUp {
                    remaining: self.remaining,
                }
            }
            _ => Tick::Counted {
                remaining: self.remaining,
            },
        }
    }
}

/// Drives [`AssessmentSession::tick`](crate::session::AssessmentSession::tick)
/// on a fixed period from a background task.
pub struct ClockDriver {
    handle: JoinHandle<()>,
    done: watch::Receiver<bool>,
}

impl ClockDriver {
    /// Spawn the driver on the current tokio runtime. The first tick fires one
    /// `period` after spawning.
    pub fn spawn(session: SharedSession, period: Duration) -> Self {
        let (tx, done) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately on the first call
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut guard = session.lock().await;
                let outcome = guard.tick();
                if outcome == TickOutcome::Expired {
                    tracing::debug!("clock driver observed expiry");
                }
                if guard.state() != SessionState::Running {
                    break;
                }
            }

            let _ = tx.send(true);
        });

        Self { handle, done }
    }

    /// Stop ticking immediately.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the driver exits because the session stopped running.
    /// Returns at once if the driver was aborted.
    pub async fn stopped(&mut self) {
        let _ = self.done.wait_for(|done| *done).await;
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
