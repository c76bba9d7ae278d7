//! Countdown state machine
//!
//! Idle -> Running (start), Running -> Paused (pause), Paused -> Running
//! (start again, a resume), Running/Paused -> Idle (stop, or the countdown
//! reaching zero). Time is always passed in, so the machine itself never
//! reads a clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::session::{Session, Settings};

/// Runs stopped before this much wall-clock time are not recorded
pub const MIN_PARTIAL_MILLIS: u64 = 30_000;

/// Where the timer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
        }
    }
}

/// Transitions the current phase does not allow
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,

    #[error("no run in progress")]
    NotActive,
}

/// How `start` entered Running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    Fresh,
    Resumed,
}

/// Result of one countdown tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Counting { remaining: u64 },
    /// The countdown hit zero; the run is over and should be stored
    Completed(Session),
    /// Tick arrived while not running and was ignored
    Ignored,
}

/// Result of a manual stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// Long enough to keep
    Saved(Session),
    /// Under `MIN_PARTIAL_MILLIS`, dropped
    Discarded { elapsed_millis: u64 },
}

/// Countdown state for the current run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    phase: Phase,
    total_seconds: u64,
    remaining_seconds: u64,
    started_at: Option<DateTime<Utc>>,
    elapsed_millis: u64,
}

impl TimerState {
    /// An idle timer showing the configured duration
    pub fn new(settings: &Settings) -> Self {
        let total = settings.total_seconds();
        Self {
            phase: Phase::Idle,
            total_seconds: total,
            remaining_seconds: total,
            started_at: None,
            elapsed_millis: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_millis
    }

    /// A run has started and not yet ended (running or paused)
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Fraction of the target already counted down, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let done = self.total_seconds.saturating_sub(self.remaining_seconds);
        done as f64 / self.total_seconds as f64
    }

    /// Apply new settings. Only an idle timer accepts them.
    pub fn reconfigure(&mut self, settings: &Settings) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        *self = Self::new(settings);
        true
    }

    /// Start a fresh run from Idle, or resume a paused one
    pub fn start(&mut self, settings: &Settings, now: DateTime<Utc>) -> Result<Start, TimerError> {
        match self.phase {
            Phase::Running => Err(TimerError::AlreadyRunning),
            Phase::Paused => {
                self.phase = Phase::Running;
                Ok(Start::Resumed)
            }
            Phase::Idle => {
                let total = settings.total_seconds();
                *self = Self {
                    phase: Phase::Running,
                    total_seconds: total,
                    remaining_seconds: total,
                    started_at: Some(now),
                    elapsed_millis: 0,
                };
                Ok(Start::Fresh)
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.phase != Phase::Running {
            return Err(TimerError::NotRunning);
        }
        self.phase = Phase::Paused;
        Ok(())
    }

    /// Count one second down. Reaching zero completes the run and returns
    /// the timer to Idle with `settings` loaded.
    pub fn tick(&mut self, settings: &Settings, now: DateTime<Utc>) -> Tick {
        if self.phase != Phase::Running {
            return Tick::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.refresh_elapsed(now);
        if self.remaining_seconds > 0 {
            return Tick::Counting {
                remaining: self.remaining_seconds,
            };
        }

        let session = Session::new(now, self.total_seconds, true);
        *self = Self::new(settings);
        Tick::Completed(session)
    }

    /// End the run early. Runs of at least `MIN_PARTIAL_MILLIS` wall-clock
    /// time, pauses included, become a session.
    pub fn stop(&mut self, settings: &Settings, now: DateTime<Utc>) -> Result<Stop, TimerError> {
        if !self.is_active() {
            return Err(TimerError::NotActive);
        }

        self.refresh_elapsed(now);
        let elapsed_millis = self.elapsed_millis;
        let total_seconds = self.total_seconds;
        *self = Self::new(settings);

        // Exactly 30 000 ms is kept: "at least 30 seconds" is the rule
        if elapsed_millis < MIN_PARTIAL_MILLIS {
            return Ok(Stop::Discarded { elapsed_millis });
        }

        let duration_seconds = elapsed_millis / 1000;
        Ok(Stop::Saved(Session::new(
            now,
            duration_seconds,
            duration_seconds == total_seconds,
        )))
    }

    /// Recompute wall-clock time since the run started
    pub fn refresh_elapsed(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.started_at {
            self.elapsed_millis = (now - started).num_milliseconds().max(0) as u64;
        }
    }
}
