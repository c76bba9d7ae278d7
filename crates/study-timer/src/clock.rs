//! Current-time providers
//!
//! Two readings: wall time stamps sessions and measures elapsed time, the
//! monotonic instant drives scheduler deadlines so ticking survives the
//! system clock being set back.

use chrono::{DateTime, TimeDelta, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of "now" for everything that measures or stamps time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic reading, never goes backwards
    fn instant(&self) -> Instant;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
///
/// Moving the wall time backwards leaves the monotonic reading where it is,
/// like an NTP correction would.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
    instant: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
            instant: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
        if let Ok(step) = by.to_std() {
            self.instant.set(self.instant.get() + step);
        }
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    /// Jump the wall time. The monotonic reading does not move.
    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn instant(&self) -> Instant {
        self.instant.get()
    }
}
