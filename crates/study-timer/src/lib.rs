//! study-timer - Countdown timer and study session history
//!
//! "Sit down, start the clock, let the numbers speak."
//!
//! The library holds everything with behaviour worth testing:
//! - The countdown state machine (idle, running, paused)
//! - The session store (sessions and duration settings as JSON files)
//! - Analytics over the stored sessions (today, week, last 7 days)
//! - A single-threaded scheduler for the periodic ticks and the alarm
//! - The `StudyTimer` controller tying them together for one process
//!
//! The binary adds the command line and the terminal UI.

pub mod alarm;
pub mod analytics;
pub mod clock;
pub mod controller;
pub mod export;
pub mod schedule;
pub mod session;
pub mod store;
pub mod timer;

pub use alarm::{Alarm, AlarmError, Silent, TerminalBell};
pub use analytics::{Analytics, DailySeries, DayTotal};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Controls, StudyTimer, TimerView};
pub use export::{ExportDocument, ExportError};
pub use schedule::{Scheduler, TaskId};
pub use session::{Session, Settings};
pub use store::{SessionStore, StoreError};
pub use timer::{Phase, Start, Stop, Tick, TimerError, TimerState};
