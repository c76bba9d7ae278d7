//! The study timer for one process
//!
//! `StudyTimer` owns the store, clock, alarm, scheduler and countdown state.
//! The event loop feeds it user actions and calls `run_due` whenever
//! `next_deadline` passes; all work happens on that one thread.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::alarm::{Alarm, BEEP_COUNT, BEEP_SPACING_MS};
use crate::analytics::Analytics;
use crate::clock::Clock;
use crate::export::{ExportDocument, ExportError};
use crate::schedule::{Scheduler, TaskId};
use crate::session::{Session, Settings};
use crate::store::{SessionStore, StoreError};
use crate::timer::{Phase, Start, Stop, Tick, TimerState};

pub const STATUS_READY: &str = "Ready to start";
pub const STATUS_RUNNING: &str = "Timer running...";
pub const STATUS_PAUSED: &str = "Timer paused";
pub const STATUS_STOPPED: &str = "Timer stopped";
pub const STATUS_COMPLETED: &str = "Session completed! Great job!";
pub const STATUS_CLEARED: &str = "All data has been cleared.";

/// How long the completion message stays up
const COMPLETED_STATUS: Duration = Duration::from_secs(5);

/// Countdown and elapsed refresh period
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    /// One second off the countdown
    Countdown,
    /// Refresh elapsed wall-clock time for display
    Elapsed,
    /// Next beep of the alarm sequence, `left` beeps including this one
    Beep { left: u8 },
    /// Put the status line back after a completion
    ResetStatus,
}

/// What the timer screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct TimerView {
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub elapsed_millis: u64,
    pub progress: f64,
    pub active: bool,
}

/// Which controls accept input in the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub pause: bool,
    pub stop: bool,
    pub duration_inputs: bool,
}

impl Controls {
    pub fn for_phase(phase: Phase) -> Self {
        Self {
            start: phase != Phase::Running,
            pause: phase == Phase::Running,
            stop: phase != Phase::Idle,
            duration_inputs: phase == Phase::Idle,
        }
    }
}

/// Application context: one per process
pub struct StudyTimer<C: Clock, A: Alarm> {
    store: SessionStore,
    clock: C,
    alarm: A,
    scheduler: Scheduler<Job>,
    settings: Settings,
    timer: TimerState,
    countdown: Option<TaskId>,
    status_reset: Option<TaskId>,
    status: String,
}

impl<C: Clock, A: Alarm> StudyTimer<C, A> {
    pub fn new(store: SessionStore, clock: C, alarm: A) -> Self {
        let settings = store.load_settings();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(clock.instant(), TICK, Job::Elapsed);

        info!(
            hours = settings.hours,
            minutes = settings.minutes,
            data_dir = %store.data_dir().display(),
            "Study timer ready"
        );

        Self {
            timer: TimerState::new(&settings),
            store,
            clock,
            alarm,
            scheduler,
            settings,
            countdown: None,
            status_reset: None,
            status: STATUS_READY.to_string(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn view(&self) -> TimerView {
        TimerView {
            phase: self.timer.phase(),
            remaining_seconds: self.timer.remaining_seconds(),
            total_seconds: self.timer.total_seconds(),
            elapsed_millis: self.timer.elapsed_millis(),
            progress: self.timer.progress(),
            active: self.timer.is_active(),
        }
    }

    pub fn controls(&self) -> Controls {
        Controls::for_phase(self.timer.phase())
    }

    /// Change the configured duration. Ignored unless the timer is idle.
    pub fn set_duration(&mut self, settings: Settings) -> Result<bool, StoreError> {
        let settings = Settings::new(settings.hours, settings.minutes);
        if self.timer.phase() != Phase::Idle {
            debug!("Ignoring duration change while {}", self.timer.phase().as_str());
            return Ok(false);
        }
        // Persist first so memory never runs ahead of disk
        self.store.save_settings(&settings)?;
        self.settings = settings;
        self.timer.reconfigure(&settings);
        debug!(hours = settings.hours, minutes = settings.minutes, "Duration changed");
        Ok(true)
    }

    /// Nudge the configured duration by whole hours/minutes
    pub fn adjust_duration(&mut self, hours: i64, minutes: i64) -> Result<bool, StoreError> {
        let next = self.settings.adjusted(hours, minutes);
        self.set_duration(next)
    }

    /// Start a fresh run, or resume a paused one
    pub fn start(&mut self) -> Option<Start> {
        let now = self.clock.now();
        match self.timer.start(&self.settings, now) {
            Ok(kind) => {
                self.spawn_countdown(self.clock.instant());
                if let Some(id) = self.status_reset.take() {
                    self.scheduler.cancel(id);
                }
                self.status = STATUS_RUNNING.to_string();
                info!(
                    resumed = kind == Start::Resumed,
                    remaining = self.timer.remaining_seconds(),
                    "Timer started"
                );
                Some(kind)
            }
            Err(e) => {
                debug!("Ignoring start: {}", e);
                None
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.timer.pause() {
            Ok(()) => {
                self.cancel_countdown();
                self.status = STATUS_PAUSED.to_string();
                info!(remaining = self.timer.remaining_seconds(), "Timer paused");
                true
            }
            Err(e) => {
                debug!("Ignoring pause: {}", e);
                false
            }
        }
    }

    /// Stop the current run. `Ok(None)` when there was nothing to stop.
    pub fn stop(&mut self) -> Result<Option<Stop>, StoreError> {
        let now = self.clock.now();
        let outcome = match self.timer.stop(&self.settings, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("Ignoring stop: {}", e);
                return Ok(None);
            }
        };

        self.cancel_countdown();
        self.status = STATUS_STOPPED.to_string();

        match &outcome {
            Stop::Saved(session) => {
                self.store.append(session)?;
                info!(duration = session.duration_seconds, completed = session.completed, "Saved partial session");
            }
            Stop::Discarded { elapsed_millis } => {
                info!(elapsed_millis, "Run too short to record");
            }
        }
        Ok(Some(outcome))
    }

    /// When `run_due` next has work
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Time until `next_deadline`, zero if it already passed
    pub fn time_until_due(&self) -> Duration {
        self.next_deadline()
            .map(|at| at.saturating_duration_since(self.clock.instant()))
            .unwrap_or(Duration::ZERO)
    }

    /// Run every task that is due. Returns the session completed by the
    /// countdown, if it finished during this call.
    ///
    /// A failure to store the completed session is returned after the
    /// remaining due tasks (the alarm included) have run.
    pub fn run_due(&mut self) -> Result<Option<Session>, StoreError> {
        let mut completed = None;
        let mut failure = None;

        loop {
            let now = self.clock.now();
            let at = self.clock.instant();
            let due = self.scheduler.take_due(at);
            if due.is_empty() {
                break;
            }

            for (id, job) in due {
                match job {
                    Job::Countdown => {
                        if self.countdown != Some(id) {
                            self.scheduler.cancel(id);
                            continue;
                        }
                        if let Some((session, stored)) = self.on_countdown(now, at) {
                            if let Err(e) = stored {
                                failure.get_or_insert(e);
                            }
                            completed = Some(session);
                        }
                    }
                    Job::Elapsed => self.timer.refresh_elapsed(now),
                    Job::Beep { left } => self.beep(at, left),
                    Job::ResetStatus => {
                        self.status_reset = None;
                        if self.timer.phase() == Phase::Idle {
                            self.status = STATUS_READY.to_string();
                        }
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(completed),
        }
    }

    /// Aggregate stored sessions with local-time day boundaries
    pub fn analytics(&self) -> Analytics {
        self.analytics_in(&Local)
    }

    /// Aggregate stored sessions with day boundaries in `tz`
    pub fn analytics_in<Tz: TimeZone>(&self, tz: &Tz) -> Analytics {
        let now = self.clock.now().with_timezone(tz);
        Analytics::from_sessions(&self.store.list_all(), &now)
    }

    /// The export document for the current data
    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(self.store.list_all(), self.store.load_settings(), self.clock.now())
    }

    /// Write an export file into `dir`
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let document = self.export();
        let path = document.write_to(dir)?;
        info!(sessions = document.sessions.len(), path = %path.display(), "Exported data");
        Ok(path)
    }

    /// Replace all data with an export file's contents. Idle only.
    pub fn import_from(&mut self, path: &Path) -> Result<usize, ExportError> {
        if self.timer.is_active() {
            return Err(ExportError::TimerActive);
        }
        let document = ExportDocument::read_from(path)?;
        let settings = Settings::new(document.settings.hours, document.settings.minutes);

        self.store.restore(&document.sessions, &settings)?;
        self.settings = settings;
        self.timer.reconfigure(&settings);
        info!(sessions = document.sessions.len(), path = %path.display(), "Imported data");
        Ok(document.sessions.len())
    }

    /// Delete all sessions and settings. Does nothing unless `confirmed`.
    ///
    /// A run in progress keeps its target; the defaults apply from the next
    /// idle timer on.
    pub fn clear(&mut self, confirmed: bool) -> Result<bool, StoreError> {
        if !confirmed {
            debug!("Clear not confirmed, keeping data");
            return Ok(false);
        }

        self.store.clear()?;
        self.settings = Settings::default();
        self.timer.reconfigure(&self.settings);
        self.status = STATUS_CLEARED.to_string();
        warn!("Cleared all study data");
        Ok(true)
    }

    /// Tear down: cancel every task. A run still in progress is not recorded.
    pub fn shutdown(mut self) {
        if self.timer.is_active() {
            info!(
                elapsed_millis = self.timer.elapsed_millis(),
                "Discarding run in progress on shutdown"
            );
        }
        self.cancel_countdown();
        if let Some(id) = self.status_reset.take() {
            self.scheduler.cancel(id);
        }
        debug!(pending = self.scheduler.len(), "Study timer shut down");
    }

    fn on_countdown(
        &mut self,
        now: DateTime<Utc>,
        at: Instant,
    ) -> Option<(Session, Result<(), StoreError>)> {
        match self.timer.tick(&self.settings, now) {
            Tick::Counting { remaining } => {
                trace!(remaining, "Tick");
                None
            }
            Tick::Ignored => {
                self.cancel_countdown();
                None
            }
            Tick::Completed(session) => {
                self.cancel_countdown();
                let stored = self.store.append(&session);
                match &stored {
                    Ok(()) => info!(duration = session.duration_seconds, "Session completed"),
                    Err(e) => warn!("Session completed but could not be saved: {}", e),
                }

                self.beep(at, BEEP_COUNT);
                self.status = STATUS_COMPLETED.to_string();
                self.status_reset = Some(
                    self.scheduler
                        .schedule_once(at + COMPLETED_STATUS, Job::ResetStatus),
                );
                Some((session, stored))
            }
        }
    }

    fn beep(&mut self, at: Instant, left: u8) {
        if left == 0 {
            return;
        }
        if let Err(e) = self.alarm.beep() {
            warn!("Could not play alarm sound: {}", e);
            return;
        }
        if left > 1 {
            self.scheduler.schedule_once(
                at + Duration::from_millis(BEEP_SPACING_MS),
                Job::Beep { left: left - 1 },
            );
        }
    }

    /// Arm the countdown, replacing any previous one
    fn spawn_countdown(&mut self, at: Instant) {
        self.cancel_countdown();
        self.countdown = Some(self.scheduler.schedule_repeating(at, TICK, Job::Countdown));
    }

    fn cancel_countdown(&mut self) {
        if let Some(id) = self.countdown.take() {
            self.scheduler.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmError, Silent};
    use crate::clock::ManualClock;
    use chrono::{TimeDelta, TimeZone};
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CountingAlarm {
        beeps: Rc<Cell<u32>>,
    }

    impl Alarm for CountingAlarm {
        fn beep(&mut self) -> Result<(), AlarmError> {
            self.beeps.set(self.beeps.get() + 1);
            Ok(())
        }
    }

    struct NoAudio;

    impl Alarm for NoAudio {
        fn beep(&mut self) -> Result<(), AlarmError> {
            Err(AlarmError::Unavailable(io::Error::new(
                io::ErrorKind::NotFound,
                "no audio device",
            )))
        }
    }

    fn setup<A: Alarm>(alarm: A) -> (StudyTimer<ManualClock, A>, ManualClock, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let timer = StudyTimer::new(store, clock.clone(), alarm);
        (timer, clock, dir)
    }

    fn step(timer: &mut StudyTimer<ManualClock, impl Alarm>, clock: &ManualClock, seconds: i64) {
        for _ in 0..seconds {
            clock.advance_secs(1);
            timer.run_due().unwrap();
        }
    }

    #[test]
    fn test_controls_follow_phase() {
        let idle = Controls::for_phase(Phase::Idle);
        assert!(idle.start && !idle.pause && !idle.stop && idle.duration_inputs);

        let running = Controls::for_phase(Phase::Running);
        assert!(!running.start && running.pause && running.stop && !running.duration_inputs);

        let paused = Controls::for_phase(Phase::Paused);
        assert!(paused.start && !paused.pause && paused.stop && !paused.duration_inputs);
    }

    #[test]
    fn test_only_one_countdown_after_pause_resume_cycles() {
        let (mut timer, clock, _dir) = setup(Silent);
        timer.start();
        for _ in 0..5 {
            step(&mut timer, &clock, 1);
            timer.pause();
            timer.start();
        }
        // Elapsed tick plus exactly one countdown
        assert_eq!(timer.scheduler.len(), 2);
        assert_eq!(timer.timer().remaining_seconds(), 1500 - 5);

        // A second start while running must not add another countdown
        assert_eq!(timer.start(), None);
        assert_eq!(timer.scheduler.len(), 2);
    }

    #[test]
    fn test_paused_timer_does_not_count_down() {
        let (mut timer, clock, _dir) = setup(Silent);
        timer.start();
        step(&mut timer, &clock, 3);
        timer.pause();
        step(&mut timer, &clock, 10);

        assert_eq!(timer.timer().remaining_seconds(), 1497);
        assert_eq!(timer.view().elapsed_millis, 13_000);
        assert_eq!(timer.status(), STATUS_PAUSED);
    }

    #[test]
    fn test_completion_rings_three_beeps_and_resets_status() {
        let alarm = CountingAlarm::default();
        let (mut timer, clock, _dir) = setup(alarm.clone());
        timer.set_duration(Settings::new(0, 1)).unwrap();
        timer.start();

        step(&mut timer, &clock, 59);
        assert!(timer.store().list_all().is_empty());

        clock.advance_secs(1);
        let session = timer.run_due().unwrap().expect("countdown should complete");
        assert!(session.completed);
        assert_eq!(session.duration_seconds, 60);
        assert_eq!(alarm.beeps.get(), 1);
        assert_eq!(timer.status(), STATUS_COMPLETED);
        assert_eq!(timer.view().phase, Phase::Idle);

        clock.advance(TimeDelta::milliseconds(600));
        timer.run_due().unwrap();
        clock.advance(TimeDelta::milliseconds(600));
        timer.run_due().unwrap();
        clock.advance(TimeDelta::milliseconds(600));
        timer.run_due().unwrap();
        assert_eq!(alarm.beeps.get(), 3);

        step(&mut timer, &clock, 5);
        assert_eq!(timer.status(), STATUS_READY);
    }

    #[test]
    fn test_status_reset_does_not_clobber_a_new_run() {
        let (mut timer, clock, _dir) = setup(Silent);
        timer.set_duration(Settings::new(0, 1)).unwrap();
        timer.start();
        step(&mut timer, &clock, 60);
        assert_eq!(timer.status(), STATUS_COMPLETED);

        timer.start();
        step(&mut timer, &clock, 6);
        assert_eq!(timer.status(), STATUS_RUNNING);
    }

    #[test]
    fn test_duration_locked_while_active() {
        let (mut timer, _clock, _dir) = setup(Silent);
        timer.start();
        assert!(!timer.set_duration(Settings::new(1, 0)).unwrap());
        assert!(!timer.adjust_duration(0, 5).unwrap());
        assert_eq!(timer.settings(), Settings::default());

        timer.pause();
        assert!(!timer.adjust_duration(0, 5).unwrap());

        timer.stop().unwrap();
        assert!(timer.adjust_duration(0, 5).unwrap());
        assert_eq!(timer.settings(), Settings::new(0, 30));
        assert_eq!(timer.store().load_settings(), Settings::new(0, 30));
        assert_eq!(timer.view().remaining_seconds, 1800);
    }

    #[test]
    fn test_unconfirmed_clear_keeps_data() {
        let (mut timer, clock, _dir) = setup(Silent);
        timer.start();
        clock.advance_secs(45);
        timer.stop().unwrap();

        assert!(!timer.clear(false).unwrap());
        assert_eq!(timer.store().list_all().len(), 1);
    }

    #[test]
    fn test_time_until_due() {
        let (timer, clock, _dir) = setup(Silent);
        assert_eq!(timer.time_until_due(), std::time::Duration::from_secs(1));
        clock.advance_secs(5);
        assert_eq!(timer.time_until_due(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_countdown_keeps_ticking_when_wall_clock_goes_back() {
        let (mut timer, clock, _dir) = setup(Silent);
        timer.start();
        step(&mut timer, &clock, 5);

        clock.advance_secs(-600);
        step(&mut timer, &clock, 120);
        assert_eq!(timer.view().remaining_seconds, 1500 - 125);
        assert_eq!(timer.view().phase, Phase::Running);
    }

    #[test]
    fn test_missing_audio_still_completes_and_saves() {
        let (mut timer, clock, _dir) = setup(NoAudio);
        timer.set_duration(Settings::new(0, 1)).unwrap();
        timer.start();
        step(&mut timer, &clock, 59);

        clock.advance_secs(1);
        let session = timer.run_due().unwrap().expect("countdown should complete");
        assert!(session.completed);
        assert_eq!(timer.view().phase, Phase::Idle);
        assert_eq!(timer.store().list_all(), vec![session]);
        assert_eq!(timer.status(), STATUS_COMPLETED);

        // Rest of the beep sequence is dropped: elapsed tick and status reset only
        assert_eq!(timer.scheduler.len(), 2);
    }

    #[test]
    fn test_unsaved_completion_still_rings_and_reports() {
        let alarm = CountingAlarm::default();
        let (mut timer, clock, dir) = setup(alarm.clone());
        timer.set_duration(Settings::new(0, 1)).unwrap();
        timer.start();
        step(&mut timer, &clock, 59);

        // A directory where the sessions file belongs cannot be read or replaced
        std::fs::create_dir(dir.path().join("sessions.json")).unwrap();
        clock.advance_secs(1);
        let result = timer.run_due();

        assert!(matches!(result, Err(StoreError::Read { .. })));
        assert_eq!(alarm.beeps.get(), 1);
        assert_eq!(timer.status(), STATUS_COMPLETED);
        assert_eq!(timer.view().phase, Phase::Idle);

        clock.advance(TimeDelta::milliseconds(600));
        timer.run_due().unwrap();
        assert_eq!(alarm.beeps.get(), 2);
    }

    #[test]
    fn test_failed_settings_save_keeps_previous_duration() {
        let (mut timer, _clock, dir) = setup(Silent);
        std::fs::create_dir(dir.path().join("settings.json")).unwrap();

        assert!(timer.set_duration(Settings::new(1, 0)).is_err());
        assert_eq!(timer.settings(), Settings::default());
        assert_eq!(timer.view().remaining_seconds, 1500);
    }
}
