//! Application state and key handling

use crossterm::event::KeyCode;
use std::time::Duration;
use study_timer::{Alarm, Analytics, Clock, Stop, StudyTimer};
use tracing::error;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Timer,
    Analytics,
}

impl Tab {
    pub fn next(self) -> Self {
        match self {
            Self::Timer => Self::Analytics,
            Self::Analytics => Self::Timer,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Timer => 0,
            Self::Analytics => 1,
        }
    }
}

/// Application state
pub struct App<C: Clock, A: Alarm> {
    pub timer: StudyTimer<C, A>,
    pub tab: Tab,
    pub show_help: bool,
    pub confirm_clear: bool,
    pub analytics: Analytics,
    /// Overrides the timer status until the next key press
    pub message: Option<String>,
}

impl<C: Clock, A: Alarm> App<C, A> {
    pub fn new(timer: StudyTimer<C, A>) -> Self {
        let analytics = timer.analytics();
        Self {
            timer,
            tab: Tab::default(),
            show_help: false,
            confirm_clear: false,
            analytics,
            message: None,
        }
    }

    pub fn time_until_due(&self) -> Duration {
        self.timer.time_until_due()
    }

    /// Line shown under the clock
    pub fn status_line(&self) -> &str {
        self.message.as_deref().unwrap_or_else(|| self.timer.status())
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.message = None;

        if self.confirm_clear {
            self.confirm_clear = false;
            let confirmed = matches!(key, KeyCode::Char('y') | KeyCode::Char('Y'));
            match self.timer.clear(confirmed) {
                Ok(true) => self.refresh_analytics(),
                Ok(false) => self.message = Some("Clear cancelled".to_string()),
                Err(e) => self.fail("Could not clear data", &e),
            }
            return false;
        }

        if self.show_help {
            match key {
                KeyCode::Char('q') => return true,
                _ => self.show_help = false,
            }
            return false;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('s') | KeyCode::Char(' ') => {
                self.timer.start();
            }
            KeyCode::Char('p') => {
                self.timer.pause();
            }
            KeyCode::Char('x') => self.stop(),
            KeyCode::Char('h') => self.adjust(1, 0),
            KeyCode::Char('H') => self.adjust(-1, 0),
            KeyCode::Char('m') => self.adjust(0, 1),
            KeyCode::Char('M') => self.adjust(0, -1),
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::Char('1') => self.switch_tab(Tab::Timer),
            KeyCode::Char('2') => self.switch_tab(Tab::Analytics),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('c') => self.confirm_clear = true,
            _ => {}
        }
        false
    }

    /// Run whatever the scheduler has due
    pub fn on_tick(&mut self) {
        match self.timer.run_due() {
            Ok(Some(_)) => {
                // Completion wins over whatever was shown last
                self.message = None;
                self.refresh_analytics();
            }
            Ok(None) => {}
            Err(e) => {
                self.refresh_analytics();
                self.fail("Session completed but could not be saved", &e);
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Analytics {
            self.refresh_analytics();
        }
    }

    pub fn shutdown(self) {
        self.timer.shutdown();
    }

    fn refresh_analytics(&mut self) {
        self.analytics = self.timer.analytics();
    }

    fn stop(&mut self) {
        match self.timer.stop() {
            Ok(Some(Stop::Saved(_))) => self.refresh_analytics(),
            Ok(Some(Stop::Discarded { .. })) => {
                self.message = Some("Timer stopped (under 30s, not recorded)".to_string());
            }
            Ok(None) => {}
            Err(e) => self.fail("Could not save session", &e),
        }
    }

    fn adjust(&mut self, hours: i64, minutes: i64) {
        if let Err(e) = self.timer.adjust_duration(hours, minutes) {
            self.fail("Could not save settings", &e);
        }
    }

    fn export(&mut self) {
        let result = std::env::current_dir()
            .map_err(anyhow::Error::from)
            .and_then(|dir| self.timer.export_to(&dir).map_err(anyhow::Error::from));
        match result {
            Ok(path) => self.message = Some(format!("Exported to {}", path.display())),
            Err(e) => self.fail("Export failed", &e),
        }
    }

    fn fail(&mut self, what: &str, e: &dyn std::fmt::Display) {
        error!("{}: {}", what, e);
        self.message = Some(format!("{}: {}", what, e));
    }
}
