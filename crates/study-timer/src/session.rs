//! Study session records and duration settings
//!
//! A `Session` is written once per timer run that earned credit and is never
//! touched again. `Settings` is the duration the next run counts down from.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Default target when nothing usable is configured
pub const DEFAULT_MINUTES: u32 = 25;

/// A finished or partially finished study run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// When the run ended
    #[serde(rename = "date", with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Seconds credited to this run
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    /// Whether the countdown reached zero on its own
    pub completed: bool,
}

impl Session {
    /// Create a session record. The timestamp keeps millisecond precision,
    /// the same precision it is stored with.
    pub fn new(timestamp: DateTime<Utc>, duration_seconds: u64, completed: bool) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            duration_seconds,
            completed,
        }
    }
}

/// Configured countdown length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub hours: u32,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
}

fn default_minutes() -> u32 {
    DEFAULT_MINUTES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hours: 0,
            minutes: DEFAULT_MINUTES,
        }
    }
}

impl Settings {
    /// Build settings, bumping a zero-length target up to one minute
    pub fn new(hours: u32, minutes: u32) -> Self {
        let minutes = if hours == 0 && minutes == 0 { 1 } else { minutes };
        Self { hours, minutes }
    }

    /// Parse raw duration input.
    ///
    /// Anything that is not a non-negative integer counts as zero, and the
    /// result is never shorter than one minute.
    pub fn parse(hours: &str, minutes: &str) -> Self {
        Self::new(parse_field(hours), parse_field(minutes))
    }

    /// Total countdown length in seconds
    pub fn total_seconds(&self) -> u64 {
        (u64::from(self.hours) * 60 + u64::from(self.minutes)) * 60
    }

    /// Shift hours and minutes by the given deltas, clamping at zero
    pub fn adjusted(&self, hours: i64, minutes: i64) -> Self {
        let shift = |value: u32, delta: i64| -> u32 {
            (i64::from(value) + delta).clamp(0, i64::from(u32::MAX)) as u32
        };
        Self::new(shift(self.hours, hours), shift(self.minutes, minutes))
    }
}

fn parse_field(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ` timestamps
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
