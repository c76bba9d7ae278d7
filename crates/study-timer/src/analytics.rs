//! Study statistics
//!
//! Aggregates stored sessions into what the analytics view shows:
//! - Time studied today and over the last week (partial runs included)
//! - Number and average length of completed runs
//! - Per-day totals for the last 7 calendar days
//! - The most recent sessions
//!
//! Everything is recomputed from the full session list on each call.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::Serialize;

use crate::session::Session;

/// Days covered by the daily series, today included
pub const SERIES_DAYS: usize = 7;

/// Sessions kept in the recent list
pub const RECENT_LIMIT: usize = 10;

/// Study time on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    /// Short weekday name ("Mon")
    pub label: String,
    pub seconds: u64,
}

/// Totals for the last `SERIES_DAYS` days, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    pub days: Vec<DayTotal>,
}

impl DailySeries {
    /// Largest daily total, never below 1 so it can be divided by
    pub fn scale_max(&self) -> u64 {
        self.days.iter().map(|d| d.seconds).max().unwrap_or(0).max(1)
    }

    /// Each day's share of the largest day, 0.0 to 1.0
    pub fn fractions(&self) -> Vec<f64> {
        let max = self.scale_max() as f64;
        self.days.iter().map(|d| d.seconds as f64 / max).collect()
    }
}

/// Aggregated study statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    /// Seconds studied since local midnight
    pub today_total: u64,
    /// Seconds studied since local midnight seven days ago
    pub week_total: u64,
    /// Number of runs whose countdown finished
    pub total_sessions_count: usize,
    /// Mean length of finished runs in seconds, 0 when there are none
    pub average_duration: f64,
    pub daily_series: DailySeries,
    /// Newest first
    pub recent_sessions: Vec<Session>,
}

impl Analytics {
    /// Aggregate `sessions` as seen at `now`. Day boundaries are midnights in
    /// the time zone of `now`.
    pub fn from_sessions<Tz: TimeZone>(sessions: &[Session], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let today_start = start_of_day(today, &tz);
        let week_start = today_start - TimeDelta::days(7);

        let today_total = sum_since(sessions, today_start);
        let week_total = sum_since(sessions, week_start);

        let completed: Vec<&Session> = sessions.iter().filter(|s| s.completed).collect();
        let average_duration = if completed.is_empty() {
            0.0
        } else {
            completed.iter().map(|s| s.duration_seconds).sum::<u64>() as f64 / completed.len() as f64
        };

        let days = (0..SERIES_DAYS as i64)
            .rev()
            .map(|back| {
                let date = today - TimeDelta::days(back);
                let start = start_of_day(date, &tz);
                let end = start_of_day(date + TimeDelta::days(1), &tz);
                let seconds = sessions
                    .iter()
                    .filter(|s| s.timestamp >= start && s.timestamp < end)
                    .map(|s| s.duration_seconds)
                    .sum();
                DayTotal {
                    date,
                    label: date.format("%a").to_string(),
                    seconds,
                }
            })
            .collect();

        let recent_sessions = sessions.iter().rev().take(RECENT_LIMIT).cloned().collect();

        Self {
            today_total,
            week_total,
            total_sessions_count: completed.len(),
            average_duration,
            daily_series: DailySeries { days },
            recent_sessions,
        }
    }
}

fn sum_since(sessions: &[Session], since: DateTime<Utc>) -> u64 {
    sessions
        .iter()
        .filter(|s| s.timestamp >= since)
        .map(|s| s.duration_seconds)
        .sum()
}

/// First instant of `date` in `tz`, as UTC
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());
    tz.from_local_datetime(&midnight)
        .earliest()
        // Midnight skipped by a DST jump: the day starts an hour later
        .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    fn session(ts: DateTime<Utc>, duration: u64, completed: bool) -> Session {
        Session::new(ts, duration, completed)
    }

    #[test]
    fn test_empty_analytics() {
        let stats = Analytics::from_sessions(&[], &at(15, 12, 0));
        assert_eq!(stats.today_total, 0);
        assert_eq!(stats.week_total, 0);
        assert_eq!(stats.total_sessions_count, 0);
        assert_eq!(stats.average_duration, 0.0);
        assert_eq!(stats.daily_series.days.len(), SERIES_DAYS);
        assert!(stats.daily_series.days.iter().all(|d| d.seconds == 0));
        assert!(stats.recent_sessions.is_empty());
        assert_eq!(stats.daily_series.scale_max(), 1);
        assert!(stats.daily_series.fractions().iter().all(|f| *f == 0.0));
    }

    #[test]
    fn test_today_mixes_complete_and_partial() {
        let sessions = vec![
            session(at(15, 10, 0), 1500, true),
            session(at(15, 11, 0), 40, false),
        ];
        let stats = Analytics::from_sessions(&sessions, &at(15, 12, 0));

        assert_eq!(stats.today_total, 1540);
        assert_eq!(stats.week_total, 1540);
        assert_eq!(stats.total_sessions_count, 1);
        assert_eq!(stats.average_duration, 1500.0);
    }

    #[test]
    fn test_boundaries() {
        let sessions = vec![
            // Just before the week boundary (midnight on the 8th)
            session(at(7, 23, 59), 100, true),
            // Exactly on the week boundary
            session(at(8, 0, 0), 200, true),
            // Yesterday
            session(at(14, 23, 59), 300, false),
            // Exactly at today's midnight
            session(at(15, 0, 0), 400, true),
        ];
        let stats = Analytics::from_sessions(&sessions, &at(15, 9, 0));

        assert_eq!(stats.today_total, 400);
        assert_eq!(stats.week_total, 900);
        assert_eq!(stats.total_sessions_count, 3);
        assert!((stats.average_duration - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_future_sessions_count_towards_today() {
        let sessions = vec![session(at(16, 8, 0), 60, true)];
        let stats = Analytics::from_sessions(&sessions, &at(15, 9, 0));
        assert_eq!(stats.today_total, 60);
        // Outside the 7-day window of the series
        assert_eq!(stats.daily_series.days.iter().map(|d| d.seconds).sum::<u64>(), 0);
    }

    #[test]
    fn test_daily_series_buckets() {
        let sessions = vec![
            session(at(8, 12, 0), 999, true), // 7 days back, outside the series
            session(at(9, 8, 0), 600, true),
            session(at(9, 20, 0), 60, false),
            session(at(12, 0, 0), 1500, true),
            session(at(15, 7, 0), 300, false),
        ];
        let stats = Analytics::from_sessions(&sessions, &at(15, 9, 0));
        let days = &stats.daily_series.days;

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
        assert_eq!(days[6].label, "Wed");
        assert_eq!(
            days.iter().map(|d| d.seconds).collect::<Vec<_>>(),
            vec![660, 0, 0, 1500, 0, 0, 300]
        );

        assert_eq!(stats.daily_series.scale_max(), 1500);
        let fractions = stats.daily_series.fractions();
        assert_eq!(fractions[3], 1.0);
        assert_eq!(fractions[1], 0.0);
        assert!((fractions[6] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_local_day_boundaries_follow_time_zone() {
        // 23:30 UTC on the 14th is 01:30 on the 15th at UTC+2
        let sessions = vec![session(at(14, 23, 30), 120, true)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(15, 10, 0).with_timezone(&plus_two);

        let stats = Analytics::from_sessions(&sessions, &now);
        assert_eq!(stats.today_total, 120);
        assert_eq!(stats.daily_series.days[6].seconds, 120);

        let stats = Analytics::from_sessions(&sessions, &at(15, 10, 0));
        assert_eq!(stats.today_total, 0);
        assert_eq!(stats.daily_series.days[5].seconds, 120);
    }

    #[test]
    fn test_totals_grow_with_in_range_sessions() {
        let now = at(15, 12, 0);
        let mut sessions = Vec::new();
        let mut last = Analytics::from_sessions(&sessions, &now);

        for (ts, duration) in [(at(15, 9, 0), 300), (at(2, 9, 0), 900), (at(13, 9, 0), 50)] {
            sessions.push(session(ts, duration, false));
            let next = Analytics::from_sessions(&sessions, &now);
            assert!(next.today_total >= last.today_total);
            assert!(next.week_total >= last.week_total);
            last = next;
        }

        assert_eq!(last.today_total, 300);
        assert_eq!(last.week_total, 350);
    }

    #[test]
    fn test_recent_sessions_newest_first() {
        let sessions: Vec<Session> = (0..12)
            .map(|i| session(at(15, 8, i), 60 + u64::from(i), false))
            .collect();
        let stats = Analytics::from_sessions(&sessions, &at(15, 12, 0));

        assert_eq!(stats.recent_sessions.len(), RECENT_LIMIT);
        assert_eq!(stats.recent_sessions[0].duration_seconds, 71);
        assert_eq!(stats.recent_sessions[9].duration_seconds, 62);
    }
}
