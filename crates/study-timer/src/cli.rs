//! One-shot commands

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use study_core::format;
use study_timer::{Analytics, Session, SessionStore, Settings, Silent, StudyTimer, SystemClock};

// ANSI color codes
const GREEN: &str = "\x1b[0;32m";
const CYAN: &str = "\x1b[0;36m";
const YELLOW: &str = "\x1b[0;33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";

/// Width of the 7-day chart bars
const BAR_WIDTH: usize = 30;

type OneShot = StudyTimer<SystemClock, Silent>;

fn open(store: SessionStore) -> OneShot {
    StudyTimer::new(store, SystemClock, Silent)
}

/// Check if stdout is a TTY and colors should be used
fn use_colors() -> bool {
    std::io::stdout().is_terminal()
}

fn paint(enabled: bool, code: &str, text: &str) -> String {
    if enabled {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

/// Conditionally apply color
fn color(code: &str, text: &str) -> String {
    paint(use_colors(), code, text)
}

/// Horizontal bar for a 0.0-1.0 fraction. Never empty, so zero days still
/// show a sliver.
fn draw_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction * width as f64).round() as usize).clamp(1, width);
    let empty = width - filled;
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(empty))
}

fn session_line(session: &Session) -> String {
    let when = session.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let marker = if session.completed { " \u{2713}" } else { " (partial)" };
    format!(
        "{}  {}{}",
        when,
        format::duration(session.duration_seconds as f64),
        marker
    )
}

/// Show study statistics
pub fn cmd_stats(store: SessionStore, json: bool) -> Result<()> {
    let timer = open(store);
    let stats = timer.analytics();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", render_stats(&stats, use_colors()));
    Ok(())
}

fn render_stats(stats: &Analytics, colors: bool) -> String {
    let c = |code: &str, text: &str| paint(colors, code, text);
    let mut lines = vec![
        c(BOLD, "Study Statistics"),
        String::new(),
        format!("  {}       {}", c(CYAN, "Today:"), format::total(stats.today_total)),
        format!("  {}   {}", c(CYAN, "This week:"), format::total(stats.week_total)),
        format!("  {}    {}", c(CYAN, "Completed:"), stats.total_sessions_count),
        format!(
            "  {} {}",
            c(CYAN, "Avg. session:"),
            format::duration(stats.average_duration)
        ),
        String::new(),
        c(BOLD, "Last 7 Days"),
        String::new(),
    ];

    let fractions = stats.daily_series.fractions();
    for (day, fraction) in stats.daily_series.days.iter().zip(fractions) {
        lines.push(format!(
            "  {}  {}  {}",
            day.label,
            c(GREEN, &draw_bar(fraction, BAR_WIDTH)),
            format::duration(day.seconds as f64)
        ));
    }

    lines.push(String::new());
    lines.push(c(BOLD, "Recent Sessions"));
    lines.push(String::new());
    if stats.recent_sessions.is_empty() {
        lines.push(format!(
            "  {}",
            c(DIM, "No study sessions yet. Start your first timer!")
        ));
    }
    for session in &stats.recent_sessions {
        lines.push(format!("  {}", session_line(session)));
    }

    lines.join("\n")
}

/// Export sessions and settings to a JSON file
pub fn cmd_export(store: SessionStore, output: Option<PathBuf>) -> Result<()> {
    let timer = open(store);
    let dir = match output {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    let path = timer.export_to(&dir)?;
    println!("{} Exported to {}", color(GREEN, "[ok]"), path.display());
    Ok(())
}

/// Restore data from an export file
pub fn cmd_import(store: SessionStore, file: &Path) -> Result<()> {
    let mut timer = open(store);
    let count = timer.import_from(file)?;
    let settings = timer.settings();

    println!("{} Imported {} sessions", color(GREEN, "[ok]"), count);
    println!("Duration set to {}h {}m", settings.hours, settings.minutes);
    Ok(())
}

/// Delete all sessions and settings
pub fn cmd_clear(store: SessionStore, yes: bool) -> Result<()> {
    let mut timer = open(store);

    let confirmed = if yes {
        true
    } else {
        // In non-interactive mode, require --yes
        if !std::io::stdin().is_terminal() {
            bail!("Use --yes to clear without confirmation");
        }

        print!("Are you sure you want to clear all study data? This cannot be undone. [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let answer = input.trim();
        answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    };

    if !timer.clear(confirmed)? {
        println!("Aborted.");
        return Ok(());
    }

    println!("{} All data has been cleared.", color(GREEN, "[ok]"));
    Ok(())
}

/// Show or set the default duration
pub fn cmd_config(store: SessionStore, hours: Option<String>, minutes: Option<String>) -> Result<()> {
    let mut timer = open(store);
    let current = timer.settings();

    if hours.is_some() || minutes.is_some() {
        let hours = hours.unwrap_or_else(|| current.hours.to_string());
        let minutes = minutes.unwrap_or_else(|| current.minutes.to_string());
        let requested = Settings::parse(&hours, &minutes);
        timer.set_duration(requested)?;
        println!("{} Duration updated", color(GREEN, "[ok]"));
    }

    let settings = timer.settings();
    println!(
        "  {} {}h {}m ({})",
        color(CYAN, "Duration:"),
        settings.hours,
        settings.minutes,
        color(YELLOW, &format::clock(settings.total_seconds()))
    );
    println!("  {}     {}", color(CYAN, "Data:"), timer.store().data_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_bar_has_a_floor() {
        assert_eq!(draw_bar(0.0, 10), format!("\u{2588}{}", "\u{2591}".repeat(9)));
        assert_eq!(draw_bar(1.0, 10), "\u{2588}".repeat(10));
        assert_eq!(draw_bar(0.5, 10).chars().count(), 10);
    }

    #[test]
    fn test_plain_stats_have_no_escape_codes() {
        let stats = Analytics::from_sessions(&[], &chrono::Utc::now());

        let plain = render_stats(&stats, false);
        assert!(!plain.contains('\x1b'));
        assert!(plain.starts_with("Study Statistics\n"));
        assert!(plain.contains("\nLast 7 Days\n"));
        assert!(plain.contains("\nRecent Sessions\n"));

        let colored = render_stats(&stats, true);
        assert!(colored.starts_with(&format!("{}Study Statistics{}", BOLD, NC)));
    }

    #[test]
    fn test_color_without_tty() {
        // Just verify the color function keeps the text
        let result = color(GREEN, "test");
        assert!(result.contains("test"));
    }
}
