//! Formatting utilities

/// Countdown display, `M:SS`. Minutes are not folded into hours.
pub fn clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed wall-clock time of the current run, `M:SS` of whole seconds
pub fn elapsed(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    format!("{}:{:02}", minutes, seconds)
}

/// Accumulated study time, `Xh Ym` or `Ym`
pub fn total(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Format a duration in human-readable form
///
/// Takes fractional seconds because averages are not whole numbers.
pub fn duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{}s", seconds.round() as u64);
    }

    let minutes = (seconds / 60.0).floor() as u64;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    format!("{}h {}m", minutes / 60, minutes % 60)
}
