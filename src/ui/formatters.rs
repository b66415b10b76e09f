use chrono::{DateTime, Duration, Local};

/// Format a timestamp in human-readable format (YYYY-MM-DD HH:MM:SS)
pub fn format_time(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format an optional timestamp, `never` when absent
pub fn format_optional_time(time: Option<&DateTime<Local>>) -> String {
    time.map(format_time).unwrap_or_else(|| "never".to_string())
}

/// Format a time-of-day only (HH:MM:SS), for log lines
pub fn format_clock(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// Format an elapsed duration compactly ("42s", "3m 05s", "2h 10m", "4d 1h")
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Age of `time` relative to `now`, e.g. "3m 05s ago", or `never`
pub fn format_since(time: Option<&DateTime<Local>>, now: DateTime<Local>) -> String {
    match time {
        Some(t) => format!("{} ago", format_age(now.signed_duration_since(*t))),
        None => "never".to_string(),
    }
}

/// Render a fill level as a fixed-width text bar: `[######----] 60%`
pub fn capacity_bar(capacity: u8, width: usize) -> String {
    let filled = (capacity.min(100) as usize * width + 50) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        capacity
    )
}
