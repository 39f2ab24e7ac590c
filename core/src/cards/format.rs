use chrono::{DateTime, Utc};

/// Relative age of a report, coarsened to minutes, hours or days.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Fixed-point value followed by its unit suffix.
pub fn format_value(value: f64, decimals: usize, unit: &str) -> String {
    format!("{value:.decimals$}{unit}")
}
