use chrono::{Local, TimeZone};

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human readable size with one decimal, base 1024, capped at GB.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Local wall-clock time for a unix timestamp, `-` when unknown.
pub fn format_mtime(mtime: Option<i64>) -> String {
    match mtime.filter(|secs| *secs > 0) {
        Some(secs) => match Local.timestamp_opt(secs, 0).single() {
            Some(when) => when.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "-".to_string(),
        },
        None => "-".to_string(),
    }
}
