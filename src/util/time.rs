use chrono::{DateTime, Utc};

/// Compact age of a commit for narrow columns: "now", "5m", "3h", "2d",
/// "4w", then the calendar date once it is older than a month.
pub fn format_age(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(dt).num_seconds();

    if secs >= 30 * 24 * 60 * 60 {
        return dt.format("%Y-%m-%d").to_string();
    }

    let units = [
        (7 * 24 * 60 * 60, "w"),
        (24 * 60 * 60, "d"),
        (60 * 60, "h"),
        (60, "m"),
    ];

    units
        .into_iter()
        .find(|(unit_secs, _)| secs >= *unit_secs)
        .map(|(unit_secs, suffix)| format!("{}{}", secs / unit_secs, suffix))
        .unwrap_or_else(|| "now".to_string())
}
