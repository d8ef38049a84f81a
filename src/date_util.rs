use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap() - Duration::days(1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap() - Duration::days(1)
    }
}

/// Parse a task-report timestamp leniently.
///
/// Exports from different tracking-service versions disagree on the format,
/// so accept RFC 3339 (`2024-01-15T09:30:00Z`), a space-separated datetime
/// (`2024-01-15 09:30:00`), or a bare date (`2024-01-15`, taken as midnight
/// UTC). Returns `None` for anything else.
pub fn parse_report_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    None
}

/// Day key (`YYYY-MM-DD`) for a timestamp. Time-of-day is discarded.
pub fn date_key(dt: &DateTime<Utc>) -> String {
    dt.date_naive().format("%Y-%m-%d").to_string()
}

/// Short display label for a day, e.g. `Jan 5`.
pub fn short_label(d: NaiveDate) -> String {
    d.format("%b %-d").to_string()
}
