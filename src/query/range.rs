use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::date_util::last_day_of_month;
use crate::error::{Error, Result};

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
static RE_BETWEEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\.\.(\d{4}-\d{2}-\d{2})$").unwrap());

/// A calendar range for fetching task collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRange {
    /// No bounds; every imported record.
    All,
    Year(i32),
    Month(i32, u8),
    Day(NaiveDate),
    /// Rolling window: last N days ending at `as_of` (inclusive).
    LastDays(u32, NaiveDate),
    /// Explicit inclusive bounds.
    Between(NaiveDate, NaiveDate),
}

impl DateRange {
    /// Parse a range expression.
    ///
    /// Supported formats:
    /// - `all` — everything
    /// - `2025` — year
    /// - `2025-01` — month
    /// - `2025-01-15` — single day
    /// - `30d` — rolling last N days ending today
    /// - `2025-01-01..2025-01-31` — explicit inclusive bounds
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("all") {
            return Ok(DateRange::All);
        }

        // Rolling: "30d", "7d", etc.
        if let Some(rest) = s.strip_suffix('d').or_else(|| s.strip_suffix('D')) {
            if let Ok(n) = rest.parse::<u32>() {
                if n == 0 {
                    return Err(Error::RangeParse(format!("window must be at least 1 day: {s}")));
                }
                let today = chrono::Local::now().date_naive();
                return Ok(DateRange::LastDays(n, today));
            }
        }

        if let Some(caps) = RE_BETWEEN.captures(s) {
            let start = parse_day(&caps[1])?;
            let end = parse_day(&caps[2])?;
            if start > end {
                return Err(Error::RangeParse(format!("start is after end: {s}")));
            }
            return Ok(DateRange::Between(start, end));
        }

        if let Some(caps) = RE_DAY.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u32 = caps[2].parse().unwrap();
            let day: u32 = caps[3].parse().unwrap();
            return NaiveDate::from_ymd_opt(year, month, day)
                .map(DateRange::Day)
                .ok_or_else(|| Error::RangeParse(format!("no such day: {s}")));
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u8 = caps[2].parse().unwrap();
            if (1..=12).contains(&month) {
                return Ok(DateRange::Month(year, month));
            }
            return Err(Error::RangeParse(format!("no such month: {s}")));
        }

        if RE_YEAR.is_match(s) {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(DateRange::Year(year));
            }
        }

        Err(Error::RangeParse(format!("unrecognized range: {s}")))
    }

    /// Inclusive (start, end) day bounds, or `None` for [`DateRange::All`].
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            DateRange::All => None,
            DateRange::Year(y) => Some((
                NaiveDate::from_ymd_opt(*y, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(*y, 12, 31).unwrap(),
            )),
            DateRange::Month(y, m) => Some((
                NaiveDate::from_ymd_opt(*y, *m as u32, 1).unwrap(),
                last_day_of_month(*y, *m as u32),
            )),
            DateRange::Day(d) => Some((*d, *d)),
            DateRange::LastDays(n, as_of) => {
                Some((*as_of - Duration::days(*n as i64 - 1), *as_of))
            }
            DateRange::Between(start, end) => Some((*start, *end)),
        }
    }

    /// Canonical form of the expression.
    pub fn to_key(&self) -> String {
        match self {
            DateRange::All => "all".to_string(),
            DateRange::Year(y) => format!("{y}"),
            DateRange::Month(y, m) => format!("{y}-{m:02}"),
            DateRange::Day(d) => d.format("%Y-%m-%d").to_string(),
            DateRange::LastDays(n, _) => format!("{n}d"),
            DateRange::Between(s, e) => {
                format!("{}..{}", s.format("%Y-%m-%d"), e.format("%Y-%m-%d"))
            }
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::RangeParse(format!("no such day: {s}")))
}
