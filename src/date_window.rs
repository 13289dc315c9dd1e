//! Publication-date gate.
//!
//! Feed dates come in whatever shape the publisher chose, so parsing tries a
//! list of known layouts before giving up. The calendar day compared against
//! the window is the day as written, in the string's own offset.

use crate::config::DateWindow;
use crate::models::FeedEntry;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
];

const NAIVE_DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y%m%d",
];

static LEADING_WEEKDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{3,9},?\s+").expect("static regex"));
static TRAILING_ZONE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\(?[A-Z]{1,5}\)?$").expect("static regex"));

fn parse_exact(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date_naive());
    }
    if let Some(dt) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

/// Parse a feed date string into its calendar day.
///
/// Accepts RFC 2822, RFC 3339 and a range of ISO-8601 and day-first layouts.
/// Leading weekday names and trailing zone abbreviations that chrono does
/// not know (e.g. `CEST`) are dropped on a second attempt; the day is then
/// taken as written. Ambiguous numeric dates are read day-first.
pub fn parse_published(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(day) = parse_exact(s) {
        return Some(day);
    }
    let without_weekday = LEADING_WEEKDAY.replace(s, "");
    let cleaned = TRAILING_ZONE_NAME.replace(without_weekday.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned == s {
        return None;
    }
    parse_exact(cleaned)
}

/// Outcome of checking one entry against the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCheck {
    Inside(NaiveDate),
    Outside(NaiveDate),
    MissingDate,
    Unparseable(String),
}

impl WindowCheck {
    pub fn is_inside(&self) -> bool {
        matches!(self, WindowCheck::Inside(_))
    }
}

/// Decides whether an entry's publication day falls inside the window.
#[derive(Debug, Clone)]
pub struct DateWindowFilter {
    window: DateWindow,
}

impl DateWindowFilter {
    pub fn new(window: DateWindow) -> Self {
        if window.start != window.end {
            warn!(
                start = %window.start,
                end = %window.end,
                "Multi-day window: only entries dated on the start day are accepted"
            );
        }
        Self { window }
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// A day is accepted when it equals the window start and lies within
    /// `[start, end]`.
    pub fn contains(&self, day: NaiveDate) -> bool {
        day == self.window.start && self.window.start <= day && day <= self.window.end
    }

    pub fn check(&self, entry: &FeedEntry) -> WindowCheck {
        let Some((field, raw)) = entry.published_raw() else {
            debug!(title = ?entry.title, "Entry has no date field");
            return WindowCheck::MissingDate;
        };
        match parse_published(raw) {
            Some(day) if self.contains(day) => WindowCheck::Inside(day),
            Some(day) => {
                debug!(%day, field, "Entry outside date window");
                WindowCheck::Outside(day)
            }
            None => {
                debug!(raw, field, "Unparseable entry date");
                WindowCheck::Unparseable(raw.to_string())
            }
        }
    }

    pub fn accepts(&self, entry: &FeedEntry) -> bool {
        self.check(entry).is_inside()
    }
}
