//! Trading calendars

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::ops::Range;

/// Name of the Poloniex calendar
pub const POLONIEX_CALENDAR: &str = "POLONIEX";

/// Daily trading sessions, with open and close times in UTC
///
/// `close_time` is the start of the last minute of a session, so a session
/// covers `[open, close + 1 minute)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    pub name: String,
    pub timezone: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
}

impl TradingCalendar {
    /// Poloniex trades around the clock, every day
    pub fn poloniex() -> Self {
        Self {
            name: POLONIEX_CALENDAR.to_string(),
            timezone: "UTC".to_string(),
            open_time: NaiveTime::default(),
            close_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
        }
    }

    /// Sessions in `[first, last]`, one per calendar day
    pub fn sessions(&self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        first.iter_days().take_while(|d| *d <= last).collect()
    }

    /// Instant the session on `day` opens
    pub fn session_open(&self, day: NaiveDate) -> DateTime<Utc> {
        day.and_time(self.open_time).and_utc()
    }

    /// Instant the session on `day` ends, exclusive
    pub fn session_end(&self, day: NaiveDate) -> DateTime<Utc> {
        day.and_time(self.close_time).and_utc() + Duration::minutes(1)
    }

    /// Time covered by the sessions from `first` through `last`
    pub fn session_range(&self, first: NaiveDate, last: NaiveDate) -> Range<DateTime<Utc>> {
        self.session_open(first)..self.session_end(last)
    }
}
