//! Shared utility functions for WXC crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Timelike};

    /// Date format used for daily records: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Local timestamp format used by the Open-Meteo archive: "YYYY-MM-DDTHH:MM"
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)?)
    }

    /// Format a local timestamp as "YYYY-MM-DDTHH:MM"
    pub fn format_timestamp(ts: &NaiveDateTime) -> String {
        ts.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a local timestamp. Accepts "YYYY-MM-DDTHH:MM" and the
    /// seconds-bearing "YYYY-MM-DDTHH:MM:SS" variant.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
            Ok(ts) => Ok(ts),
            Err(_) => Ok(NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")?),
        }
    }

    /// Minutes elapsed since local midnight, 0..=1439.
    pub fn minutes_since_midnight(ts: &NaiveDateTime) -> u32 {
        ts.hour() * 60 + ts.minute()
    }

    /// First and last day of a calendar month.
    pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DateError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DateError(format!("invalid month {year}-{month:02}")))?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| DateError(format!("month out of range {year}-{month:02}")))?;
        Ok((first, last))
    }

    /// Number of days in a calendar month, 0 if the month is invalid.
    pub fn days_in_month(year: i32, month: u32) -> u32 {
        match month_bounds(year, month) {
            Ok((_, last)) => last.day(),
            Err(_) => 0,
        }
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
