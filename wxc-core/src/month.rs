use chrono::{Datelike, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::mem::replace;
use std::str::FromStr;
use wxc_utils::dates::{days_in_month, month_bounds};

/// A calendar month, displayed and parsed as `"YYYY-MM"`.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

/// Errors from parsing a `"YYYY-MM"` month string.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseMonthError {
    BadFormat(String),
    MonthOutOfRange(u32),
}

impl fmt::Display for ParseMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMonthError::BadFormat(s) => write!(f, "expected YYYY-MM, got {s:?}"),
            ParseMonthError::MonthOutOfRange(m) => write!(f, "month {m} is not in 1..=12"),
        }
    }
}

impl std::error::Error for ParseMonthError {}

impl YearMonth {
    /// Build a month, `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<YearMonth> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: &NaiveDate) -> YearMonth {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month.
    pub fn succ(&self) -> YearMonth {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    pub fn pred(&self) -> YearMonth {
        if self.month == 1 {
            YearMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Step back `n` months.
    pub fn minus_months(&self, n: u32) -> YearMonth {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        YearMonth {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// First day of the month, `None` when the year is outside chrono's range
    /// or the month was built out of range.
    pub fn first_day(&self) -> Option<NaiveDate> {
        month_bounds(self.year, self.month).ok().map(|(first, _)| first)
    }

    /// Last day of the month; `None` in the same cases as [`YearMonth::first_day`].
    pub fn last_day(&self) -> Option<NaiveDate> {
        month_bounds(self.year, self.month).ok().map(|(_, last)| last)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// True when `date` falls inside this month.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| ParseMonthError::BadFormat(s.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(ParseMonthError::BadFormat(s.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| ParseMonthError::BadFormat(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| ParseMonthError::BadFormat(s.to_string()))?;
        YearMonth::new(year, month).ok_or(ParseMonthError::MonthOutOfRange(month))
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        YearMonth::of(&date)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A month range iterator that yields each month from the start month
/// through the end month (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct MonthRange(pub YearMonth, pub YearMonth);

impl Iterator for MonthRange {
    type Item = YearMonth;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0.succ();
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
