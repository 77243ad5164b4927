//! Reporting periods
//!
//! Months and weeks are derived from row dates and used both as grouping keys
//! and as selector values. The types order chronologically; their display
//! strings (`2024-03`, `2024-03-04/2024-03-10`) are only a presentation and
//! parse back into the same key.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a period from its display string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodParseError {
    #[error("Invalid month '{0}', expected YYYY-MM")]
    Month(String),

    #[error("Invalid week '{0}', expected YYYY-MM-DD/YYYY-MM-DD")]
    Week(String),
}

// ============================================================================
// Month
// ============================================================================

/// Calendar month
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        // Round-trip through a real date so the year stays inside chrono's range
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_date)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PeriodParseError::Month(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        let month = month.parse::<u32>().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Week
// ============================================================================

/// Monday-to-Sunday week, keyed by its Monday
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week {
    start: NaiveDate,
}

impl Week {
    /// Week containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        Self {
            start: date.checked_sub_days(Days::new(offset)).unwrap_or(date),
        }
    }

    /// Monday of the week
    pub fn start(self) -> NaiveDate {
        self.start
    }

    /// Sunday of the week
    pub fn end(self) -> NaiveDate {
        self.start.checked_add_days(Days::new(6)).unwrap_or(self.start)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Self::from_date(date) == self
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%d"),
            self.end().format("%Y-%m-%d")
        )
    }
}

impl FromStr for Week {
    type Err = PeriodParseError;

    /// Accepts the display form, or a single date anywhere inside the week
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PeriodParseError::Week(s.to_string());
        let parse_date =
            |part: &str| NaiveDate::parse_from_str(part.trim(), "%Y-%m-%d").map_err(|_| err());

        match s.split_once('/') {
            Some((start, end)) => {
                let start = parse_date(start)?;
                let end = parse_date(end)?;
                let week = Self::from_date(start);
                if week.start != start || week.end() != end {
                    return Err(err());
                }
                Ok(week)
            }
            None => parse_date(s).map(Self::from_date),
        }
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Week {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
