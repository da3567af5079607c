//! Calendar day keys.
//!
//! Every entry and streak is keyed by a calendar day rather than a full
//! timestamp. `DayKey` wraps a `chrono::NaiveDate` and always renders as
//! `YYYY-MM-DD`. Because the format is fixed-width, the lexicographic
//! ordering of the rendered strings equals the chronological ordering --
//! the SQLite layer stores day keys as TEXT and relies on this for range
//! queries and ORDER BY.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;
use crate::habit::Weekday;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A calendar day, compared and persisted as a `YYYY-MM-DD` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Wrap an existing `NaiveDate`.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// The underlying `NaiveDate`.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// This day shifted by `days` (negative shifts backward).
    pub fn offset(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Whole days from `other` to `self` (positive when `self` is later).
    pub fn days_since(&self, other: DayKey) -> i64 {
        (self.0 - other.0).num_days()
    }

    /// Weekday of this date.
    pub fn weekday(&self) -> Weekday {
        match self.0.weekday() {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, DAY_FORMAT)
            .map(DayKey)
            .map_err(|_| ValidationError::InvalidDate {
                input: s.to_string(),
            })
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
