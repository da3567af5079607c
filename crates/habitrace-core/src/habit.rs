//! Habit definitions.
//!
//! A habit is either a boolean ("did I do it today") or a quantified
//! ("how much did I do") behavior. The kind is a tagged variant so the
//! completion test and the ranking comparator are exhaustively matched
//! instead of branching on loose string fields.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::DayKey;
use crate::error::ValidationError;

/// Whether higher or lower metric values rank better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Larger values win (reps, distance, focus minutes).
    Maximize,
    /// Smaller values win (lap time, weight, cigarettes).
    Minimize,
}

/// What the recorded value measures. Descriptive only -- ranking never
/// inspects the metric, just the value and the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Count,
    Seconds,
    Minutes,
    Distance,
    Weight,
}

/// Day-of-week token, serialized as `mon`..`sun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// The lowercase token used in config files and the database.
    pub fn token(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mon" => Ok(Weekday::Mon),
            "tue" => Ok(Weekday::Tue),
            "wed" => Ok(Weekday::Wed),
            "thu" => Ok(Weekday::Thu),
            "fri" => Ok(Weekday::Fri),
            "sat" => Ok(Weekday::Sat),
            "sun" => Ok(Weekday::Sun),
            _ => Err(ValidationError::UnknownWeekday {
                token: s.to_string(),
            }),
        }
    }
}

/// How often the habit expects an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    /// Every calendar day requires an entry.
    Daily,
    /// Once per week.
    ///
    /// TODO: enforce weekly cadence once habits carry a week anchor day;
    /// until then every day counts.
    Weekly,
    /// Only the listed weekdays require an entry.
    SpecificDays { days: BTreeSet<Weekday> },
}

/// The habit kind: boolean check-off or quantified metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitKind {
    /// Done / not done. Value 1 means completed.
    Boolean,
    /// Numeric metric ranked by `direction`.
    Quantified {
        direction: Direction,
        metric: MetricKind,
        #[serde(default)]
        goal: Option<f64>,
        #[serde(default)]
        unit: Option<String>,
    },
}

/// A tracked behavior definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub kind: HabitKind,
    pub frequency: Frequency,
    /// Soft-delete flag. Archived habits keep their history but are
    /// hidden from default listings.
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit with a fresh id and current timestamps.
    pub fn new(name: impl Into<String>, kind: HabitKind, frequency: Frequency) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            frequency,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shorthand for a daily boolean habit.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, HabitKind::Boolean, Frequency::Daily)
    }

    /// Shorthand for a daily quantified habit.
    pub fn quantified(name: impl Into<String>, direction: Direction, metric: MetricKind) -> Self {
        Self::new(
            name,
            HabitKind::Quantified {
                direction,
                metric,
                goal: None,
                unit: None,
            },
            Frequency::Daily,
        )
    }

    /// Whether `date` requires an entry under this habit's schedule.
    ///
    /// Days where this returns false are rest days: they neither extend
    /// nor break a streak.
    pub fn should_have_entry(&self, date: DayKey) -> bool {
        match &self.frequency {
            Frequency::Daily | Frequency::Weekly => true,
            Frequency::SpecificDays { days } => days.contains(&date.weekday()),
        }
    }

    /// Whether a recorded value counts as a completion.
    pub fn is_completed(&self, value: f64) -> bool {
        match &self.kind {
            HabitKind::Boolean => value == 1.0,
            HabitKind::Quantified { .. } => value > 0.0,
        }
    }

    /// Ranking direction. Boolean habits race streak lengths, where
    /// longer is always better.
    pub fn direction(&self) -> Direction {
        match &self.kind {
            HabitKind::Boolean => Direction::Maximize,
            HabitKind::Quantified { direction, .. } => *direction,
        }
    }
}
