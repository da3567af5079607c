//! Habit entries: one recorded observation per habit per calendar day,
//! or one record per attempt for repeatable timed activities.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::DayKey;

/// One recorded value for a habit on a date.
///
/// Non-attempt entries are unique per `(habit_id, date)`; checking in
/// again on the same day updates the existing record. Attempt entries
/// (`is_attempt = true`) are exempt from the uniqueness rule, so several
/// timed attempts can land on the same date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitEntry {
    pub id: String,
    pub habit_id: String,
    pub date: DayKey,
    /// Boolean habits record 1 for completed; quantified habits record
    /// the measured value.
    pub value: f64,
    #[serde(default)]
    pub is_attempt: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HabitEntry {
    /// Create a non-attempt entry with a fresh id and current timestamps.
    pub fn new(habit_id: impl Into<String>, date: DayKey, value: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.into(),
            date,
            value,
            is_attempt: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an attempt entry (exempt from one-per-day uniqueness).
    pub fn attempt(habit_id: impl Into<String>, date: DayKey, value: f64) -> Self {
        Self {
            is_attempt: true,
            ..Self::new(habit_id, date, value)
        }
    }
}

/// The one total order behind every "most recent" lookup: `created_at`
/// descending, entry id ascending as the final tie-break.
///
/// Both the race engine and the service go through this ordering so
/// "current attempt" means the same entry everywhere.
pub fn recency_order(a: &HabitEntry, b: &HabitEntry) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// The most recent entry under [`recency_order`], if any.
pub fn latest_entry(entries: &[HabitEntry]) -> Option<&HabitEntry> {
    entries.iter().min_by(|a, b| recency_order(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn attempt_constructor_sets_flag() {
        let entry = HabitEntry::attempt("h1", day("2024-01-01"), 42.0);
        assert!(entry.is_attempt);
        assert_eq!(entry.value, 42.0);
    }

    #[test]
    fn latest_entry_by_creation_time() {
        let base = Utc::now();
        let mut older = HabitEntry::new("h1", day("2024-01-02"), 10.0);
        older.created_at = base - Duration::hours(2);
        let mut newer = HabitEntry::new("h1", day("2024-01-01"), 5.0);
        newer.created_at = base;

        // Calendar date does not matter, only creation time.
        let entries = vec![older.clone(), newer.clone()];
        assert_eq!(latest_entry(&entries).unwrap().id, newer.id);
    }

    #[test]
    fn recency_ties_break_on_id() {
        let at = Utc::now();
        let mut a = HabitEntry::new("h1", day("2024-01-01"), 1.0);
        let mut b = HabitEntry::new("h1", day("2024-01-01"), 2.0);
        a.created_at = at;
        b.created_at = at;
        a.id = "aaa".to_string();
        b.id = "bbb".to_string();

        let entries = vec![b.clone(), a.clone()];
        assert_eq!(latest_entry(&entries).unwrap().id, "aaa");
    }

    #[test]
    fn latest_entry_empty_is_none() {
        assert!(latest_entry(&[]).is_none());
    }
}
