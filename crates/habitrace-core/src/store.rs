//! Storage interface for habits, entries, and streak records.
//!
//! The calculators are pure functions; everything durable goes through
//! this trait. Handles are passed in explicitly (no ambient singletons),
//! so tests run against an in-memory database and alternative backends
//! only need to implement this surface.

use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::error::DatabaseError;
use crate::habit::Habit;
use crate::streak::Streak;

/// Durable keyed collection of habits, entries, and streak records.
///
/// Entry sequences are returned ordered by date, then creation time.
pub trait HabitStore {
    fn habit(&self, id: &str) -> Result<Option<Habit>, DatabaseError>;

    /// All habits; archived ones only when `include_archived` is set.
    fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, DatabaseError>;

    fn upsert_habit(&self, habit: &Habit) -> Result<(), DatabaseError>;

    /// Hard delete: cascades to the habit's entries and streak records.
    fn delete_habit(&self, id: &str) -> Result<(), DatabaseError>;

    /// Entries for a habit, optionally restricted to an inclusive date
    /// range.
    fn entries(
        &self,
        habit_id: &str,
        range: Option<(DayKey, DayKey)>,
    ) -> Result<Vec<HabitEntry>, DatabaseError>;

    /// The non-attempt entry for a date, if one exists.
    fn entry_on(&self, habit_id: &str, date: DayKey) -> Result<Option<HabitEntry>, DatabaseError>;

    fn upsert_entry(&self, entry: &HabitEntry) -> Result<(), DatabaseError>;

    /// Delete the non-attempt entry for a date (absence is not an error).
    fn delete_entry(&self, habit_id: &str, date: DayKey) -> Result<(), DatabaseError>;

    fn active_streak(&self, habit_id: &str) -> Result<Option<Streak>, DatabaseError>;

    fn upsert_streak(&self, streak: &Streak) -> Result<(), DatabaseError>;

    fn streaks(&self, habit_id: &str) -> Result<Vec<Streak>, DatabaseError>;
}
