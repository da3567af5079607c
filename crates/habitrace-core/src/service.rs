//! Orchestration over the store and the pure calculators.
//!
//! Habits are independent computation units with a single logical writer
//! each: every entry mutation runs the streak recompute before returning,
//! so "mutate entry, recompute streak" is one unit of work per habit.
//! Mutations anchor the recompute on the wall-clock current day; the
//! query methods take `today` explicitly and stay deterministic.

use chrono::Utc;

use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::error::{CoreError, Result};
use crate::habit::{Frequency, Habit, HabitKind};
use crate::race::{RaceData, RaceEngine};
use crate::store::HabitStore;
use crate::streak::{Streak, StreakCalculator, StreakOutcome};

/// High-level habit operations over a store handle.
pub struct HabitService<S: HabitStore> {
    store: S,
    streaks: StreakCalculator,
    race: RaceEngine,
}

impl<S: HabitStore> HabitService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            streaks: StreakCalculator::new(),
            race: RaceEngine::new(),
        }
    }

    /// Override the default calculators (field size, walk bound).
    pub fn with_engines(store: S, streaks: StreakCalculator, race: RaceEngine) -> Self {
        Self {
            store,
            streaks,
            race,
        }
    }

    /// Direct access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn require_habit(&self, id: &str) -> Result<Habit> {
        self.store
            .habit(id)?
            .ok_or_else(|| CoreError::HabitNotFound { id: id.to_string() })
    }

    // ── Habit lifecycle ──────────────────────────────────────────────

    pub fn create_habit(
        &self,
        name: impl Into<String>,
        kind: HabitKind,
        frequency: Frequency,
    ) -> Result<Habit> {
        let habit = Habit::new(name, kind, frequency);
        self.store.upsert_habit(&habit)?;
        Ok(habit)
    }

    /// Soft delete: the habit keeps its history but leaves default
    /// listings.
    pub fn archive_habit(&self, id: &str) -> Result<Habit> {
        let mut habit = self.require_habit(id)?;
        habit.archived = true;
        habit.updated_at = Utc::now();
        self.store.upsert_habit(&habit)?;
        Ok(habit)
    }

    /// Hard delete, cascading to entries and streak records.
    pub fn delete_habit(&self, id: &str) -> Result<()> {
        self.require_habit(id)?;
        self.store.delete_habit(id)?;
        Ok(())
    }

    // ── Entry mutations ──────────────────────────────────────────────

    /// Record (or revise) the day's entry for a habit.
    ///
    /// At most one non-attempt entry exists per habit per day: when one
    /// is already there its value is updated in place, preserving the
    /// original id and creation time.
    pub fn check_in(&self, habit_id: &str, date: DayKey, value: f64) -> Result<HabitEntry> {
        self.require_habit(habit_id)?;
        let entry = match self.store.entry_on(habit_id, date)? {
            Some(mut existing) => {
                existing.value = value;
                existing.updated_at = Utc::now();
                existing
            }
            None => HabitEntry::new(habit_id, date, value),
        };
        self.store.upsert_entry(&entry)?;
        self.update_streaks(habit_id, DayKey::today())?;
        Ok(entry)
    }

    /// Record an attempt entry; several may land on the same date.
    pub fn record_attempt(&self, habit_id: &str, date: DayKey, value: f64) -> Result<HabitEntry> {
        self.require_habit(habit_id)?;
        let entry = HabitEntry::attempt(habit_id, date, value);
        self.store.upsert_entry(&entry)?;
        self.update_streaks(habit_id, DayKey::today())?;
        Ok(entry)
    }

    /// Remove the day's non-attempt entry. Absence is not an error.
    pub fn remove_entry(&self, habit_id: &str, date: DayKey) -> Result<()> {
        self.require_habit(habit_id)?;
        self.store.delete_entry(habit_id, date)?;
        self.update_streaks(habit_id, DayKey::today())?;
        Ok(())
    }

    // ── Derived views ────────────────────────────────────────────────

    /// The live streak, computed fresh from the entry history.
    pub fn current_streak(&self, habit_id: &str, today: DayKey) -> Result<StreakOutcome> {
        let habit = self.require_habit(habit_id)?;
        let entries = self.store.entries(habit_id, None)?;
        Ok(self.streaks.current_streak(&habit, &entries, today))
    }

    /// Recompute and persist the habit's cached streak record.
    ///
    /// A habit with no entries yet is simply unset: nothing is computed
    /// or written. A live run upserts the active record (creating one if
    /// none exists) with a fresh personal-record flag; a broken run
    /// deactivates the active record, stamping `today` as its end.
    pub fn update_streaks(&self, habit_id: &str, today: DayKey) -> Result<Option<Streak>> {
        let habit = self.require_habit(habit_id)?;
        let entries = self.store.entries(habit_id, None)?;
        if entries.is_empty() {
            return Ok(None);
        }

        let outcome = self.streaks.current_streak(&habit, &entries, today);
        let active = self.store.active_streak(habit_id)?;

        if outcome.length > 0 {
            // The baseline is the longest deactivated record, so an
            // unchanged recompute keeps an identical record.
            let longest_recorded = self
                .store
                .streaks(habit_id)?
                .iter()
                .filter(|s| !s.is_active)
                .map(|s| s.length)
                .max()
                .unwrap_or(0);
            let is_personal_record = outcome.length > longest_recorded;
            let start_date = outcome.start_date.unwrap_or(today);

            let record = match active {
                Some(mut streak) => {
                    streak.start_date = start_date;
                    streak.length = outcome.length;
                    streak.is_personal_record = is_personal_record;
                    streak.updated_at = Utc::now();
                    streak
                }
                None => Streak::begin(habit_id, start_date, outcome.length, is_personal_record),
            };
            self.store.upsert_streak(&record)?;
            Ok(Some(record))
        } else if let Some(mut streak) = active {
            streak.deactivate(today);
            self.store.upsert_streak(&streak)?;
            Ok(Some(streak))
        } else {
            Ok(None)
        }
    }

    /// Build the race snapshot for a habit.
    ///
    /// Fails with [`CoreError::HabitNotFound`] for an unknown habit;
    /// otherwise never fails -- an empty history yields an empty race.
    pub fn race(&self, habit_id: &str, today: DayKey) -> Result<RaceData> {
        let habit = self.require_habit(habit_id)?;
        let entries = self.store.entries(habit_id, None)?;
        let current = self.streaks.current_streak(&habit, &entries, today);
        Ok(self.race.race_data(&habit, &entries, &current, today))
    }
}
