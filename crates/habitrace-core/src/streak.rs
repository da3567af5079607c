//! Streak derivation.
//!
//! A streak is a contiguous run of qualifying completions, subject to the
//! habit's frequency schedule. The calculator is a pure function of
//! (habit, entries, today); the cached `Streak` record written back to the
//! store is maintained by the service layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::habit::Habit;

/// Hard bound on the backward walk. Caps runaway computation on corrupt
/// or pathological histories; not a user-visible error.
pub const MAX_WALK_DAYS: u32 = 1000;

/// A cached summary of a contiguous run of completed days.
///
/// At most one streak with `is_active = true` exists per habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub id: String,
    pub habit_id: String,
    pub start_date: DayKey,
    /// Set only when the streak is deactivated.
    pub end_date: Option<DayKey>,
    pub length: u32,
    pub is_active: bool,
    /// True when `length` strictly exceeded the longest previously
    /// recorded streak for the habit at the time of the update.
    pub is_personal_record: bool,
    pub updated_at: DateTime<Utc>,
}

impl Streak {
    /// Start a fresh active streak record.
    pub fn begin(
        habit_id: impl Into<String>,
        start_date: DayKey,
        length: u32,
        is_personal_record: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.into(),
            start_date,
            end_date: None,
            length,
            is_active: true,
            is_personal_record,
            updated_at: Utc::now(),
        }
    }

    /// Deactivate this streak: the run broke on `end_date`.
    pub fn deactivate(&mut self, end_date: DayKey) {
        self.is_active = false;
        self.end_date = Some(end_date);
        self.updated_at = Utc::now();
    }
}

/// Result of the backward walk: the live streak and where it started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakOutcome {
    pub length: u32,
    pub start_date: Option<DayKey>,
}

/// Derives current and historical streaks from an entry history.
#[derive(Debug, Clone)]
pub struct StreakCalculator {
    max_walk_days: u32,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakCalculator {
    pub fn new() -> Self {
        Self {
            max_walk_days: MAX_WALK_DAYS,
        }
    }

    pub fn with_max_walk_days(max_walk_days: u32) -> Self {
        Self { max_walk_days }
    }

    /// Compute the current streak by walking backward day-by-day from
    /// `today`.
    ///
    /// Rest days (dates where the schedule expects no entry) are
    /// transparent: they neither extend nor break the run. An incomplete
    /// `today` is skipped without breaking yesterday's streak; any other
    /// incomplete scheduled day stops the walk. The walk aborts after
    /// `max_walk_days` iterations regardless.
    pub fn current_streak(
        &self,
        habit: &Habit,
        entries: &[HabitEntry],
        today: DayKey,
    ) -> StreakOutcome {
        if entries.is_empty() {
            return StreakOutcome::default();
        }

        let completed_days = completed_by_day(habit, entries);

        let mut length = 0u32;
        let mut start_date = None;
        let mut date = today;

        for _ in 0..self.max_walk_days {
            if date > today {
                // Entries dated in the future never count.
                date = date.pred();
                continue;
            }
            if !habit.should_have_entry(date) {
                date = date.pred();
                continue;
            }
            if completed_days.get(&date).copied().unwrap_or(false) {
                length += 1;
                start_date = Some(date);
                date = date.pred();
            } else if date == today {
                // Today may still be pending; it does not break the run.
                date = date.pred();
            } else {
                break;
            }
        }

        StreakOutcome { length, start_date }
    }

    /// Every streak length ever reached, mapped to the most recent date
    /// it was attained.
    ///
    /// Scans the per-day completion sequence chronologically with a
    /// running counter: a completed day extends the run when no scheduled
    /// day was missed since the previous completion, restarts it at 1
    /// otherwise, and a non-completed day resets it. Every intermediate
    /// length is recorded, not just maxima. This is the race field for
    /// boolean habits.
    pub fn streak_lengths(&self, habit: &Habit, entries: &[HabitEntry]) -> BTreeMap<u32, DayKey> {
        let day_status = completed_by_day(habit, entries);

        let mut lengths = BTreeMap::new();
        let mut run = 0u32;
        let mut prev: Option<DayKey> = None;
        for (date, completed) in day_status {
            if completed {
                let missed =
                    prev.is_some_and(|p| missed_scheduled_day_between(habit, p, date));
                run = if missed { 1 } else { run + 1 };
                lengths.insert(run, date);
            } else {
                run = 0;
            }
            prev = Some(date);
        }
        lengths
    }
}

/// Per-day completion status over the scheduled days covered by `entries`.
///
/// A date counts as completed when any entry on it qualifies; attempt
/// entries can stack several records on one date. Entries on rest days
/// are transparent and ignored.
fn completed_by_day(habit: &Habit, entries: &[HabitEntry]) -> BTreeMap<DayKey, bool> {
    let mut days = BTreeMap::new();
    for entry in entries {
        if !habit.should_have_entry(entry.date) {
            continue;
        }
        let slot = days.entry(entry.date).or_insert(false);
        *slot = *slot || habit.is_completed(entry.value);
    }
    days
}

/// Whether any scheduled day lies strictly between `after` and `before`.
///
/// Any non-empty weekday schedule recurs within seven consecutive days,
/// so probing a week of the gap is enough; a longer gap with no scheduled
/// day in that probe means the schedule is empty and nothing was missed.
fn missed_scheduled_day_between(habit: &Habit, after: DayKey, before: DayKey) -> bool {
    let mut date = after.succ();
    for _ in 0..7 {
        if date >= before {
            return false;
        }
        if habit.should_have_entry(date) {
            return true;
        }
        date = date.succ();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::{Frequency, HabitKind, Weekday};
    use std::collections::BTreeSet;

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn done(habit: &Habit, date: &str) -> HabitEntry {
        HabitEntry::new(&habit.id, day(date), 1.0)
    }

    fn mwf_habit() -> Habit {
        let days: BTreeSet<Weekday> = [Weekday::Mon, Weekday::Wed, Weekday::Fri]
            .into_iter()
            .collect();
        Habit::new("gym", HabitKind::Boolean, Frequency::SpecificDays { days })
    }

    #[test]
    fn unbroken_run_counts_every_day() {
        let habit = Habit::boolean("stretch");
        let entries = vec![
            done(&habit, "2024-01-08"),
            done(&habit, "2024-01-09"),
            done(&habit, "2024-01-10"),
        ];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-10"));
        assert_eq!(outcome.length, 3);
        assert_eq!(outcome.start_date, Some(day("2024-01-08")));
    }

    #[test]
    fn empty_today_does_not_break_yesterdays_streak() {
        let habit = Habit::boolean("stretch");
        // D-3..D-1 completed, nothing for today D.
        let entries = vec![
            done(&habit, "2024-01-07"),
            done(&habit, "2024-01-08"),
            done(&habit, "2024-01-09"),
        ];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-10"));
        assert_eq!(outcome.length, 3);
        assert_eq!(outcome.start_date, Some(day("2024-01-07")));
    }

    #[test]
    fn gap_before_today_breaks_the_streak() {
        let habit = Habit::boolean("stretch");
        let entries = vec![
            done(&habit, "2024-01-06"),
            done(&habit, "2024-01-07"),
            // 2024-01-08 missing
            done(&habit, "2024-01-09"),
            done(&habit, "2024-01-10"),
        ];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-10"));
        assert_eq!(outcome.length, 2);
        assert_eq!(outcome.start_date, Some(day("2024-01-09")));
    }

    #[test]
    fn rest_days_are_transparent() {
        let habit = mwf_habit();
        // Mon 2024-01-01 and Wed 2024-01-03 completed; Tue has no entry.
        let entries = vec![done(&habit, "2024-01-01"), done(&habit, "2024-01-03")];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-03"));
        assert_eq!(outcome.length, 2);
        assert_eq!(outcome.start_date, Some(day("2024-01-01")));
    }

    #[test]
    fn zero_value_entry_is_not_a_completion() {
        let habit = Habit::boolean("stretch");
        let entries = vec![
            done(&habit, "2024-01-09"),
            HabitEntry::new(&habit.id, day("2024-01-08"), 0.0),
            done(&habit, "2024-01-07"),
        ];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-09"));
        assert_eq!(outcome.length, 1);
    }

    #[test]
    fn no_entries_yields_unset_outcome() {
        let habit = Habit::boolean("stretch");
        let outcome = StreakCalculator::new().current_streak(&habit, &[], day("2024-01-10"));
        assert_eq!(outcome, StreakOutcome::default());
    }

    #[test]
    fn walk_terminates_when_no_day_is_scheduled() {
        // An empty specific-days set never schedules an entry, so the
        // walk sees nothing but rest days until the bound trips.
        let habit = Habit::new(
            "never",
            HabitKind::Boolean,
            Frequency::SpecificDays {
                days: BTreeSet::new(),
            },
        );
        let entries = vec![done(&habit, "2024-01-01")];
        let outcome = StreakCalculator::with_max_walk_days(50)
            .current_streak(&habit, &entries, day("2024-01-10"));
        assert_eq!(outcome.length, 0);
    }

    #[test]
    fn lengths_scan_records_every_length_reached() {
        let habit = Habit::boolean("stretch");
        // 5-day run, a missing day, then a 3-day run.
        let mut entries = vec![
            done(&habit, "2024-01-01"),
            done(&habit, "2024-01-02"),
            done(&habit, "2024-01-03"),
            done(&habit, "2024-01-04"),
            done(&habit, "2024-01-05"),
            // 2024-01-06 missing
            done(&habit, "2024-01-07"),
            done(&habit, "2024-01-08"),
            done(&habit, "2024-01-09"),
        ];
        entries.reverse(); // input order must not matter

        let lengths = StreakCalculator::new().streak_lengths(&habit, &entries);
        let observed: Vec<u32> = lengths.keys().copied().collect();
        assert_eq!(observed, vec![1, 2, 3, 4, 5]);
        // Lengths 1..3 were re-reached by the later run.
        assert_eq!(lengths[&3], day("2024-01-09"));
        assert_eq!(lengths[&5], day("2024-01-05"));
    }

    #[test]
    fn lengths_scan_resets_on_failed_day() {
        let habit = Habit::boolean("stretch");
        let entries = vec![
            done(&habit, "2024-01-01"),
            done(&habit, "2024-01-02"),
            HabitEntry::new(&habit.id, day("2024-01-03"), 0.0),
            done(&habit, "2024-01-04"),
        ];
        let lengths = StreakCalculator::new().streak_lengths(&habit, &entries);
        let observed: Vec<u32> = lengths.keys().copied().collect();
        assert_eq!(observed, vec![1, 2]);
        // Length 1 was last re-reached after the failure.
        assert_eq!(lengths[&1], day("2024-01-04"));
    }

    #[test]
    fn lengths_scan_spans_rest_days() {
        let habit = mwf_habit();
        // Mon, Wed, Fri completed; the Tue/Thu gaps are rest days, and
        // the following Mon continues after the weekend.
        let entries = vec![
            done(&habit, "2024-01-01"),
            done(&habit, "2024-01-03"),
            done(&habit, "2024-01-05"),
            done(&habit, "2024-01-08"),
        ];
        let lengths = StreakCalculator::new().streak_lengths(&habit, &entries);
        let observed: Vec<u32> = lengths.keys().copied().collect();
        assert_eq!(observed, vec![1, 2, 3, 4]);
    }

    #[test]
    fn lengths_scan_resets_on_missed_scheduled_day() {
        let habit = mwf_habit();
        // Mon done, Wed missed, Fri done: the Friday run restarts at 1.
        let entries = vec![done(&habit, "2024-01-01"), done(&habit, "2024-01-05")];
        let lengths = StreakCalculator::new().streak_lengths(&habit, &entries);
        assert_eq!(lengths.keys().copied().collect::<Vec<u32>>(), vec![1]);
        assert_eq!(lengths[&1], day("2024-01-05"));
    }

    #[test]
    fn quantified_habits_count_any_positive_value() {
        let habit = Habit::quantified(
            "pushups",
            crate::habit::Direction::Maximize,
            crate::habit::MetricKind::Count,
        );
        let entries = vec![
            HabitEntry::new(&habit.id, day("2024-01-09"), 12.0),
            HabitEntry::new(&habit.id, day("2024-01-10"), 8.0),
        ];
        let outcome = StreakCalculator::new().current_streak(&habit, &entries, day("2024-01-10"));
        assert_eq!(outcome.length, 2);
    }
}
