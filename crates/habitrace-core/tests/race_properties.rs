//! Property tests for the race and streak invariants.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use habitrace_core::{
    DayKey, Direction, Habit, HabitEntry, MetricKind, RaceEngine, StreakCalculator,
};

fn day(s: &str) -> DayKey {
    s.parse().unwrap()
}

/// Entries spread over the 60 days before `today`, creation times
/// following list order.
fn entries_from(today: DayKey, raw: &[(u8, f64)]) -> Vec<HabitEntry> {
    let base = Utc::now() - Duration::minutes(raw.len() as i64);
    raw.iter()
        .enumerate()
        .map(|(i, (back, value))| {
            let mut e = HabitEntry::new("h1", today.offset(-(*back as i64)), *value);
            e.created_at = base + Duration::minutes(i as i64);
            e
        })
        .collect()
}

proptest! {
    #[test]
    fn current_position_stays_in_bounds(
        raw in prop::collection::vec((0u8..60, 0.0f64..500.0), 1..40),
        maximize in any::<bool>(),
    ) {
        let today = day("2024-06-30");
        let direction = if maximize { Direction::Maximize } else { Direction::Minimize };
        let habit = Habit::quantified("prop", direction, MetricKind::Count);
        let entries = entries_from(today, &raw);

        let current = StreakCalculator::new().current_streak(&habit, &entries, today);
        let race = RaceEngine::new().race_data(&habit, &entries, &current, today);

        prop_assert!(race.total_positions >= 1);
        prop_assert!(race.current_position >= 1);
        prop_assert!(race.current_position <= race.total_positions);
    }

    #[test]
    fn positions_are_dense_and_bounded(
        raw in prop::collection::vec((0u8..60, 0.0f64..500.0), 0..40),
    ) {
        let today = day("2024-06-30");
        let habit = Habit::quantified("prop", Direction::Maximize, MetricKind::Count);
        let entries = entries_from(today, &raw);

        let current = StreakCalculator::new().current_streak(&habit, &entries, today);
        let race = RaceEngine::new().race_data(&habit, &entries, &current, today);

        prop_assert!(race.positions.len() <= 10);
        prop_assert_eq!(race.total_positions as usize, race.positions.len());
        for (i, p) in race.positions.iter().enumerate() {
            prop_assert_eq!(p.position, i as u32 + 1);
        }
        // Exactly one slot may be current, and exactly one carries the
        // record flag on a non-empty board.
        prop_assert!(race.positions.iter().filter(|p| p.is_current).count() <= 1);
        if !race.positions.is_empty() {
            prop_assert_eq!(
                race.positions.iter().filter(|p| p.is_personal_record).count(),
                1
            );
        }
    }

    #[test]
    fn streak_never_exceeds_days_walked(
        completions in prop::collection::vec(any::<bool>(), 0..120),
    ) {
        let today = day("2024-06-30");
        let habit = Habit::boolean("prop");
        let entries: Vec<HabitEntry> = completions
            .iter()
            .enumerate()
            .map(|(back, done)| {
                HabitEntry::new(
                    &habit.id,
                    today.offset(-(back as i64)),
                    if *done { 1.0 } else { 0.0 },
                )
            })
            .collect();

        let outcome = StreakCalculator::new().current_streak(&habit, &entries, today);
        prop_assert!(outcome.length as usize <= completions.len());

        // The walk result equals the prefix of consecutive completions,
        // except that an incomplete today is forgiven.
        let mut expected = 0u32;
        for (back, done) in completions.iter().enumerate() {
            if *done {
                expected += 1;
            } else if back > 0 {
                break;
            }
        }
        prop_assert_eq!(outcome.length, expected);

        if outcome.length > 0 {
            prop_assert!(outcome.start_date.is_some());
        }
    }

    #[test]
    fn boolean_race_field_matches_lengths_reached(
        completions in prop::collection::vec(any::<bool>(), 1..60),
    ) {
        let today = day("2024-06-30");
        let habit = Habit::boolean("prop");
        let entries: Vec<HabitEntry> = completions
            .iter()
            .enumerate()
            .map(|(back, done)| {
                HabitEntry::new(
                    &habit.id,
                    today.offset(-(back as i64)),
                    if *done { 1.0 } else { 0.0 },
                )
            })
            .collect();

        let calc = StreakCalculator::new();
        let lengths = calc.streak_lengths(&habit, &entries);
        let current = calc.current_streak(&habit, &entries, today);
        let race = RaceEngine::new().race_data(&habit, &entries, &current, today);

        // Field values are exactly the top distinct lengths, descending.
        let mut expected: Vec<u32> = lengths.keys().rev().take(10).copied().collect();
        let shown: Vec<u32> = race.positions.iter().map(|p| p.value as u32).collect();
        prop_assert_eq!(shown.clone(), expected.clone());
        expected.dedup();
        prop_assert_eq!(shown.len(), expected.len());
    }
}
