//! Integration tests for streak computation and persistence.

use habitrace_core::{
    DayKey, Frequency, Habit, HabitEntry, HabitKind, HabitService, HabitStore, HabitDb, Weekday,
};
use std::collections::BTreeSet;

fn day(s: &str) -> DayKey {
    s.parse().unwrap()
}

fn service() -> HabitService<HabitDb> {
    HabitService::new(HabitDb::open_memory().unwrap())
}

fn seed_daily_run(svc: &HabitService<HabitDb>, habit: &Habit, dates: &[&str]) {
    for d in dates {
        svc.store()
            .upsert_entry(&HabitEntry::new(&habit.id, day(d), 1.0))
            .unwrap();
    }
}

#[test]
fn test_streak_monotonicity() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    // An unbroken run of N days ending today yields exactly N.
    seed_daily_run(
        &svc,
        &habit,
        &["2024-02-10", "2024-02-11", "2024-02-12", "2024-02-13", "2024-02-14"],
    );

    let record = svc.update_streaks(&habit.id, day("2024-02-14")).unwrap().unwrap();
    assert_eq!(record.length, 5);
    assert_eq!(record.start_date, day("2024-02-10"));
    assert!(record.is_active);
    assert!(record.is_personal_record);
}

#[test]
fn test_update_streaks_is_idempotent() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    seed_daily_run(&svc, &habit, &["2024-02-12", "2024-02-13", "2024-02-14"]);

    let today = day("2024-02-14");
    let first = svc.update_streaks(&habit.id, today).unwrap().unwrap();
    let second = svc.update_streaks(&habit.id, today).unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.length, second.length);
    assert_eq!(first.start_date, second.start_date);
    assert_eq!(first.is_personal_record, second.is_personal_record);
    assert_eq!(first.is_active, second.is_active);

    // Still exactly one streak record in the store.
    assert_eq!(svc.store().streaks(&habit.id).unwrap().len(), 1);
}

#[test]
fn test_broken_run_deactivates_and_restarts() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    seed_daily_run(&svc, &habit, &["2024-02-10", "2024-02-11", "2024-02-12"]);
    svc.update_streaks(&habit.id, day("2024-02-12")).unwrap();

    // Two days later with no entries: the run is broken.
    let closed = svc.update_streaks(&habit.id, day("2024-02-14")).unwrap().unwrap();
    assert!(!closed.is_active);
    assert_eq!(closed.end_date, Some(day("2024-02-14")));
    assert!(svc.store().active_streak(&habit.id).unwrap().is_none());

    // A new completion starts a fresh active record.
    seed_daily_run(&svc, &habit, &["2024-02-15"]);
    let fresh = svc.update_streaks(&habit.id, day("2024-02-15")).unwrap().unwrap();
    assert!(fresh.is_active);
    assert_ne!(fresh.id, closed.id);
    assert_eq!(fresh.length, 1);
    // One beats nothing yet: the three-day run is the standing record.
    assert!(!fresh.is_personal_record);
    assert_eq!(svc.store().streaks(&habit.id).unwrap().len(), 2);
}

#[test]
fn test_personal_record_beats_historical_best() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    // First run of 2, then a break.
    seed_daily_run(&svc, &habit, &["2024-02-01", "2024-02-02"]);
    svc.update_streaks(&habit.id, day("2024-02-02")).unwrap();
    svc.update_streaks(&habit.id, day("2024-02-04")).unwrap();

    // Second run grows past the old best.
    seed_daily_run(&svc, &habit, &["2024-02-05", "2024-02-06"]);
    let equal = svc.update_streaks(&habit.id, day("2024-02-06")).unwrap().unwrap();
    assert_eq!(equal.length, 2);
    assert!(!equal.is_personal_record); // must strictly exceed

    seed_daily_run(&svc, &habit, &["2024-02-07"]);
    let beats = svc.update_streaks(&habit.id, day("2024-02-07")).unwrap().unwrap();
    assert_eq!(beats.length, 3);
    assert!(beats.is_personal_record);
}

#[test]
fn test_rest_day_transparency_end_to_end() {
    let svc = service();
    let days: BTreeSet<Weekday> = [Weekday::Mon, Weekday::Wed, Weekday::Fri]
        .into_iter()
        .collect();
    let habit = svc
        .create_habit("gym", HabitKind::Boolean, Frequency::SpecificDays { days })
        .unwrap();

    // Mon 2024-02-12 and Wed 2024-02-14 done; Tuesday has nothing.
    seed_daily_run(&svc, &habit, &["2024-02-12", "2024-02-14"]);
    let outcome = svc.current_streak(&habit.id, day("2024-02-14")).unwrap();
    assert_eq!(outcome.length, 2);
    assert_eq!(outcome.start_date, Some(day("2024-02-12")));

    // Thursday is also a rest day: the streak survives untouched.
    let outcome = svc.current_streak(&habit.id, day("2024-02-15")).unwrap();
    assert_eq!(outcome.length, 2);
}

#[test]
fn test_today_pending_does_not_deactivate() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    seed_daily_run(&svc, &habit, &["2024-02-11", "2024-02-12", "2024-02-13"]);

    // Nothing recorded for the 14th yet.
    let record = svc.update_streaks(&habit.id, day("2024-02-14")).unwrap().unwrap();
    assert!(record.is_active);
    assert_eq!(record.length, 3);
}

#[test]
fn test_no_entries_means_no_streak_record() {
    let svc = service();
    let habit = svc
        .create_habit("stretch", HabitKind::Boolean, Frequency::Daily)
        .unwrap();
    assert!(svc.update_streaks(&habit.id, day("2024-02-14")).unwrap().is_none());
    assert!(svc.store().streaks(&habit.id).unwrap().is_empty());
}
