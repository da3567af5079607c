//! Race leaderboard construction.
//!
//! A race ranks a habit's historical performances and places the current
//! attempt among them. Boolean habits race the distinct streak lengths
//! they have ever reached; quantified habits race entry values, with the
//! displayed field curated down to a mix of all-time bests and recent
//! attempts so the board stays small and alive.

pub mod forecast;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::date::DayKey;
use crate::entry::{latest_entry, recency_order, HabitEntry};
use crate::habit::{Direction, Habit, HabitKind};
use crate::streak::{StreakCalculator, StreakOutcome};

/// Maximum slots on the displayed leaderboard.
pub const FIELD_SIZE: usize = 10;

/// Share of the field filled from all-time bests; the remainder comes
/// from the most recently created entries.
const BEST_SHARE: f64 = 0.75;

/// One ranked slot on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePosition {
    pub value: f64,
    pub date: DayKey,
    /// 1-based, dense over the displayed set. Because the display is a
    /// curated subset of the full history, this is the rank within the
    /// sample, not the entry's global rank.
    pub position: u32,
    pub is_personal_record: bool,
    pub is_current: bool,
}

/// The slot directly ahead of the current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTarget {
    pub value: f64,
    pub position: u32,
    /// Projected overtake date; absent whenever the trend gives no
    /// meaningful forecast.
    pub estimated_date: Option<DayKey>,
}

/// The standing record the current attempt is chasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousRecord {
    pub value: f64,
    pub date: DayKey,
}

/// Snapshot of a habit's race, derived on demand and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceData {
    pub positions: Vec<RacePosition>,
    /// Within `[1, total_positions]` when the race is non-empty, else 0.
    pub current_position: u32,
    pub total_positions: u32,
    pub next_target: Option<NextTarget>,
    pub previous_record: Option<PreviousRecord>,
}

/// Builds race leaderboards from entry history.
#[derive(Debug, Clone)]
pub struct RaceEngine {
    field_size: usize,
    streaks: StreakCalculator,
    forecast: forecast::ForecastParams,
}

impl Default for RaceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RaceEngine {
    pub fn new() -> Self {
        Self {
            field_size: FIELD_SIZE,
            streaks: StreakCalculator::new(),
            forecast: forecast::ForecastParams::default(),
        }
    }

    pub fn with_field_size(field_size: usize) -> Self {
        Self {
            field_size: field_size.max(1),
            ..Self::new()
        }
    }

    /// Replace the forecast gates (builder style).
    pub fn with_forecast(mut self, params: forecast::ForecastParams) -> Self {
        self.forecast = params;
        self
    }

    /// Build the race snapshot for a habit.
    ///
    /// Never fails: an empty entry history yields an empty race. The
    /// caller supplies the current streak (the cached result of the
    /// streak walk) so boolean races agree with the persisted record.
    pub fn race_data(
        &self,
        habit: &Habit,
        entries: &[HabitEntry],
        current_streak: &StreakOutcome,
        today: DayKey,
    ) -> RaceData {
        match &habit.kind {
            HabitKind::Boolean => self.boolean_race(habit, entries, current_streak.length),
            HabitKind::Quantified { direction, .. } => {
                self.quantified_race(entries, *direction, today)
            }
        }
    }

    /// Streak-length racing for boolean habits.
    ///
    /// The field is the set of distinct streak lengths ever achieved,
    /// best first; the slot equal to the live current streak (if any) is
    /// the current position.
    fn boolean_race(&self, habit: &Habit, entries: &[HabitEntry], current_streak: u32) -> RaceData {
        let lengths = self.streaks.streak_lengths(habit, entries);
        if lengths.is_empty() {
            return RaceData::default();
        }

        let positions: Vec<RacePosition> = lengths
            .iter()
            .rev()
            .take(self.field_size)
            .enumerate()
            .map(|(i, (length, date))| RacePosition {
                value: *length as f64,
                date: *date,
                position: i as u32 + 1,
                is_personal_record: i == 0,
                is_current: current_streak > 0 && *length == current_streak,
            })
            .collect();

        let current_position =
            resolve_current_position(&positions, current_streak as f64, Direction::Maximize);

        // Boolean races have no value trend to regress over, so the next
        // target carries no estimated date.
        let next_target = find_next_target(&positions, current_position)
            .map(|(value, position)| NextTarget {
                value,
                position,
                estimated_date: None,
            });

        RaceData {
            previous_record: previous_record(&positions),
            total_positions: positions.len() as u32,
            current_position,
            next_target,
            positions,
        }
    }

    /// Value racing for quantified habits.
    ///
    /// Ground-truth ranking covers the full history; the displayed field
    /// mixes best-by-value with most-recent-by-creation slots (at most
    /// `field_size`, deduplicated by entry identity) and re-sorts the
    /// union by value for dense display positions.
    fn quantified_race(
        &self,
        entries: &[HabitEntry],
        direction: Direction,
        today: DayKey,
    ) -> RaceData {
        let Some(current) = latest_entry(entries) else {
            return RaceData::default();
        };

        let mut ranked: Vec<&HabitEntry> = entries.iter().collect();
        ranked.sort_by(|a, b| value_order(a, b, direction));
        // The true best always carries the record flag, whether or not
        // curation would have displayed it on recency grounds.
        let record_id = ranked[0].id.clone();

        let best_quota = ((self.field_size as f64) * BEST_SHARE).floor() as usize;
        let recent_quota = self.field_size - best_quota;

        let mut selected: Vec<&HabitEntry> = ranked.iter().take(best_quota).copied().collect();
        let mut by_recency: Vec<&HabitEntry> = entries.iter().collect();
        by_recency.sort_by(|a, b| recency_order(a, b));
        for entry in by_recency.iter().take(recent_quota) {
            if !selected.iter().any(|s| s.id == entry.id) {
                selected.push(entry);
            }
        }
        selected.sort_by(|a, b| value_order(a, b, direction));

        let positions: Vec<RacePosition> = selected
            .iter()
            .enumerate()
            .map(|(i, entry)| RacePosition {
                value: entry.value,
                date: entry.date,
                position: i as u32 + 1,
                is_personal_record: entry.id == record_id,
                is_current: entry.id == current.id,
            })
            .collect();

        let current_position = resolve_current_position(&positions, current.value, direction);

        let next_target =
            find_next_target(&positions, current_position).map(|(value, position)| NextTarget {
                value,
                position,
                estimated_date: forecast::estimate_reach_date_with(
                    &self.forecast,
                    entries,
                    current.value,
                    value,
                    direction,
                    today,
                ),
            });

        RaceData {
            previous_record: previous_record(&positions),
            total_positions: positions.len() as u32,
            current_position,
            next_target,
            positions,
        }
    }
}

/// Value ordering for a race: best value first per `direction`, ties
/// broken by earlier date, then id.
fn value_order(a: &HabitEntry, b: &HabitEntry, direction: Direction) -> Ordering {
    let primary = match direction {
        Direction::Maximize => b.value.partial_cmp(&a.value),
        Direction::Minimize => a.value.partial_cmp(&b.value),
    }
    .unwrap_or(Ordering::Equal);
    primary
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Locate the current value's rank within the displayed positions.
///
/// The `is_current` slot wins outright when present. Otherwise the first
/// displayed value the current value ties-or-beats (per direction)
/// decides the rank, falling back to one past the field; the result is
/// clamped so it never exceeds the total.
fn resolve_current_position(
    positions: &[RacePosition],
    current_value: f64,
    direction: Direction,
) -> u32 {
    let total = positions.len() as u32;
    if total == 0 {
        return 0;
    }
    if let Some(slot) = positions.iter().find(|p| p.is_current) {
        return slot.position;
    }
    let ties_or_beats = |target: f64| match direction {
        Direction::Maximize => current_value >= target,
        Direction::Minimize => current_value <= target,
    };
    let position = positions
        .iter()
        .find(|p| ties_or_beats(p.value))
        .map(|p| p.position)
        .unwrap_or(total + 1);
    position.clamp(1, total)
}

/// The slot one rank ahead of the current position, if displayed.
fn find_next_target(positions: &[RacePosition], current_position: u32) -> Option<(f64, u32)> {
    if current_position <= 1 {
        return None;
    }
    positions
        .iter()
        .find(|p| p.position == current_position - 1)
        .map(|p| (p.value, p.position))
}

/// The standing record, unless the current attempt already holds it.
fn previous_record(positions: &[RacePosition]) -> Option<PreviousRecord> {
    positions
        .first()
        .filter(|p| !p.is_current)
        .map(|p| PreviousRecord {
            value: p.value,
            date: p.date,
        })
}
