//! Reach-date forecasting.
//!
//! Projects when the current value will overtake the next race target by
//! fitting an ordinary least-squares line through the recent entries.
//! Every "no forecast" outcome -- insufficient data, unfavorable trend,
//! implausible horizon -- is `None`, never an error; callers must treat a
//! missing forecast as a normal, common result.

use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::habit::Direction;

/// Minimum entries required, both overall and inside the window.
pub const MIN_SAMPLES: usize = 7;

/// Trailing window (days back from today) the trend is fitted over.
pub const WINDOW_DAYS: i64 = 30;

/// Projections further out than this are not meaningful.
pub const MAX_HORIZON_DAYS: i64 = 180;

/// Forecast gates, tunable through the config file.
#[derive(Debug, Clone)]
pub struct ForecastParams {
    pub min_samples: usize,
    pub window_days: i64,
    pub max_horizon_days: i64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            min_samples: MIN_SAMPLES,
            window_days: WINDOW_DAYS,
            max_horizon_days: MAX_HORIZON_DAYS,
        }
    }
}

/// Estimate the calendar date on which `target_value` will be reached,
/// using the default gates.
///
/// Fits value against chronological sequence index over the entries dated
/// within the trailing 30-day window ending `today`. Returns `None` when
/// fewer than [`MIN_SAMPLES`] entries exist overall or in the window, when
/// the slope does not favor `direction` (must rise for Maximize, fall for
/// Minimize), or when the projected horizon is zero or beyond
/// [`MAX_HORIZON_DAYS`].
pub fn estimate_reach_date(
    entries: &[HabitEntry],
    current_value: f64,
    target_value: f64,
    direction: Direction,
    today: DayKey,
) -> Option<DayKey> {
    estimate_reach_date_with(
        &ForecastParams::default(),
        entries,
        current_value,
        target_value,
        direction,
        today,
    )
}

/// [`estimate_reach_date`] with explicit gates.
pub fn estimate_reach_date_with(
    params: &ForecastParams,
    entries: &[HabitEntry],
    current_value: f64,
    target_value: f64,
    direction: Direction,
    today: DayKey,
) -> Option<DayKey> {
    if entries.len() < params.min_samples {
        return None;
    }

    let window_start = today.offset(-params.window_days);
    let mut window: Vec<&HabitEntry> = entries
        .iter()
        .filter(|e| e.date >= window_start && e.date <= today)
        .collect();
    if window.len() < params.min_samples {
        return None;
    }
    window.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let slope = ols_slope(window.iter().map(|e| e.value))?;
    let favorable = match direction {
        Direction::Maximize => slope > 0.0,
        Direction::Minimize => slope < 0.0,
    };
    if !favorable {
        return None;
    }

    let days_to_target = ((target_value - current_value).abs() / slope.abs()).ceil() as i64;
    if days_to_target == 0 || days_to_target > params.max_horizon_days {
        return None;
    }

    Some(today.offset(days_to_target))
}

/// OLS slope of `values` against their index 0..n-1.
///
/// `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)`; `None` when the denominator
/// is zero (fewer than two samples).
fn ols_slope(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut n = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for (i, y) in values.enumerate() {
        let x = i as f64;
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}
