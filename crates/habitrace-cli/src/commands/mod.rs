//! CLI command implementations.

pub mod config;
pub mod habit;
pub mod log;
pub mod race;
pub mod stats;
pub mod streak;
pub mod timer;

use habitrace_core::race::forecast::ForecastParams;
use habitrace_core::{Config, DayKey, HabitDb, HabitService, RaceEngine, StreakCalculator};

/// Open the shared database and wrap it in the service layer, with the
/// engines tuned from the config file.
pub fn open_service() -> Result<HabitService<HabitDb>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let streaks = StreakCalculator::with_max_walk_days(config.streak.max_walk_days);
    let race = RaceEngine::with_field_size(config.race.field_size).with_forecast(ForecastParams {
        min_samples: config.forecast.min_samples,
        window_days: config.forecast.window_days,
        max_horizon_days: config.forecast.max_horizon_days,
    });
    Ok(HabitService::with_engines(HabitDb::open()?, streaks, race))
}

/// Parse an optional `--date` argument, defaulting to today.
pub fn parse_date(date: Option<String>) -> Result<DayKey, Box<dyn std::error::Error>> {
    match date {
        Some(s) => Ok(s.parse()?),
        None => Ok(DayKey::today()),
    }
}
