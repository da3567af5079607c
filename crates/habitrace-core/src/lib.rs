//! # Habitrace Core Library
//!
//! This library provides the core business logic for Habitrace, a habit
//! tracker that races your current performance against your own history.
//! It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Streak Calculator**: derives consecutive-completion streaks from
//!   sparse entry history, respecting per-habit frequency schedules
//! - **Race Engine**: ranks historical performances into a leaderboard
//!   with a live position and a trend-regression overtake forecast
//! - **Storage**: SQLite-based habit/entry/streak storage behind the
//!   `HabitStore` trait, plus TOML-based configuration
//! - **Attempt Timer**: wall-clock stopwatch producing attempt entries
//!
//! ## Key Components
//!
//! - [`HabitService`]: orchestration over a store handle
//! - [`StreakCalculator`] / [`RaceEngine`]: pure computation
//! - [`HabitDb`]: habit, entry, and streak persistence
//! - [`Config`]: application configuration management

pub mod attempt;
pub mod date;
pub mod entry;
pub mod error;
pub mod habit;
pub mod race;
pub mod service;
pub mod storage;
pub mod store;
pub mod streak;

pub use attempt::{AttemptTimer, AttemptTimerState};
pub use date::DayKey;
pub use entry::{latest_entry, recency_order, HabitEntry};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use habit::{Direction, Frequency, Habit, HabitKind, MetricKind, Weekday};
pub use race::{NextTarget, PreviousRecord, RaceData, RaceEngine, RacePosition};
pub use service::HabitService;
pub use storage::{Config, HabitDb, Stats};
pub use store::HabitStore;
pub use streak::{Streak, StreakCalculator, StreakOutcome};
