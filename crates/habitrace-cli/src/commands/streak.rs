//! Streak inspection commands for CLI.

use clap::Subcommand;
use habitrace_core::{DayKey, HabitStore};

use super::open_service;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Current streak for a habit
    Show {
        /// Habit ID
        habit_id: String,
    },
    /// All streak records for a habit
    History {
        /// Habit ID
        habit_id: String,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = open_service()?;

    match action {
        StreakAction::Show { habit_id } => {
            // Refresh the cached record so show never reports stale state.
            let record = svc.update_streaks(&habit_id, DayKey::today())?;
            let outcome = svc.current_streak(&habit_id, DayKey::today())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "current": outcome,
                    "record": record,
                }))?
            );
        }
        StreakAction::History { habit_id } => {
            let streaks = svc.store().streaks(&habit_id)?;
            println!("{}", serde_json::to_string_pretty(&streaks)?);
        }
    }
    Ok(())
}
