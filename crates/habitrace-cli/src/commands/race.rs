//! Race leaderboard commands for CLI.

use clap::Subcommand;
use habitrace_core::DayKey;

use super::open_service;

#[derive(Subcommand)]
pub enum RaceAction {
    /// The habit's leaderboard with the live position
    Show {
        /// Habit ID
        habit_id: String,
    },
}

pub fn run(action: RaceAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = open_service()?;

    match action {
        RaceAction::Show { habit_id } => {
            let race = svc.race(&habit_id, DayKey::today())?;
            println!("{}", serde_json::to_string_pretty(&race)?);
        }
    }
    Ok(())
}
