//! Repository statistics commands for CLI.

use clap::Subcommand;
use habitrace_core::HabitDb;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Repository-wide counters
    Summary,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;

    match action {
        StatsAction::Summary => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
