//! Entry recording commands for CLI.

use clap::Subcommand;

use super::{open_service, parse_date};

#[derive(Subcommand)]
pub enum LogAction {
    /// Mark a boolean habit done for the day
    Done {
        /// Habit ID
        habit_id: String,
        /// Calendar day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Record a value for a quantified habit
    Value {
        /// Habit ID
        habit_id: String,
        /// Measured value
        value: f64,
        /// Calendar day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Record an attempt (several may land on one day)
    Attempt {
        /// Habit ID
        habit_id: String,
        /// Measured value
        value: f64,
        /// Calendar day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove the day's entry
    Remove {
        /// Habit ID
        habit_id: String,
        /// Calendar day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = open_service()?;

    match action {
        LogAction::Done { habit_id, date } => {
            let entry = svc.check_in(&habit_id, parse_date(date)?, 1.0)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        LogAction::Value {
            habit_id,
            value,
            date,
        } => {
            let entry = svc.check_in(&habit_id, parse_date(date)?, value)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        LogAction::Attempt {
            habit_id,
            value,
            date,
        } => {
            let entry = svc.record_attempt(&habit_id, parse_date(date)?, value)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        LogAction::Remove { habit_id, date } => {
            let date = parse_date(date)?;
            svc.remove_entry(&habit_id, date)?;
            println!("Entry removed: {habit_id} {date}");
        }
    }
    Ok(())
}
