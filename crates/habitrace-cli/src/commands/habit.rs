//! Habit management commands for CLI.

use std::collections::BTreeSet;

use clap::Subcommand;
use habitrace_core::{
    Direction, Frequency, HabitKind, HabitStore, MetricKind, Weekday,
};

use super::open_service;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Add {
        /// Habit name
        name: String,
        /// Track a numeric value instead of done/not-done
        #[arg(long)]
        quantified: bool,
        /// Ranking direction: maximize or minimize
        #[arg(long, default_value = "maximize")]
        direction: String,
        /// Metric: count, seconds, minutes, distance, weight
        #[arg(long, default_value = "count")]
        metric: String,
        /// Goal value (display only)
        #[arg(long)]
        goal: Option<f64>,
        /// Unit label (display only)
        #[arg(long)]
        unit: Option<String>,
        /// Frequency: daily, weekly, or specific-days
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Comma-separated weekday tokens for --frequency specific-days
        #[arg(long)]
        days: Option<String>,
    },
    /// List habits
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Archive a habit (soft delete, history kept)
    Archive {
        /// Habit ID
        id: String,
    },
    /// Delete a habit and all its entries and streaks
    Delete {
        /// Habit ID
        id: String,
    },
}

fn parse_direction(s: &str) -> Result<Direction, Box<dyn std::error::Error>> {
    match s {
        "maximize" => Ok(Direction::Maximize),
        "minimize" => Ok(Direction::Minimize),
        _ => Err(format!("unknown direction: {s} (expected maximize or minimize)").into()),
    }
}

fn parse_metric(s: &str) -> Result<MetricKind, Box<dyn std::error::Error>> {
    match s {
        "count" => Ok(MetricKind::Count),
        "seconds" => Ok(MetricKind::Seconds),
        "minutes" => Ok(MetricKind::Minutes),
        "distance" => Ok(MetricKind::Distance),
        "weight" => Ok(MetricKind::Weight),
        _ => Err(format!("unknown metric: {s}").into()),
    }
}

fn parse_frequency(
    frequency: &str,
    days: Option<&str>,
) -> Result<Frequency, Box<dyn std::error::Error>> {
    match frequency {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "specific-days" | "specific_days" => {
            let tokens = days.ok_or("--days is required for specific-days frequency")?;
            let mut set = BTreeSet::new();
            for token in tokens.split(',') {
                set.insert(token.trim().parse::<Weekday>()?);
            }
            if set.is_empty() {
                return Err("--days must list at least one weekday".into());
            }
            Ok(Frequency::SpecificDays { days: set })
        }
        _ => Err(format!("unknown frequency: {frequency}").into()),
    }
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = open_service()?;

    match action {
        HabitAction::Add {
            name,
            quantified,
            direction,
            metric,
            goal,
            unit,
            frequency,
            days,
        } => {
            let kind = if quantified {
                HabitKind::Quantified {
                    direction: parse_direction(&direction)?,
                    metric: parse_metric(&metric)?,
                    goal,
                    unit,
                }
            } else {
                HabitKind::Boolean
            };
            let frequency = parse_frequency(&frequency, days.as_deref())?;
            let habit = svc.create_habit(name, kind, frequency)?;
            println!("Habit created: {}", habit.id);
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { all } => {
            let habits = svc.store().list_habits(all)?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Get { id } => {
            match svc.store().habit(&id)? {
                Some(habit) => println!("{}", serde_json::to_string_pretty(&habit)?),
                None => {
                    eprintln!("habit not found: {id}");
                    std::process::exit(1);
                }
            }
        }
        HabitAction::Archive { id } => {
            let habit = svc.archive_habit(&id)?;
            println!("Habit archived: {}", habit.id);
        }
        HabitAction::Delete { id } => {
            svc.delete_habit(&id)?;
            println!("Habit deleted: {id}");
        }
    }
    Ok(())
}
