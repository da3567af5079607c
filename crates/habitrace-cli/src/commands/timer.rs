//! Attempt stopwatch commands for CLI.
//!
//! The live timer is parked in the kv store between invocations, so
//! `timer start` and a later `timer stop` can run in separate processes.

use clap::Subcommand;
use habitrace_core::{
    AttemptTimer, DayKey, HabitDb, HabitKind, HabitService, HabitStore, MetricKind,
};

use super::open_service;

const TIMER_KEY: &str = "attempt_timer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start timing an attempt
    Start {
        /// Habit ID
        habit_id: String,
    },
    /// Pause the running attempt
    Pause,
    /// Resume a paused attempt
    Resume,
    /// Show the live timer state
    Status,
    /// Stop the attempt and record it as an entry
    Stop {
        /// Throw the attempt away instead of recording it
        #[arg(long)]
        discard: bool,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = open_service()?;

    match action {
        TimerAction::Start { habit_id } => {
            if svc.store().kv_get(TIMER_KEY)?.is_some() {
                return Err("an attempt is already being timed (stop or discard it first)".into());
            }
            // Fail fast on unknown habits before any state is written.
            if svc.store().habit(&habit_id)?.is_none() {
                return Err(format!("habit not found: {habit_id}").into());
            }
            let mut timer = AttemptTimer::new(&habit_id);
            timer.start();
            svc.store().kv_set(TIMER_KEY, &serde_json::to_string(&timer)?)?;
            println!("Timing attempt for {habit_id}");
        }
        TimerAction::Pause => {
            let mut timer = load_timer(&svc)?;
            timer.pause();
            svc.store().kv_set(TIMER_KEY, &serde_json::to_string(&timer)?)?;
            println!("Paused at {:.1}s", timer.elapsed_ms() as f64 / 1000.0);
        }
        TimerAction::Resume => {
            let mut timer = load_timer(&svc)?;
            timer.resume();
            svc.store().kv_set(TIMER_KEY, &serde_json::to_string(&timer)?)?;
            println!("Resumed");
        }
        TimerAction::Status => {
            let timer = load_timer(&svc)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "habit_id": timer.habit_id(),
                    "state": timer.state(),
                    "elapsed_seconds": timer.elapsed_ms() as f64 / 1000.0,
                }))?
            );
        }
        TimerAction::Stop { discard } => {
            let mut timer = load_timer(&svc)?;
            timer.stop();
            svc.store().kv_delete(TIMER_KEY)?;
            if discard {
                println!("Attempt discarded");
                return Ok(());
            }

            let habit_id = timer.habit_id().to_string();
            let metric = match svc.store().habit(&habit_id)?.map(|h| h.kind) {
                Some(HabitKind::Quantified { metric, .. }) => metric,
                // Timed attempts on boolean habits record raw seconds.
                _ => MetricKind::Seconds,
            };
            let value = timer.value(metric);
            let entry = svc.record_attempt(&habit_id, DayKey::today(), value)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }
    Ok(())
}

fn load_timer(svc: &HabitService<HabitDb>) -> Result<AttemptTimer, Box<dyn std::error::Error>> {
    let raw = svc
        .store()
        .kv_get(TIMER_KEY)?
        .ok_or("no attempt is being timed")?;
    Ok(serde_json::from_str(&raw)?)
}
