//! Attempt stopwatch.
//!
//! Wall-clock stopwatch for timed attempts. No internal threads: elapsed
//! time derives from epoch-millisecond deltas whenever the caller asks,
//! and the whole timer serializes so a CLI invocation can park it in the
//! kv store and a later invocation can stop it. Stopping produces the
//! metric value recorded as an attempt entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::habit::MetricKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptTimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Caller-driven stopwatch for one attempt at a habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptTimer {
    habit_id: String,
    state: AttemptTimerState,
    /// Elapsed time banked across pauses.
    accumulated_ms: u64,
    /// Epoch ms of the last start/resume; `None` unless running.
    #[serde(default)]
    last_resume_epoch_ms: Option<u64>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl AttemptTimer {
    pub fn new(habit_id: impl Into<String>) -> Self {
        Self {
            habit_id: habit_id.into(),
            state: AttemptTimerState::Idle,
            accumulated_ms: 0,
            last_resume_epoch_ms: None,
            started_at: None,
        }
    }

    pub fn habit_id(&self) -> &str {
        &self.habit_id
    }

    pub fn state(&self) -> AttemptTimerState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn start(&mut self) {
        self.start_at(now_epoch_ms());
    }

    pub fn pause(&mut self) {
        self.pause_at(now_epoch_ms());
    }

    pub fn resume(&mut self) {
        self.resume_at(now_epoch_ms());
    }

    /// Stop the attempt and return the total elapsed milliseconds.
    pub fn stop(&mut self) -> u64 {
        self.stop_at(now_epoch_ms())
    }

    /// Elapsed milliseconds, including the live span when running.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms_at(now_epoch_ms())
    }

    /// The elapsed duration expressed in the habit's metric.
    ///
    /// Seconds and minutes convert directly; other metrics cannot be
    /// derived from a clock and fall back to raw seconds.
    pub fn value(&self, metric: MetricKind) -> f64 {
        let seconds = self.elapsed_ms() as f64 / 1000.0;
        match metric {
            MetricKind::Seconds => seconds,
            MetricKind::Minutes => seconds / 60.0,
            MetricKind::Count | MetricKind::Distance | MetricKind::Weight => seconds,
        }
    }

    /// Build the attempt entry for this timer's result.
    pub fn into_entry(self, date: DayKey, metric: MetricKind) -> HabitEntry {
        let value = self.value(metric);
        HabitEntry::attempt(self.habit_id, date, value)
    }

    fn start_at(&mut self, now_ms: u64) {
        if self.state != AttemptTimerState::Idle {
            return;
        }
        self.state = AttemptTimerState::Running;
        self.last_resume_epoch_ms = Some(now_ms);
        self.started_at = Some(Utc::now());
    }

    fn pause_at(&mut self, now_ms: u64) {
        if self.state != AttemptTimerState::Running {
            return;
        }
        self.accumulated_ms += self.live_span_ms(now_ms);
        self.last_resume_epoch_ms = None;
        self.state = AttemptTimerState::Paused;
    }

    fn resume_at(&mut self, now_ms: u64) {
        if self.state != AttemptTimerState::Paused {
            return;
        }
        self.last_resume_epoch_ms = Some(now_ms);
        self.state = AttemptTimerState::Running;
    }

    fn stop_at(&mut self, now_ms: u64) -> u64 {
        if self.state == AttemptTimerState::Running {
            self.accumulated_ms += self.live_span_ms(now_ms);
        }
        self.last_resume_epoch_ms = None;
        self.state = AttemptTimerState::Stopped;
        self.accumulated_ms
    }

    fn elapsed_ms_at(&self, now_ms: u64) -> u64 {
        match self.state {
            AttemptTimerState::Running => self.accumulated_ms + self.live_span_ms(now_ms),
            _ => self.accumulated_ms,
        }
    }

    fn live_span_ms(&self, now_ms: u64) -> u64 {
        self.last_resume_epoch_ms
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0)
    }
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
