//! SQLite-based storage for habits, entries, and streak records.
//!
//! Day keys are stored as `YYYY-MM-DD` TEXT; the fixed-width format makes
//! string comparison equal chronological comparison, so range scans and
//! ORDER BY work directly on the column.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::migrations;
use crate::date::DayKey;
use crate::entry::HabitEntry;
use crate::error::DatabaseError;
use crate::habit::{Direction, Frequency, Habit, HabitKind, MetricKind, Weekday};
use crate::store::HabitStore;
use crate::streak::Streak;

// === Helper Functions ===

/// Format ranking direction for database storage
fn format_direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Maximize => "maximize",
        Direction::Minimize => "minimize",
    }
}

/// Parse ranking direction from database string
fn parse_direction(direction_str: Option<&str>) -> Direction {
    match direction_str {
        Some("minimize") => Direction::Minimize,
        _ => Direction::Maximize,
    }
}

/// Format metric kind for database storage
fn format_metric(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Count => "count",
        MetricKind::Seconds => "seconds",
        MetricKind::Minutes => "minutes",
        MetricKind::Distance => "distance",
        MetricKind::Weight => "weight",
    }
}

/// Parse metric kind from database string
fn parse_metric(metric_str: Option<&str>) -> MetricKind {
    match metric_str {
        Some("seconds") => MetricKind::Seconds,
        Some("minutes") => MetricKind::Minutes,
        Some("distance") => MetricKind::Distance,
        Some("weight") => MetricKind::Weight,
        _ => MetricKind::Count,
    }
}

/// Format frequency for database storage
fn format_frequency(frequency: &Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "daily",
        Frequency::Weekly => "weekly",
        Frequency::SpecificDays { .. } => "specific_days",
    }
}

/// Parse frequency from its column plus the specific-days JSON list
fn parse_frequency(frequency_str: &str, days_json: &str) -> Frequency {
    match frequency_str {
        "weekly" => Frequency::Weekly,
        "specific_days" => {
            let tokens: Vec<String> = serde_json::from_str(days_json).unwrap_or_default();
            let days = tokens
                .iter()
                .filter_map(|t| t.parse::<Weekday>().ok())
                .collect();
            Frequency::SpecificDays { days }
        }
        _ => Frequency::Daily,
    }
}

/// Specific days as a JSON array string (`[]` for other frequencies)
fn format_specific_days(frequency: &Frequency) -> String {
    match frequency {
        Frequency::SpecificDays { days } => {
            let tokens: Vec<&str> = days.iter().map(|d| d.token()).collect();
            serde_json::to_string(&tokens).unwrap_or_else(|_| "[]".to_string())
        }
        _ => "[]".to_string(),
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a day key column, falling back to today on corrupt data
fn parse_day_fallback(day_str: &str) -> DayKey {
    day_str.parse().unwrap_or_else(|_| DayKey::today())
}

/// Build a Habit from a database row
fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let kind_str: String = row.get(2)?;
    let direction_str: Option<String> = row.get(3)?;
    let metric_str: Option<String> = row.get(4)?;
    let kind = match kind_str.as_str() {
        "quantified" => HabitKind::Quantified {
            direction: parse_direction(direction_str.as_deref()),
            metric: parse_metric(metric_str.as_deref()),
            goal: row.get(5)?,
            unit: row.get(6)?,
        },
        _ => HabitKind::Boolean,
    };

    let frequency_str: String = row.get(7)?;
    let days_json: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Habit {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        frequency: parse_frequency(&frequency_str, &days_json),
        archived: row.get(11)?,
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_fallback(&updated_at),
    })
}

/// Build a HabitEntry from a database row
fn row_to_entry(row: &rusqlite::Row) -> Result<HabitEntry, rusqlite::Error> {
    let date: String = row.get(2)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(HabitEntry {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        date: parse_day_fallback(&date),
        value: row.get(3)?,
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_fallback(&updated_at),
        is_attempt: row.get(6)?,
    })
}

/// Build a Streak from a database row
fn row_to_streak(row: &rusqlite::Row) -> Result<Streak, rusqlite::Error> {
    let start_date: String = row.get(2)?;
    let end_date: Option<String> = row.get(3)?;
    let updated_at: String = row.get(7)?;
    Ok(Streak {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        start_date: parse_day_fallback(&start_date),
        end_date: end_date.as_deref().map(parse_day_fallback),
        length: row.get(4)?,
        is_active: row.get(5)?,
        is_personal_record: row.get(6)?,
        updated_at: parse_datetime_fallback(&updated_at),
    })
}

const HABIT_COLUMNS: &str = "id, name, kind, direction, metric, goal_value, unit, \
                             frequency, specific_days, created_at, updated_at, archived";
const ENTRY_COLUMNS: &str = "id, habit_id, date, value, created_at, updated_at, is_attempt";
const STREAK_COLUMNS: &str =
    "id, habit_id, start_date, end_date, length, is_active, is_personal_record, updated_at";

/// Repository-wide statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_habits: u64,
    pub archived_habits: u64,
    pub total_entries: u64,
    pub attempt_entries: u64,
    pub active_streaks: u64,
    pub longest_streak: u64,
}

/// SQLite database for habit storage.
///
/// Stores habits, entries, streak records, and a kv table for
/// application state.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/habitrace/habitrace.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("habitrace.db");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        // Base tables (v1 schema) first
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS habits (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                kind          TEXT NOT NULL DEFAULT 'boolean',
                direction     TEXT,
                metric        TEXT,
                goal_value    REAL,
                unit          TEXT,
                frequency     TEXT NOT NULL DEFAULT 'daily',
                specific_days TEXT NOT NULL DEFAULT '[]',
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entries (
                id         TEXT PRIMARY KEY,
                habit_id   TEXT NOT NULL,
                date       TEXT NOT NULL,
                value      REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS streaks (
                id                 TEXT PRIMARY KEY,
                habit_id           TEXT NOT NULL,
                start_date         TEXT NOT NULL,
                end_date           TEXT,
                length             INTEGER NOT NULL DEFAULT 0,
                is_active          INTEGER NOT NULL DEFAULT 0,
                is_personal_record INTEGER NOT NULL DEFAULT 0,
                updated_at         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Indexes for common query patterns
            CREATE INDEX IF NOT EXISTS idx_entries_habit_date ON entries(habit_id, date);
            CREATE INDEX IF NOT EXISTS idx_entries_created_at ON entries(created_at);
            CREATE INDEX IF NOT EXISTS idx_streaks_habit ON streaks(habit_id);",
        )?;

        // Incremental migrations (v1 -> v2, etc.)
        migrations::migrate(&self.conn)?;

        Ok(())
    }

    /// Repository-wide counters.
    pub fn stats(&self) -> Result<Stats, rusqlite::Error> {
        let mut stats = Stats::default();
        self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(archived), 0) FROM habits",
            [],
            |row| {
                stats.total_habits = row.get(0)?;
                stats.archived_habits = row.get(1)?;
                Ok(())
            },
        )?;
        self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_attempt), 0) FROM entries",
            [],
            |row| {
                stats.total_entries = row.get(0)?;
                stats.attempt_entries = row.get(1)?;
                Ok(())
            },
        )?;
        self.conn.query_row(
            "SELECT COALESCE(SUM(is_active), 0), COALESCE(MAX(length), 0) FROM streaks",
            [],
            |row| {
                stats.active_streaks = row.get(0)?;
                stats.longest_streak = row.get(1)?;
                Ok(())
            },
        )?;
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl HabitStore for HabitDb {
    fn habit(&self, id: &str) -> Result<Option<Habit>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id], row_to_habit).optional()?)
    }

    fn list_habits(&self, include_archived: bool) -> Result<Vec<Habit>, DatabaseError> {
        let sql = if include_archived {
            format!("SELECT {HABIT_COLUMNS} FROM habits ORDER BY created_at ASC")
        } else {
            format!("SELECT {HABIT_COLUMNS} FROM habits WHERE archived = 0 ORDER BY created_at ASC")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_habit)?;
        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?);
        }
        Ok(habits)
    }

    fn upsert_habit(&self, habit: &Habit) -> Result<(), DatabaseError> {
        let (direction, metric, goal, unit) = match &habit.kind {
            HabitKind::Boolean => (None, None, None, None),
            HabitKind::Quantified {
                direction,
                metric,
                goal,
                unit,
            } => (
                Some(format_direction(*direction)),
                Some(format_metric(*metric)),
                *goal,
                unit.clone(),
            ),
        };
        let kind = match &habit.kind {
            HabitKind::Boolean => "boolean",
            HabitKind::Quantified { .. } => "quantified",
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO habits
                 (id, name, kind, direction, metric, goal_value, unit,
                  frequency, specific_days, created_at, updated_at, archived)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                habit.id,
                habit.name,
                kind,
                direction,
                metric,
                goal,
                unit,
                format_frequency(&habit.frequency),
                format_specific_days(&habit.frequency),
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
                habit.archived,
            ],
        )?;
        Ok(())
    }

    fn delete_habit(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM streaks WHERE habit_id = ?1", params![id])?;
        tx.execute("DELETE FROM entries WHERE habit_id = ?1", params![id])?;
        tx.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    fn entries(
        &self,
        habit_id: &str,
        range: Option<(DayKey, DayKey)>,
    ) -> Result<Vec<HabitEntry>, DatabaseError> {
        let mut entries = Vec::new();
        match range {
            Some((start, end)) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries
                     WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC, created_at ASC"
                ))?;
                let rows = stmt.query_map(
                    params![habit_id, start.to_string(), end.to_string()],
                    row_to_entry,
                )?;
                for row in rows {
                    entries.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries
                     WHERE habit_id = ?1
                     ORDER BY date ASC, created_at ASC"
                ))?;
                let rows = stmt.query_map(params![habit_id], row_to_entry)?;
                for row in rows {
                    entries.push(row?);
                }
            }
        }
        Ok(entries)
    }

    fn entry_on(&self, habit_id: &str, date: DayKey) -> Result<Option<HabitEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE habit_id = ?1 AND date = ?2 AND is_attempt = 0"
        ))?;
        Ok(stmt
            .query_row(params![habit_id, date.to_string()], row_to_entry)
            .optional()?)
    }

    fn upsert_entry(&self, entry: &HabitEntry) -> Result<(), DatabaseError> {
        // Upsert by id only; a second non-attempt entry for the same day
        // still trips the partial unique index instead of replacing the
        // existing record.
        self.conn.execute(
            "INSERT INTO entries
                 (id, habit_id, date, value, created_at, updated_at, is_attempt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 date = excluded.date,
                 value = excluded.value,
                 updated_at = excluded.updated_at,
                 is_attempt = excluded.is_attempt",
            params![
                entry.id,
                entry.habit_id,
                entry.date.to_string(),
                entry.value,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
                entry.is_attempt,
            ],
        )?;
        Ok(())
    }

    fn delete_entry(&self, habit_id: &str, date: DayKey) -> Result<(), DatabaseError> {
        self.conn.execute(
            "DELETE FROM entries WHERE habit_id = ?1 AND date = ?2 AND is_attempt = 0",
            params![habit_id, date.to_string()],
        )?;
        Ok(())
    }

    fn active_streak(&self, habit_id: &str) -> Result<Option<Streak>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STREAK_COLUMNS} FROM streaks WHERE habit_id = ?1 AND is_active = 1"
        ))?;
        Ok(stmt.query_row(params![habit_id], row_to_streak).optional()?)
    }

    fn upsert_streak(&self, streak: &Streak) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO streaks
                 (id, habit_id, start_date, end_date, length,
                  is_active, is_personal_record, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                streak.id,
                streak.habit_id,
                streak.start_date.to_string(),
                streak.end_date.map(|d| d.to_string()),
                streak.length,
                streak.is_active,
                streak.is_personal_record,
                streak.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn streaks(&self, habit_id: &str) -> Result<Vec<Streak>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STREAK_COLUMNS} FROM streaks WHERE habit_id = ?1 ORDER BY start_date ASC"
        ))?;
        let rows = stmt.query_map(params![habit_id], row_to_streak)?;
        let mut streaks = Vec::new();
        for row in rows {
            streaks.push(row?);
        }
        Ok(streaks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Weekday;
    use std::collections::BTreeSet;

    fn day(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn habit_round_trip_for_each_kind() {
        let db = HabitDb::open_memory().unwrap();

        let boolean = Habit::boolean("floss");
        let days: BTreeSet<Weekday> = [Weekday::Tue, Weekday::Thu].into_iter().collect();
        let mut quantified =
            Habit::quantified("pushups", Direction::Maximize, MetricKind::Count);
        quantified.frequency = Frequency::SpecificDays { days };
        if let HabitKind::Quantified { goal, unit, .. } = &mut quantified.kind {
            *goal = Some(50.0);
            *unit = Some("reps".to_string());
        }

        db.upsert_habit(&boolean).unwrap();
        db.upsert_habit(&quantified).unwrap();

        let loaded = db.habit(&quantified.id).unwrap().unwrap();
        assert_eq!(loaded.kind, quantified.kind);
        assert_eq!(loaded.frequency, quantified.frequency);
        assert_eq!(db.habit(&boolean.id).unwrap().unwrap().kind, HabitKind::Boolean);
        assert!(db.habit("nope").unwrap().is_none());
    }

    #[test]
    fn archived_habits_hide_from_default_listing() {
        let db = HabitDb::open_memory().unwrap();
        let mut habit = Habit::boolean("floss");
        db.upsert_habit(&habit).unwrap();
        habit.archived = true;
        db.upsert_habit(&habit).unwrap();

        assert!(db.list_habits(false).unwrap().is_empty());
        assert_eq!(db.list_habits(true).unwrap().len(), 1);
    }

    #[test]
    fn entries_come_back_date_ordered() {
        let db = HabitDb::open_memory().unwrap();
        for d in ["2024-01-03", "2024-01-01", "2024-01-02"] {
            db.upsert_entry(&HabitEntry::new("h1", day(d), 1.0)).unwrap();
        }
        let dates: Vec<String> = db
            .entries("h1", None)
            .unwrap()
            .iter()
            .map(|e| e.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);

        let ranged = db
            .entries("h1", Some((day("2024-01-02"), day("2024-01-03"))))
            .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[test]
    fn daily_uniqueness_is_enforced_by_the_index() {
        let db = HabitDb::open_memory().unwrap();
        db.upsert_entry(&HabitEntry::new("h1", day("2024-01-01"), 1.0))
            .unwrap();
        // A second non-attempt record with a different id must be rejected.
        let dup = db.upsert_entry(&HabitEntry::new("h1", day("2024-01-01"), 0.0));
        assert!(dup.is_err());

        // Attempts are exempt from the rule.
        db.upsert_entry(&HabitEntry::attempt("h1", day("2024-01-01"), 30.0))
            .unwrap();
        db.upsert_entry(&HabitEntry::attempt("h1", day("2024-01-01"), 31.0))
            .unwrap();
        assert_eq!(db.entries("h1", None).unwrap().len(), 3);
    }

    #[test]
    fn entry_on_sees_only_non_attempts() {
        let db = HabitDb::open_memory().unwrap();
        db.upsert_entry(&HabitEntry::attempt("h1", day("2024-01-01"), 30.0))
            .unwrap();
        assert!(db.entry_on("h1", day("2024-01-01")).unwrap().is_none());

        let daily = HabitEntry::new("h1", day("2024-01-01"), 1.0);
        db.upsert_entry(&daily).unwrap();
        assert_eq!(db.entry_on("h1", day("2024-01-01")).unwrap().unwrap().id, daily.id);
    }

    #[test]
    fn delete_habit_cascades() {
        let db = HabitDb::open_memory().unwrap();
        let habit = Habit::boolean("floss");
        db.upsert_habit(&habit).unwrap();
        db.upsert_entry(&HabitEntry::new(&habit.id, day("2024-01-01"), 1.0))
            .unwrap();
        db.upsert_streak(&Streak::begin(&habit.id, day("2024-01-01"), 1, true))
            .unwrap();

        db.delete_habit(&habit.id).unwrap();
        assert!(db.habit(&habit.id).unwrap().is_none());
        assert!(db.entries(&habit.id, None).unwrap().is_empty());
        assert!(db.streaks(&habit.id).unwrap().is_empty());
    }

    #[test]
    fn streak_records_round_trip() {
        let db = HabitDb::open_memory().unwrap();
        let mut streak = Streak::begin("h1", day("2024-01-01"), 3, false);
        db.upsert_streak(&streak).unwrap();
        assert_eq!(db.active_streak("h1").unwrap().unwrap().length, 3);

        streak.deactivate(day("2024-01-04"));
        db.upsert_streak(&streak).unwrap();
        assert!(db.active_streak("h1").unwrap().is_none());
        let all = db.streaks("h1").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].end_date, Some(day("2024-01-04")));
    }

    #[test]
    fn kv_store() {
        let db = HabitDb::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn stats_counts() {
        let db = HabitDb::open_memory().unwrap();
        let habit = Habit::boolean("floss");
        db.upsert_habit(&habit).unwrap();
        db.upsert_entry(&HabitEntry::new(&habit.id, day("2024-01-01"), 1.0))
            .unwrap();
        db.upsert_entry(&HabitEntry::attempt(&habit.id, day("2024-01-01"), 30.0))
            .unwrap();
        db.upsert_streak(&Streak::begin(&habit.id, day("2024-01-01"), 4, true))
            .unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_habits, 1);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.attempt_entries, 1);
        assert_eq!(stats.active_streaks, 1);
        assert_eq!(stats.longest_streak, 4);
    }
}
