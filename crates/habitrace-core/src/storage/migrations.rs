//! Database schema migrations for habitrace.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: Initial schema (baseline).
///
/// Represents the original daily-only schema. A no-op since the tables
/// are created by HabitDb::migrate() directly.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration v2: attempt entries and habit archiving.
///
/// Adds:
/// - `entries.is_attempt`: repeatable timed attempts, exempt from the
///   one-entry-per-day rule
/// - `habits.archived`: soft-delete flag
/// - a partial unique index enforcing one non-attempt entry per habit
///   per day
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE entries ADD COLUMN is_attempt INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE habits ADD COLUMN archived INTEGER NOT NULL DEFAULT 0;

         CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_daily_unique
             ON entries(habit_id, date)
             WHERE is_attempt = 0;",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
