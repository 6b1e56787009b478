//! Schema migrations for the session storage database.
//!
//! A `schema_version` table records which migrations have been applied; each
//! migration runs exactly once.

use rusqlite::{params, Connection};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the applied schema version (0 if nothing has been applied).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending migrations. Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    if current < 1 {
        migration_v1(conn)?;
        record(conn, 1, "sessions and session_items")?;
    }
    if current < 2 {
        migration_v2(conn)?;
        record(conn, 2, "session heartbeat")?;
    }
    Ok(())
}

fn record(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        params![version, now, description],
    )?;
    Ok(())
}

/// V1: browsing sessions and their key/value items.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            started_at INTEGER NOT NULL,
            ended_at INTEGER
        );

        CREATE TABLE IF NOT EXISTS session_items (
            session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (session_id, key)
        );

        CREATE INDEX IF NOT EXISTS idx_session_items_session ON session_items(session_id);
        ",
    )
}

/// V2: `last_seen_at` heartbeat, so live sessions can be told from abandoned ones.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        ALTER TABLE sessions ADD COLUMN last_seen_at INTEGER NOT NULL DEFAULT 0;
        UPDATE sessions SET last_seen_at = started_at;
        CREATE INDEX IF NOT EXISTS idx_sessions_last_seen ON sessions(last_seen_at);
        ",
    )
}
