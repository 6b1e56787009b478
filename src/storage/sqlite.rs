//! SQLite-backed session storage.
//!
//! Each browsing session gets a row in `sessions`; its items live in
//! `session_items` until [`SqliteSessionStorage::end_session`] clears them.
//! Every read and write refreshes the session's `last_seen_at`, and only
//! sessions silent for longer than a cutoff count as abandoned.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SessionStorage;
use crate::database::connection::Database;
use crate::types::errors::StorageError;

/// Silence after which a never-ended session is considered abandoned.
pub const ABANDONED_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Session storage persisted in SQLite, scoped to one session id.
pub struct SqliteSessionStorage {
    db: Arc<Database>,
    session_id: String,
}

impl SqliteSessionStorage {
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Starts a new browsing session with an empty item set.
    pub fn begin(db: Arc<Database>) -> Result<Self, StorageError> {
        let session_id = Uuid::new_v4().to_string();
        db.connection().execute(
            "INSERT INTO sessions (id, started_at, ended_at, last_seen_at) VALUES (?1, ?2, NULL, ?2)",
            params![session_id, Self::now()],
        )?;
        info!(session_id = %session_id, "session storage started");
        Ok(Self { db, session_id })
    }

    /// Reattaches to a live session, e.g. after a full-page reload re-spawned the host.
    ///
    /// # Errors
    /// `Unavailable` if the session is unknown, `SessionEnded` if it was ended.
    pub fn resume(db: Arc<Database>, session_id: &str) -> Result<Self, StorageError> {
        let ended: Option<Option<i64>> = db
            .connection()
            .query_row(
                "SELECT ended_at FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        match ended {
            None => Err(StorageError::Unavailable(format!(
                "unknown session {}",
                session_id
            ))),
            Some(Some(_)) => Err(StorageError::SessionEnded(session_id.to_string())),
            Some(None) => {
                debug!(session_id, "session storage resumed");
                let storage = Self {
                    db,
                    session_id: session_id.to_string(),
                };
                storage.touch()?;
                Ok(storage)
            }
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_ended(&self) -> bool {
        self.db
            .connection()
            .query_row(
                "SELECT ended_at IS NOT NULL FROM sessions WHERE id = ?1",
                params![self.session_id],
                |row| row.get::<_, bool>(0),
            )
            .unwrap_or(true)
    }

    /// Ends the session: every item is dropped and later writes are rejected.
    pub fn end_session(&self) -> Result<(), StorageError> {
        let conn = self.db.connection();
        conn.execute(
            "DELETE FROM session_items WHERE session_id = ?1",
            params![self.session_id],
        )?;
        conn.execute(
            "UPDATE sessions SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
            params![Self::now(), self.session_id],
        )?;
        info!(session_id = %self.session_id, "session storage ended");
        Ok(())
    }

    /// Records that this session is still alive.
    pub fn touch(&self) -> Result<(), StorageError> {
        self.db.connection().execute(
            "UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
            params![Self::now(), self.session_id],
        )?;
        Ok(())
    }

    fn touch_quietly(&self) {
        if let Err(e) = self.touch() {
            warn!(session_id = %self.session_id, error = %e, "failed to refresh session heartbeat");
        }
    }

    /// Removes never-ended sessions, other than this one, that have not been
    /// seen for `max_idle`, such as those left behind by a crashed host.
    /// Sessions of other live hosts on the same database are kept.
    /// Returns how many sessions were purged.
    pub fn purge_abandoned(&self, max_idle: Duration) -> Result<usize, StorageError> {
        let cutoff = Self::now().saturating_sub(max_idle.as_secs() as i64);
        let purged = self.db.connection().execute(
            "DELETE FROM sessions WHERE id != ?1 AND ended_at IS NULL AND last_seen_at < ?2",
            params![self.session_id, cutoff],
        )?;
        if purged > 0 {
            info!(purged, "purged abandoned sessions");
        }
        Ok(purged)
    }

    /// Number of items stored for this session.
    pub fn item_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM session_items WHERE session_id = ?1",
            params![self.session_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.touch_quietly();
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM session_items WHERE session_id = ?1 AND key = ?2",
                params![self.session_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.is_ended() {
            return Err(StorageError::SessionEnded(self.session_id.clone()));
        }
        self.touch_quietly();
        self.db.connection().execute(
            "INSERT INTO session_items (session_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.session_id, key, value, Self::now()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM session_items WHERE session_id = ?1 AND key = ?2",
            params![self.session_id, key],
        )?;
        Ok(())
    }
}
