//! Unit tests for the session storage backends.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use scroll_anchor::database::Database;
use scroll_anchor::storage::sqlite::ABANDONED_AFTER;
use scroll_anchor::storage::{MemorySessionStorage, SessionStorage, SqliteSessionStorage};
use scroll_anchor::types::errors::StorageError;
use tempfile::TempDir;

fn sqlite() -> (Arc<Database>, SqliteSessionStorage) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let storage = SqliteSessionStorage::begin(db.clone()).unwrap();
    (db, storage)
}

#[rstest]
#[case::memory(Box::new(MemorySessionStorage::new()) as Box<dyn SessionStorage>)]
#[case::sqlite(Box::new(sqlite().1) as Box<dyn SessionStorage>)]
fn test_backend_get_set_remove(#[case] storage: Box<dyn SessionStorage>) {
    assert_eq!(storage.get_item("scrollPosition").unwrap(), None);

    storage.set_item("scrollPosition", "120").unwrap();
    storage.set_item("scrollPosition", "480").unwrap();
    assert_eq!(
        storage.get_item("scrollPosition").unwrap().as_deref(),
        Some("480")
    );

    storage.remove_item("scrollPosition").unwrap();
    assert_eq!(storage.get_item("scrollPosition").unwrap(), None);
    // Removing a missing key is fine.
    storage.remove_item("scrollPosition").unwrap();
}

#[test]
fn test_sessions_are_isolated() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let a = SqliteSessionStorage::begin(db.clone()).unwrap();
    let b = SqliteSessionStorage::begin(db.clone()).unwrap();
    assert_ne!(a.session_id(), b.session_id());

    a.set_item("scrollPosition", "10").unwrap();
    assert_eq!(b.get_item("scrollPosition").unwrap(), None);
}

#[test]
fn test_end_session_clears_items_and_rejects_writes() {
    let (_db, storage) = sqlite();
    storage.set_item("scrollPosition", "10").unwrap();
    assert_eq!(storage.item_count().unwrap(), 1);

    storage.end_session().unwrap();

    assert!(storage.is_ended());
    assert_eq!(storage.item_count().unwrap(), 0);
    assert_eq!(storage.get_item("scrollPosition").unwrap(), None);
    assert!(matches!(
        storage.set_item("scrollPosition", "20"),
        Err(StorageError::SessionEnded(_))
    ));
}

#[test]
fn test_resume_live_session_sees_items() {
    let (db, storage) = sqlite();
    storage.set_item("scrollPosition", "333").unwrap();

    let resumed = SqliteSessionStorage::resume(db, storage.session_id()).unwrap();
    assert_eq!(
        resumed.get_item("scrollPosition").unwrap().as_deref(),
        Some("333")
    );
}

#[test]
fn test_resume_rejects_unknown_and_ended_sessions() {
    let (db, storage) = sqlite();
    assert!(matches!(
        SqliteSessionStorage::resume(db.clone(), "missing"),
        Err(StorageError::Unavailable(_))
    ));

    storage.end_session().unwrap();
    assert!(matches!(
        SqliteSessionStorage::resume(db, storage.session_id()),
        Err(StorageError::SessionEnded(_))
    ));
}

/// Pushes a session's heartbeat two days into the past.
fn backdate(db: &Database, session_id: &str) {
    db.connection()
        .execute(
            "UPDATE sessions SET last_seen_at = last_seen_at - 172800 WHERE id = ?1",
            [session_id],
        )
        .unwrap();
}

#[test]
fn test_purge_abandoned_keeps_current_and_ended() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let crashed = SqliteSessionStorage::begin(db.clone()).unwrap();
    crashed.set_item("scrollPosition", "5").unwrap();
    backdate(&db, crashed.session_id());
    let ended = SqliteSessionStorage::begin(db.clone()).unwrap();
    ended.end_session().unwrap();
    backdate(&db, ended.session_id());
    let current = SqliteSessionStorage::begin(db.clone()).unwrap();

    assert_eq!(current.purge_abandoned(ABANDONED_AFTER).unwrap(), 1);
    assert!(matches!(
        SqliteSessionStorage::resume(db.clone(), crashed.session_id()),
        Err(StorageError::Unavailable(_))
    ));
    assert!(matches!(
        SqliteSessionStorage::resume(db.clone(), ended.session_id()),
        Err(StorageError::SessionEnded(_))
    ));
    assert!(SqliteSessionStorage::resume(db, current.session_id()).is_ok());
}

#[test]
fn test_purge_keeps_concurrent_live_session() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("session.db");
    let first = SqliteSessionStorage::begin(Arc::new(Database::open(&path).unwrap())).unwrap();
    first.set_item("scrollPosition", "842").unwrap();

    let second = SqliteSessionStorage::begin(Arc::new(Database::open(&path).unwrap())).unwrap();
    assert_eq!(second.purge_abandoned(ABANDONED_AFTER).unwrap(), 0);

    assert_eq!(
        first.get_item("scrollPosition").unwrap().as_deref(),
        Some("842")
    );
    first.set_item("scrollPosition", "900").unwrap();
    assert!(!first.is_ended());
    assert_eq!(second.get_item("scrollPosition").unwrap(), None);
}

#[test]
fn test_activity_refreshes_heartbeat() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let idle = SqliteSessionStorage::begin(db.clone()).unwrap();
    backdate(&db, idle.session_id());
    // A read counts as activity.
    idle.get_item("scrollPosition").unwrap();

    let current = SqliteSessionStorage::begin(db.clone()).unwrap();
    assert_eq!(current.purge_abandoned(ABANDONED_AFTER).unwrap(), 0);

    backdate(&db, idle.session_id());
    assert_eq!(current.purge_abandoned(Duration::from_secs(60)).unwrap(), 1);
    assert!(idle.is_ended());
}

#[test]
fn test_items_survive_reopening_the_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("session.db");
    let id = {
        let storage = SqliteSessionStorage::begin(Arc::new(Database::open(&path).unwrap())).unwrap();
        storage.set_item("scrollPosition", "777").unwrap();
        storage.session_id().to_string()
    };

    let storage = SqliteSessionStorage::resume(Arc::new(Database::open(&path).unwrap()), &id).unwrap();
    assert_eq!(
        storage.get_item("scrollPosition").unwrap().as_deref(),
        Some("777")
    );
}

#[test]
fn test_memory_clear_models_session_end() {
    let storage = MemorySessionStorage::new();
    storage.set_item("a", "1").unwrap();
    storage.set_item("b", "2").unwrap();
    assert_eq!(storage.len(), 2);
    storage.clear();
    assert!(storage.is_empty());
}
