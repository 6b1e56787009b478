//! Unit tests for the PositionStore: absence handling, overwrite semantics,
//! keying and storage failures.

use std::rc::Rc;

use rstest::rstest;
use scroll_anchor::managers::position_store::PositionStore;
use scroll_anchor::storage::{MemorySessionStorage, SessionStorage};
use scroll_anchor::types::errors::StorageError;
use scroll_anchor::types::route::Route;
use scroll_anchor::types::scroll::ScrollPosition;
use scroll_anchor::types::settings::{RestorationSettings, StorageKeying};

/// Storage that rejects every call, like a browser with storage disabled.
struct BrokenStorage;

impl SessionStorage for BrokenStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }
    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }
    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disabled".into()))
    }
}

fn global_store() -> (Rc<MemorySessionStorage>, PositionStore) {
    let storage = Rc::new(MemorySessionStorage::new());
    let store = PositionStore::new(storage.clone(), "scrollPosition", StorageKeying::Global);
    (storage, store)
}

#[test]
fn test_read_absent_is_none() {
    let (_storage, store) = global_store();
    assert_eq!(store.read(&Route::parse("/chat")), None);
}

#[test]
fn test_write_then_read() {
    let (storage, store) = global_store();
    assert!(store.write(&Route::parse("/chat"), ScrollPosition::new(842)));
    assert_eq!(
        storage.get_item("scrollPosition").unwrap().as_deref(),
        Some("842")
    );
    assert_eq!(store.read(&Route::parse("/chat")), Some(ScrollPosition::new(842)));
    assert_eq!(store.write_count(), 1);
}

#[test]
fn test_last_write_wins() {
    let (_storage, store) = global_store();
    let route = Route::parse("/chat");
    store.write(&route, ScrollPosition::new(100));
    store.write(&route, ScrollPosition::new(5));
    assert_eq!(store.read(&route), Some(ScrollPosition::new(5)));
}

#[test]
fn test_global_keying_shares_one_slot_across_routes() {
    let (storage, store) = global_store();
    store.write(&Route::parse("/tools/chat"), ScrollPosition::new(300));
    assert_eq!(
        store.read(&Route::parse("/admin/users")),
        Some(ScrollPosition::new(300))
    );
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_per_route_keying_separates_paths() {
    let storage = Rc::new(MemorySessionStorage::new());
    let store = PositionStore::new(storage.clone(), "scrollPosition", StorageKeying::PerRoute);
    let chat = Route::parse("/tools/chat?thread=1");
    let research = Route::parse("/tools/deep-research");

    store.write(&chat, ScrollPosition::new(300));
    store.write(&research, ScrollPosition::new(40));

    assert_eq!(store.key_for(&chat), "scrollPosition:/tools/chat");
    assert_eq!(store.read(&chat), Some(ScrollPosition::new(300)));
    assert_eq!(store.read(&research), Some(ScrollPosition::new(40)));
    // The query string does not change the slot.
    assert_eq!(
        store.read(&Route::parse("/tools/chat?thread=2")),
        Some(ScrollPosition::new(300))
    );
    assert_eq!(storage.len(), 2);
}

#[rstest]
#[case("", None)]
#[case("abc", None)]
#[case("NaN", None)]
#[case("12.9", Some(12))]
#[case("-40", Some(0))]
#[case("  256 ", Some(256))]
fn test_read_tolerates_stored_values(#[case] raw: &str, #[case] expected: Option<u32>) {
    let (storage, store) = global_store();
    storage.set_item("scrollPosition", raw).unwrap();
    assert_eq!(
        store.read(&Route::default()),
        expected.map(ScrollPosition::new)
    );
}

#[test]
fn test_broken_storage_reads_none_and_counts_failed_writes() {
    let store = PositionStore::new(Rc::new(BrokenStorage), "scrollPosition", StorageKeying::Global);
    let route = Route::parse("/chat");

    assert_eq!(store.read(&route), None);
    assert!(!store.write(&route, ScrollPosition::new(10)));
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.failed_write_count(), 1);
}

#[test]
fn test_from_settings_uses_configured_key() {
    let storage = Rc::new(MemorySessionStorage::new());
    let settings = RestorationSettings {
        storage_key: "dashScroll".into(),
        ..RestorationSettings::default()
    };
    let store = PositionStore::from_settings(storage.clone(), &settings);
    store.write(&Route::default(), ScrollPosition::new(9));
    assert_eq!(storage.get_item("dashScroll").unwrap().as_deref(), Some("9"));
    assert_eq!(store.keying(), StorageKeying::Global);
}
