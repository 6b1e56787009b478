//! Position Store: the persisted scroll offset.
//!
//! A thin layer over [`SessionStorage`] holding the most recent offset. With
//! [`StorageKeying::Global`] there is exactly one slot for the whole session; every
//! write overwrites it. Storage failures and malformed values are absorbed here so
//! that callers only ever see "a position" or "nothing to restore".

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::storage::SessionStorage;
use crate::types::route::Route;
use crate::types::scroll::ScrollPosition;
use crate::types::settings::{RestorationSettings, StorageKeying};

pub struct PositionStore {
    storage: Rc<dyn SessionStorage>,
    base_key: String,
    keying: StorageKeying,
    writes: Cell<u64>,
    failed_writes: Cell<u64>,
}

impl PositionStore {
    pub fn new(storage: Rc<dyn SessionStorage>, base_key: &str, keying: StorageKeying) -> Self {
        Self {
            storage,
            base_key: base_key.to_string(),
            keying,
            writes: Cell::new(0),
            failed_writes: Cell::new(0),
        }
    }

    pub fn from_settings(storage: Rc<dyn SessionStorage>, settings: &RestorationSettings) -> Self {
        Self::new(storage, &settings.storage_key, settings.keying)
    }

    pub fn keying(&self) -> StorageKeying {
        self.keying
    }

    /// Storage key used for `route`.
    pub fn key_for(&self, route: &Route) -> String {
        match self.keying {
            StorageKeying::Global => self.base_key.clone(),
            StorageKeying::PerRoute => format!("{}:{}", self.base_key, route.path()),
        }
    }

    /// Reads the persisted offset. Absent, unreadable and malformed values all
    /// come back as `None`.
    pub fn read(&self, route: &Route) -> Option<ScrollPosition> {
        let key = self.key_for(route);
        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "session storage read failed");
                return None;
            }
        };
        let position = ScrollPosition::parse(&raw);
        if position.is_none() {
            debug!(key = %key, raw = %raw, "ignoring malformed scroll position");
        }
        position
    }

    /// Persists `position`, replacing any prior value. Best effort: returns
    /// `false` if the storage rejected the write.
    pub fn write(&self, route: &Route, position: ScrollPosition) -> bool {
        let key = self.key_for(route);
        match self.storage.set_item(&key, &position.encode()) {
            Ok(()) => {
                self.writes.set(self.writes.get() + 1);
                debug!(key = %key, offset = position.offset, "scroll position saved");
                true
            }
            Err(e) => {
                self.failed_writes.set(self.failed_writes.get() + 1);
                warn!(key = %key, error = %e, "session storage write failed");
                false
            }
        }
    }

    /// Successful writes since construction.
    pub fn write_count(&self) -> u64 {
        self.writes.get()
    }

    pub fn failed_write_count(&self) -> u64 {
        self.failed_writes.get()
    }
}
