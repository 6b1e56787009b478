//! Session-scoped key/value persistence.
//!
//! The [`SessionStorage`] trait mirrors the browser's session storage surface: string
//! keys, string values, contents scoped to one browsing session. Two backends are
//! provided:
//!
//! - [`MemorySessionStorage`] keeps values for the lifetime of the process.
//! - [`SqliteSessionStorage`] keeps values in SQLite so they survive full-page
//!   navigations and process restarts until the session is ended.

pub mod memory;
pub mod sqlite;

pub use memory::MemorySessionStorage;
pub use sqlite::SqliteSessionStorage;

use crate::types::errors::StorageError;

/// Key/value surface scoped to one browsing session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
