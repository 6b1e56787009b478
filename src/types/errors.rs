use thiserror::Error;

/// Errors raised by session storage backends.
///
/// The scroll subsystem never surfaces these to users; the position store absorbs
/// them and falls back to default navigation behavior.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store cannot be reached at all.
    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
    /// A database operation failed.
    #[error("Session storage database error: {0}")]
    Database(String),
    /// The session was ended; its storage no longer accepts writes.
    #[error("Session has ended: {0}")]
    SessionEnded(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided value is invalid for the given key.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
