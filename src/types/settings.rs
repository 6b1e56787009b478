use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::page::PageId;

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ShellSettings {
    pub restoration: RestorationSettings,
    pub pages: PageSettings,
    pub shell: ShellSection,
}

/// How persisted offsets are keyed in session storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKeying {
    /// One slot for the whole session.
    #[default]
    Global,
    /// One slot per route path.
    PerRoute,
}

/// Timing and storage of restoration attempts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RestorationSettings {
    pub storage_key: String,
    pub keying: StorageKeying,
    /// Chained frame-callback attempts per activation.
    pub frame_attempts: u8,
    /// Timer fallback for the global coordinator. `None` disables it.
    pub delayed_restore_ms: Option<u64>,
    /// Timer fallback for page hooks. `None` disables it.
    pub page_delayed_restore_ms: Option<u64>,
}

impl Default for RestorationSettings {
    fn default() -> Self {
        Self {
            storage_key: "scrollPosition".to_string(),
            keying: StorageKeying::Global,
            frame_attempts: 2,
            delayed_restore_ms: Some(100),
            page_delayed_restore_ms: None,
        }
    }
}

impl RestorationSettings {
    pub fn delayed_restore(&self) -> Option<Duration> {
        self.delayed_restore_ms.map(Duration::from_millis)
    }

    pub fn page_delayed_restore(&self) -> Option<Duration> {
        self.page_delayed_restore_ms.map(Duration::from_millis)
    }
}

/// Which tool pages mount their own hook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageSettings {
    pub enabled: Vec<PageId>,
    pub emit_signals: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            enabled: PageId::ALL.to_vec(),
            emit_signals: true,
        }
    }
}

impl PageSettings {
    pub fn is_enabled(&self, page: PageId) -> bool {
        self.enabled.contains(&page)
    }
}

/// Process-level options for the binaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellSection {
    pub dashboard_url: String,
    pub log_filter: String,
    /// File name of the session storage database inside the data directory.
    pub session_db: String,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            dashboard_url: "http://localhost:3000".to_string(),
            log_filter: "scroll_anchor=info".to_string(),
            session_db: "session.db".to_string(),
        }
    }
}
