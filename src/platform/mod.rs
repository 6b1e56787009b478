// Platform directories
// Resolves where settings and the session database live on each OS.
//
// `SCROLL_ANCHOR_CONFIG_DIR` and `SCROLL_ANCHOR_DATA_DIR` take precedence over the
// platform defaults.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "scroll-anchor";

fn home() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}

fn from_env(var: &str) -> Option<PathBuf> {
    env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/scroll-anchor` or `~/.config/scroll-anchor`
/// - **macOS**: `~/Library/Application Support/scroll-anchor`
/// - **Windows**: `%APPDATA%/scroll-anchor`
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = from_env("SCROLL_ANCHOR_CONFIG_DIR") {
        return dir;
    }
    #[cfg(target_os = "macos")]
    {
        home().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        from_env("APPDATA")
            .unwrap_or_else(|| home().join("AppData").join("Roaming"))
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        from_env("XDG_CONFIG_HOME")
            .unwrap_or_else(|| home().join(".config"))
            .join(APP_DIR)
    }
}

/// Directory holding the session storage database.
///
/// - **Linux**: `$XDG_DATA_HOME/scroll-anchor` or `~/.local/share/scroll-anchor`
/// - **macOS**: `~/Library/Application Support/scroll-anchor`
/// - **Windows**: `%LOCALAPPDATA%/scroll-anchor`
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = from_env("SCROLL_ANCHOR_DATA_DIR") {
        return dir;
    }
    #[cfg(target_os = "macos")]
    {
        home().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        from_env("LOCALAPPDATA")
            .unwrap_or_else(|| home().join("AppData").join("Local"))
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        from_env("XDG_DATA_HOME")
            .unwrap_or_else(|| home().join(".local").join("share"))
            .join(APP_DIR)
    }
}
