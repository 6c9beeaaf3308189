// DocsFocus platform abstraction
// Resolves where the persistent store lives on Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Overrides the data directory when set.
pub const DATA_DIR_ENV: &str = "DOCSFOCUS_DATA_DIR";

pub const DATABASE_FILE: &str = "docsfocus.db";

/// Returns the platform-specific data directory for DocsFocus.
///
/// - **Linux**: `~/.local/share/docsfocus` (or `$XDG_DATA_HOME/docsfocus`)
/// - **macOS**: `~/Library/Application Support/DocsFocus`
/// - **Windows**: `%APPDATA%/DocsFocus`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// `$DOCSFOCUS_DATA_DIR` when set and non-empty, else the platform data directory.
pub fn resolve_data_dir() -> PathBuf {
    match env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => get_data_dir(),
    }
}

/// Default location of the settings database.
pub fn default_database_path() -> PathBuf {
    resolve_data_dir().join(DATABASE_FILE)
}
