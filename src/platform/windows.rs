// DocsFocus platform paths for Windows
// Data: %APPDATA%/DocsFocus

use std::env;
use std::path::PathBuf;

/// Returns the data directory for DocsFocus on Windows.
/// Falls back to `C:\Users\Default\AppData\Roaming` when `%APPDATA%` is unset.
pub fn get_data_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("DocsFocus")
}
