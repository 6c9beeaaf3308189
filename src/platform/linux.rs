// DocsFocus platform paths for Linux
// Data: ~/.local/share/docsfocus

use std::env;
use std::path::PathBuf;

/// Returns the data directory for DocsFocus on Linux.
/// Uses `$XDG_DATA_HOME/docsfocus` if set, otherwise `~/.local/share/docsfocus`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("docsfocus"),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("docsfocus")
        }
    }
}
