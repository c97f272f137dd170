// dotpush platform paths
// Config and data directories per OS, with environment overrides for both.

use std::env;
use std::path::PathBuf;

/// Overrides the config directory on every platform.
pub const ENV_CONFIG_DIR: &str = "DOTPUSH_CONFIG_DIR";
/// Overrides the data directory on every platform.
pub const ENV_DATA_DIR: &str = "DOTPUSH_DATA_DIR";

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let home = env::var("USERPROFILE").unwrap_or_else(|_| String::from("C:\\Users\\Default"));
    #[cfg(not(target_os = "windows"))]
    let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
    PathBuf::from(home)
}

/// Returns the configuration directory for dotpush.
///
/// - **Linux**: `$XDG_CONFIG_HOME/dotpush` or `~/.config/dotpush`
/// - **macOS**: `~/Library/Application Support/dotpush`
/// - **Windows**: `%APPDATA%/dotpush`
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join("dotpush")
    }
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
            .join("dotpush")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir().join(".config"))
            .join("dotpush")
    }
}

/// Returns the data directory for dotpush (credential database and fallback file).
///
/// - **Linux**: `$XDG_DATA_HOME/dotpush` or `~/.local/share/dotpush`
/// - **macOS** and **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        get_config_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir().join(".local").join("share"))
            .join("dotpush")
    }
}
