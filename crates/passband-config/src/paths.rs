//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/passband/config.toml`
//! - macOS: `~/Library/Application Support/passband/config.toml`
//! - Windows: `%APPDATA%\passband\config.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "passband";

/// File name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path where the engine looks for its configuration when none is given.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}
