//! XDG-compliant path helpers.
//!
//! Respects `XDG_CONFIG_HOME`, falling back to `~/.config`.

use std::path::PathBuf;

/// Returns the XDG config base directory.
///
/// Uses `XDG_CONFIG_HOME` if set, otherwise `~/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
}

/// Returns the default configuration file path,
/// `<config dir>/iml-proxy/config.toml`.
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("iml-proxy").join("config.toml"))
}
