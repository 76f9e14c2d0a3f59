//! Proxy configuration.
//!
//! Layered, later layers win:
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`, `IML_PROXY_CONFIG`, or
//!    `~/.config/iml-proxy/config.toml` when it exists)
//! 3. environment variables (a `.env` file is loaded into the environment
//!    by `main` before this runs)
//! 4. command-line flags, applied by `main`
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! static_dir = "public"
//!
//! [iml]
//! base_url = "https://www.imleagues.com/api"
//! email = "coach@example.edu"
//! school_id = "1234"
//! network_id = "5678"
//! timeout_seconds = 30
//! ```
//!
//! The password is best left to `IML_PASSWORD`.

use std::fs;
use std::path::{Path, PathBuf};

use iml_common::ImlConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};
use crate::paths;

/// Full proxy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// League API client settings
    #[serde(default)]
    pub iml: ImlConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for paths outside the API (default: none)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

impl ProxyConfig {
    /// Loads configuration from file and process environment.
    ///
    /// `path` is the explicitly requested file, if any; it must exist. When
    /// absent the default location is used if a file is there.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicitly requested file doesn't exist or can't be read
    /// - The file isn't valid TOML for this schema
    /// - An environment variable holds an unparseable value
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(
            path,
            paths::default_config_file().as_deref(),
            |key| std::env::var(key).ok(),
        )
    }

    /// [`load`](Self::load) with the default file location and the
    /// environment supplied by the caller.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with<F>(
        path: Option<&Path>,
        default_file: Option<&Path>,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match (path, default_file) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(default)) if default.exists() => Self::from_file(default)?,
            (None, _) => Self::default(),
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProxyError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;

        Ok(toml::from_str(&contents)?)
    }

    /// Overrides settings from environment-style variables.
    ///
    /// `lookup` returns the value of a variable, if set. Empty values are
    /// treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `IML_TIMEOUT_SECONDS` is not a number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("IML_BASE_URL") {
            self.iml.base_url = v;
        }
        if let Some(v) = get("IML_EMAIL") {
            self.iml.email = Some(v);
        }
        if let Some(v) = get("IML_PASSWORD") {
            self.iml.password = Some(SecretString::new(v.into()));
        }
        if let Some(v) = get("IML_SCHOOL_ID") {
            self.iml.school_id = Some(v);
        }
        if let Some(v) = get("IML_NETWORK_ID") {
            self.iml.network_id = Some(v);
        }
        if let Some(v) = get("IML_TIMEOUT_SECONDS") {
            self.iml.timeout_seconds = Some(v.trim().parse().map_err(|e| {
                ProxyError::Config(format!("IML_TIMEOUT_SECONDS must be a number: {e}"))
            })?);
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .map_err(|e| ProxyError::Config(format!("PORT must be a port number: {e}")))?;
        }
        if let Some(v) = get("IML_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(v));
        }

        Ok(())
    }

    /// Names of login settings that are still missing.
    ///
    /// Missing values are not fatal at startup; the routes that need them
    /// fail when called.
    pub fn missing_login_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.iml.email.is_none() {
            missing.push("IML_EMAIL");
        }
        if self.iml.password.is_none() {
            missing.push("IML_PASSWORD");
        }
        missing
    }

    /// The socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::collections::HashMap;
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn sample_config_toml() -> &'static str {
        r#"
[server]
host = "127.0.0.1"
port = 8080
static_dir = "public"

[iml]
base_url = "https://iml.example.com/api"
email = "coach@example.edu"
school_id = "1234"
network_id = "5678"
timeout_seconds = 30
        "#
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_config() {
        let config: ProxyConfig = toml::from_str(sample_config_toml()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.static_dir, Some(PathBuf::from("public")));
        assert_eq!(config.iml.base_url, "https://iml.example.com/api");
        assert_eq!(config.iml.email.as_deref(), Some("coach@example.edu"));
        assert_eq!(config.iml.network_id.as_deref(), Some("5678"));
        assert_eq!(config.iml.timeout_seconds, Some(30));
        assert!(config.iml.password.is_none());
    }

    #[test]
    fn test_default_settings() {
        let config: ProxyConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.iml.base_url, iml_common::DEFAULT_BASE_URL);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: ProxyConfig = toml::from_str(sample_config_toml()).unwrap();
        config
            .apply_env(env(&[
                ("IML_EMAIL", "other@example.edu"),
                ("IML_PASSWORD", "hunter2"),
                ("PORT", "9000"),
                ("IML_NETWORK_ID", ""),
            ]))
            .unwrap();

        assert_eq!(config.iml.email.as_deref(), Some("other@example.edu"));
        assert_eq!(config.iml.password.unwrap().expose_secret(), "hunter2");
        assert_eq!(config.server.port, 9000);
        // empty values leave the file setting alone
        assert_eq!(config.iml.network_id.as_deref(), Some("5678"));
    }

    #[test]
    fn test_invalid_port_fails() {
        let mut config = ProxyConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_timeout_fails() {
        let mut config = ProxyConfig::default();
        assert!(
            config
                .apply_env(env(&[("IML_TIMEOUT_SECONDS", "soon")]))
                .is_err()
        );
    }

    #[test]
    fn test_missing_login_settings() {
        let mut config = ProxyConfig::default();
        assert_eq!(
            config.missing_login_settings(),
            vec!["IML_EMAIL", "IML_PASSWORD"]
        );

        config
            .apply_env(env(&[("IML_EMAIL", "a@b.c"), ("IML_PASSWORD", "pw")]))
            .unwrap();
        assert!(config.missing_login_settings().is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_config_toml().as_bytes()).unwrap();

        let config = ProxyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProxyConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_uses_default_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("iml-proxy").join("config.toml");
        std::fs::create_dir_all(default.parent().unwrap()).unwrap();
        std::fs::write(&default, sample_config_toml()).unwrap();

        let config = ProxyConfig::load_with(None, Some(&default), env(&[])).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.iml.network_id.as_deref(), Some("5678"));
    }

    #[test]
    fn test_load_without_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("iml-proxy").join("config.toml");

        let config = ProxyConfig::load_with(None, Some(&default), env(&[])).unwrap();
        assert_eq!(config.server.port, 3000);

        let config = ProxyConfig::load_with(None, None, env(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_load_explicit_file_wins_and_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("default.toml");
        std::fs::write(&default, "[server]\nport = 1111\n").unwrap();
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&explicit, "[server]\nport = 2222\n").unwrap();

        let config = ProxyConfig::load_with(Some(&explicit), Some(&default), env(&[])).unwrap();
        assert_eq!(config.server.port, 2222);

        let missing = dir.path().join("missing.toml");
        assert!(ProxyConfig::load_with(Some(&missing), Some(&default), env(&[])).is_err());
    }

    #[test]
    fn test_load_applies_server_env() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("config.toml");
        std::fs::write(&default, sample_config_toml()).unwrap();

        let config = ProxyConfig::load_with(
            None,
            Some(&default),
            env(&[("HOST", "127.0.0.2"), ("IML_STATIC_DIR", "/srv/www")]),
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.2");
        assert_eq!(config.server.static_dir, Some(PathBuf::from("/srv/www")));
        assert_eq!(config.bind_address(), "127.0.0.2:8080");
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nport = \"not a number\"\n").unwrap();

        let err = ProxyConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ProxyError::Toml(_)));
    }
}
