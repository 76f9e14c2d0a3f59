use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default base URL of the external league API.
pub const DEFAULT_BASE_URL: &str = "https://www.imleagues.com/api";

/// Configuration for the league API client.
///
/// Holds the account credentials used for login and the identifiers the
/// forwarded routes are scoped by. Credentials and the network identifier are
/// optional here on purpose: their absence is reported when an operation that
/// needs them runs, not when the process starts.
///
/// # Security
///
/// The `password` field uses `SecretString` and is never serialized.
///
/// # Examples
///
/// ```
/// use iml_common::ImlConfig;
///
/// let config = ImlConfig::new()
///     .with_email("coach@example.edu")
///     .with_password("hunter2")
///     .with_network_id("1234");
///
/// assert_eq!(config.email.as_deref(), Some("coach@example.edu"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ImlConfig {
    /// Base URL that relative API paths are joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Account email used for login.
    #[serde(default)]
    pub email: Option<String>,
    /// Account password used for login (stored securely).
    #[serde(skip_serializing, default)]
    pub password: Option<SecretString>,
    /// Optional school (organization) identifier sent with login.
    #[serde(default)]
    pub school_id: Option<String>,
    /// Network identifier that scopes the games listing.
    #[serde(default)]
    pub network_id: Option<String>,
    /// Outbound request timeout in seconds. `None` means no timeout.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ImlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            email: None,
            password: None,
            school_id: None,
            network_id: None,
            timeout_seconds: None,
        }
    }
}

// Custom Debug implementation to avoid exposing the password
impl fmt::Debug for ImlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImlConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("school_id", &self.school_id)
            .field("network_id", &self.network_id)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ImlConfig {
    /// Creates a configuration pointing at the default base URL with no
    /// credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for API requests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the account email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the account password.
    ///
    /// The password is stored securely using `SecretString`.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into().into()));
        self
    }

    /// Sets the school identifier sent with login.
    #[must_use]
    pub fn with_school_id(mut self, school_id: impl Into<String>) -> Self {
        self.school_id = Some(school_id.into());
        self
    }

    /// Sets the network identifier used by the games listing.
    #[must_use]
    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    /// Sets the outbound request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}
