//! Configuration types for the session engine
//!
//! Endpoint URLs are derived from a single base URL so tests can point the
//! engine at a fixture host.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default registrar console
pub const DEFAULT_BASE_URL: &str = "https://my.freenom.com/";

/// Session engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Registrar console root, with trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Attempts per HTTP step (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Free domains may only be renewed this many days before expiry
    #[serde(default = "default_renewable_days")]
    pub renewable_days: u32,

    /// Skip TLS certificate validation
    ///
    /// The console serves a self-signed intermediate; turning this off makes
    /// every request fail on such deployments.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl SessionConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            renewable_days: default_renewable_days(),
            accept_invalid_certs: default_accept_invalid_certs(),
            user_agent: default_user_agent(),
        }
    }

    /// Point the engine at another console root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Set the attempts per HTTP step
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "base URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            )));
        }
        if !self.base_url.ends_with('/') {
            return Err(crate::Error::config("base URL must end with '/'"));
        }
        if self.max_attempts == 0 {
            return Err(crate::Error::config("max_attempts must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Login page, also the client area used for listings and DNS management
    pub fn client_area_url(&self) -> String {
        format!("{}clientarea.php", self.base_url)
    }

    /// Credential submission target
    pub fn login_submit_url(&self) -> String {
        format!("{}dologin.php", self.base_url)
    }

    /// Renewals listing and submission
    pub fn domains_url(&self) -> String {
        format!("{}domains.php", self.base_url)
    }

    /// JSON availability endpoint
    pub fn availability_url(&self) -> String {
        format!("{}includes/domains/fn-available.php", self.base_url)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_attempts() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_renewable_days() -> u32 {
    14
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0".to_string()
}

/// Account credentials
///
/// The Debug implementation never prints the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account e-mail
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_registrar_policy() {
        let config = SessionConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.renewable_days, 14);
        assert!(config.accept_invalid_certs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn endpoints_derive_from_base_url() {
        let config = SessionConfig::new().with_base_url("http://127.0.0.1:8080");
        assert_eq!(config.client_area_url(), "http://127.0.0.1:8080/clientarea.php");
        assert_eq!(config.login_submit_url(), "http://127.0.0.1:8080/dologin.php");
        assert_eq!(config.domains_url(), "http://127.0.0.1:8080/domains.php");
        assert_eq!(
            config.availability_url(),
            "http://127.0.0.1:8080/includes/domains/fn-available.php"
        );
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = SessionConfig::new().with_max_attempts(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_scheme_rejected() {
        let mut config = SessionConfig::new();
        config.base_url = "ftp://my.freenom.com/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"base_url":"https://example.test/","renewable_days":7}"#)
                .unwrap();
        assert_eq!(config.renewable_days, 7);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn password_not_exposed_in_debug() {
        let credentials = Credentials::new("user@example.com", "hunter2-secret");
        let debug_str = format!("{:?}", credentials);
        assert!(!debug_str.contains("hunter2-secret"));
        assert!(debug_str.contains("user@example.com"));
    }
}
