//! Connection settings for [`HttpTransport`](crate::HttpTransport).
//!
//! Settings can be built fluently or loaded from TOML:
//!
//! ```toml
//! base_url = "http://localhost:8080"
//! timeout_ms = 10000
//!
//! [auth]
//! type = "basic"
//! username = "root"
//! password = "secret"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How requests are authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    /// HTTP Basic auth.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// A pre-built `Authorization` header value, sent as is.
    Header { value: String },
}

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Backend root; resources live at `{base_url}/{Type}`.
    pub base_url: String,

    pub auth: Option<AuthConfig>,

    /// Per-request timeout in milliseconds (default: 30 000). `0` disables it.
    pub timeout_ms: u64,

    /// `Accept` media type (default: `application/json`).
    pub accept: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            auth: None,
            timeout_ms: 30_000,
            accept: "application/json".to_string(),
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parses settings from a TOML document; missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthConfig::Bearer {
            token: token.into(),
        });
        self
    }

    /// Sends `value` verbatim as the `Authorization` header.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.auth = Some(AuthConfig::Header {
            value: value.into(),
        });
        self
    }

    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// becomes `0`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_millis() + u128::from(timeout.subsec_nanos() % 1_000_000 != 0);
        self.timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// The request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}
