//! Client configuration.
//!
//! A `ClientConfig` names the vCenter endpoint, the credentials used to open
//! sessions, and the timeouts applied to outgoing requests. It is either built
//! directly or read from `VCCLI_*` environment variables.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_URL: &str = "VCCLI_URL";
const ENV_USERNAME: &str = "VCCLI_USERNAME";
const ENV_PASSWORD: &str = "VCCLI_PASSWORD";
const ENV_TIMEOUT: &str = "VCCLI_TIMEOUT_SECS";
const ENV_AUTH_TIMEOUT: &str = "VCCLI_AUTH_TIMEOUT_SECS";

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Timeout for every request sent by the default transport.
    pub request_timeout: Option<Duration>,
    /// Deadline for the session validate/create round-trips when the
    /// outgoing request carries no timeout of its own.
    pub auth_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            request_timeout: Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
            auth_timeout: None,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(Error::MissingConfig(name))
        };

        let mut config = Self::new(required(ENV_URL)?, required(ENV_USERNAME)?, required(ENV_PASSWORD)?);

        if let Some(value) = lookup(ENV_TIMEOUT) {
            config.request_timeout = parse_timeout(ENV_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_AUTH_TIMEOUT) {
            config.auth_timeout = parse_timeout(ENV_AUTH_TIMEOUT, &value)?;
        }

        Ok(config)
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.auth_timeout = timeout;
        self
    }
}

// Password stays out of logs and panics.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("auth_timeout", &self.auth_timeout)
            .finish()
    }
}

/// Parse a whole number of seconds; `0` disables the timeout.
fn parse_timeout(name: &'static str, value: &str) -> Result<Option<Duration>> {
    let secs: u64 = value.trim().parse().map_err(|_| Error::InvalidConfig {
        name,
        value: value.to_string(),
    })?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
