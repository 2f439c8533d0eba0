//! Process-wide configuration
//!
//! Resolved once at startup and read-only afterwards. The recognized options
//! mirror the settings surface of the host pipeline: default browser name,
//! remote grid endpoint, and the default implicit wait applied to DOM
//! operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Default browser identity used when a request carries no override
pub const DEFAULT_BROWSER_NAME: &str = "chrome";

/// Default remote grid endpoint
pub const DEFAULT_GRID_URL: &str = "http://127.0.0.1:4444";

/// Configuration for the fetch subsystem
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Default browser identity for session keys (default: "chrome")
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// Endpoint for remote session provisioning (default: http://127.0.0.1:4444)
    #[serde(default = "default_grid_url")]
    pub grid_url: String,
    /// Default per-operation wait bound (default: 0, unbounded)
    #[serde(default)]
    pub implicit_wait: Duration,
}

fn default_browser_name() -> String {
    DEFAULT_BROWSER_NAME.to_string()
}

fn default_grid_url() -> String {
    DEFAULT_GRID_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_name: default_browser_name(),
            grid_url: default_grid_url(),
            implicit_wait: Duration::ZERO,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve configuration from the process environment.
    ///
    /// Recognized variables: `RENDERFETCH_BROWSER_NAME`,
    /// `RENDERFETCH_GRID_URL`, `RENDERFETCH_IMPLICIT_WAIT_SECS`. Unset
    /// variables fall back to the defaults; a non-numeric wait value is a
    /// configuration error.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("RENDERFETCH_BROWSER_NAME") {
            if !name.is_empty() {
                config.browser_name = name;
            }
        }
        if let Ok(url) = std::env::var("RENDERFETCH_GRID_URL") {
            if !url.is_empty() {
                config.grid_url = url;
            }
        }
        if let Ok(secs) = std::env::var("RENDERFETCH_IMPLICIT_WAIT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                SessionError::ConfigError(format!(
                    "RENDERFETCH_IMPLICIT_WAIT_SECS must be an integer, got {:?}",
                    secs
                ))
            })?;
            config.implicit_wait = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Builder for [`Config`]
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the default browser name
    pub fn browser_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.browser_name = name.into();
        self
    }

    /// Set the remote grid endpoint
    pub fn grid_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.grid_url = url.into();
        self
    }

    /// Set the default implicit wait
    pub fn implicit_wait(mut self, wait: Duration) -> Self {
        self.config.implicit_wait = wait;
        self
    }

    /// Build the config
    pub fn build(self) -> Config {
        self.config
    }
}
