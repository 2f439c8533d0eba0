//! Browser session abstraction
//!
//! A session is an opaque handle to a running browser, exposed through the
//! narrow [`SessionDriver`] interface so the pool and dispatcher never
//! depend on a concrete automation backend. [`cdp::CdpSession`] is the
//! ChromiumOxide-backed implementation.

pub mod cdp;
pub mod stealth;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

pub use cdp::{CdpSession, CdpSessionFactory, ProvisionMode};

/// Default context identity used when a request carries no override
pub const DEFAULT_CONTEXT_NAME: &str = "default";

/// Identifies an isolated, reusable browser session slot.
///
/// Two requests carrying the same key are served by the same underlying
/// session; distinct keys never share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Browser identity, e.g. "chrome"
    pub browser: String,
    /// Context/profile identity, e.g. "default"
    pub context: String,
}

impl SessionKey {
    /// Create a key from a browser and context name
    pub fn new<B: Into<String>, C: Into<String>>(browser: B, context: C) -> Self {
        Self {
            browser: browser.into(),
            context: context.into(),
        }
    }

    /// The key used when a request carries no browser/context override
    pub fn default_for(config: &Config) -> Self {
        Self::new(config.browser_name.clone(), DEFAULT_CONTEXT_NAME)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.browser, self.context)
    }
}

/// Narrow interface over a live browser session.
///
/// The pool owns stored sessions exclusively; the dispatcher only borrows a
/// handle for the duration of one fetch and must never call [`close`].
/// Navigation on a shared handle is not serialized here — callers sharing a
/// key concurrently must serialize themselves or use one key per stream.
///
/// [`close`]: SessionDriver::close
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Bound how long subsequent DOM/script operations may block.
    /// `Duration::ZERO` means unbounded.
    async fn set_implicit_wait(&self, wait: Duration) -> Result<()>;

    /// Navigate the session to a URL and wait for the page to load
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a script against the live DOM and return its string result
    async fn evaluate(&self, script: &str) -> Result<String>;

    /// Tear the session down. Called exactly once, by the pool, at shutdown
    /// (or by the caller for sessions it supplied itself).
    async fn close(&self) -> Result<()>;
}

impl fmt::Debug for dyn SessionDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn SessionDriver")
    }
}

/// Creates sessions on demand for the pool
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a new session for `key`
    async fn create(&self, key: &SessionKey) -> Result<Arc<dyn SessionDriver>>;
}
