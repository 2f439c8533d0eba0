//! Fetch request/response boundary types
//!
//! [`FetchRequest`] is the typed options bag the host pipeline hands us:
//! the routing flag, optional session/key/wait overrides, and the target
//! URL. [`FetchResponse`] is what both fetch paths produce.

pub mod dispatcher;
pub mod net;
pub mod response;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::session::{SessionDriver, SessionKey, DEFAULT_CONTEXT_NAME};

pub use dispatcher::FetchDispatcher;
pub use net::{HttpFetcher, ReqwestFetcher};
pub use response::ResponseKind;

/// Flag set on responses produced by a browser session
pub const BROWSER_FLAG: &str = "browser";

/// Encoding of browser-extracted markup (always UTF-8)
pub const BROWSER_ENCODING: &str = "utf-8";

/// A fetch request as handed in by the host pipeline
#[derive(Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Target URL
    pub url: String,
    /// Route this request through a browser session
    #[serde(default)]
    pub browser: bool,
    /// Caller-supplied session; bypasses the pool entirely and stays owned
    /// by the caller
    #[serde(skip)]
    pub session: Option<Arc<dyn SessionDriver>>,
    /// Per-request browser identity override
    #[serde(default)]
    pub browser_name: Option<String>,
    /// Per-request context/profile identity override
    #[serde(default)]
    pub context_name: Option<String>,
    /// Per-request implicit wait override
    #[serde(default)]
    pub implicit_wait: Option<Duration>,
}

impl FetchRequest {
    /// Start building a GET request for `url`
    pub fn get<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            browser: false,
            session: None,
            browser_name: None,
            context_name: None,
            implicit_wait: None,
        }
    }

    /// Route this request through a browser session
    pub fn browser(mut self, browser: bool) -> Self {
        self.browser = browser;
        self
    }

    /// Use a caller-supplied session instead of the pool
    pub fn with_session(mut self, session: Arc<dyn SessionDriver>) -> Self {
        self.session = Some(session);
        self
    }

    /// Override the browser identity for this request
    pub fn browser_name<S: Into<String>>(mut self, name: S) -> Self {
        self.browser_name = Some(name.into());
        self
    }

    /// Override the context identity for this request
    pub fn context_name<S: Into<String>>(mut self, name: S) -> Self {
        self.context_name = Some(name.into());
        self
    }

    /// Override the implicit wait for this request
    pub fn implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = Some(wait);
        self
    }

    /// The session key this request maps to: per-request overrides where
    /// present, `(config.browser_name, "default")` otherwise.
    pub fn session_key(&self, config: &Config) -> SessionKey {
        SessionKey::new(
            self.browser_name
                .clone()
                .unwrap_or_else(|| config.browser_name.clone()),
            self.context_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTEXT_NAME.to_string()),
        )
    }

    /// Validate the target URL at the dispatch boundary
    pub(crate) fn validate(&self) -> Result<Url> {
        Url::parse(&self.url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.url, e)).into())
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url)
            .field("browser", &self.browser)
            .field("session", &self.session.as_ref().map(|_| "<override>"))
            .field("browser_name", &self.browser_name)
            .field("context_name", &self.context_name)
            .field("implicit_wait", &self.implicit_wait)
            .finish()
    }
}

/// A fetch response handed back to the host pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Request URL
    pub url: String,
    /// Extracted or downloaded body
    pub body: String,
    /// Encoding label; fixed to `utf-8` for browser-sourced responses
    pub encoding: String,
    /// Classified content kind
    pub kind: ResponseKind,
    /// Source markers for downstream disambiguation
    pub flags: Vec<String>,
}

impl FetchResponse {
    /// Build a browser-sourced response: classify the extracted markup,
    /// fix the encoding to UTF-8, and mark the source flag.
    pub(crate) fn browser_sourced_from(url: String, body: String) -> Self {
        let kind = ResponseKind::classify(&url, &body);
        Self {
            url,
            body,
            encoding: BROWSER_ENCODING.to_string(),
            kind,
            flags: vec![BROWSER_FLAG.to_string()],
        }
    }

    /// Whether this response came out of a browser session
    pub fn browser_sourced(&self) -> bool {
        self.flags.iter().any(|f| f == BROWSER_FLAG)
    }
}
