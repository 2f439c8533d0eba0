//! Error types for renderfetch
//!
//! This module provides the error type hierarchy using `thiserror`.
//! Per-fetch failures ([`FetchError`]) are local to one request; session
//! lifecycle failures ([`SessionError`], [`ShutdownError`]) belong to the
//! pool.

use thiserror::Error;

use crate::session::SessionKey;

/// The main error type for renderfetch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Session creation/lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Per-request fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Aggregate pool shutdown errors
    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Session creation and pool lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// Browser process could not be started
    #[error("Failed to create session: {0}")]
    CreateFailed(String),

    /// Remote grid endpoint could not be reached
    #[error("Grid unreachable at {url}: {message}")]
    GridUnreachable {
        /// Grid endpoint that was tried
        url: String,
        /// Underlying connection error
        message: String,
    },

    /// Invalid session/browser configuration
    #[error("Invalid session configuration: {0}")]
    ConfigError(String),

    /// Acquire called after the pool was shut down
    #[error("Session pool is closed")]
    PoolClosed,
}

/// Errors local to a single fetch request
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request URL failed validation
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Page navigation failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Navigation or extraction exceeded the implicit wait bound
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Rendered markup could not be extracted from the live DOM
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Default (non-browser) path request failed
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Aggregate error for a pool shutdown sweep
///
/// Shutdown always attempts to close every pooled session; each failure is
/// recorded here with the key it was stored under.
#[derive(Error, Debug)]
#[error("{} session(s) failed to close", .failures.len())]
pub struct ShutdownError {
    /// One entry per session that failed to close cleanly
    pub failures: Vec<(SessionKey, Error)>,
}

/// Result type alias for renderfetch operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = Error::Session(SessionError::CreateFailed("no chrome".to_string()));
        assert!(err.to_string().contains("Failed to create session"));
        assert!(err.to_string().contains("no chrome"));
    }

    #[test]
    fn test_grid_unreachable() {
        let err = SessionError::GridUnreachable {
            url: "http://127.0.0.1:4444".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("http://127.0.0.1:4444"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Timeout(5000);
        assert_eq!(err.to_string(), "Operation timed out after 5000ms");
    }

    #[test]
    fn test_shutdown_error_counts_failures() {
        let err = ShutdownError {
            failures: vec![
                (
                    SessionKey::new("chrome", "default"),
                    Error::cdp("tab crashed"),
                ),
                (
                    SessionKey::new("chrome", "profile-2"),
                    Error::cdp("already closed"),
                ),
            ],
        };
        assert_eq!(err.to_string(), "2 session(s) failed to close");
    }

    #[test]
    fn test_pool_closed_display() {
        let err = SessionError::PoolClosed;
        assert_eq!(err.to_string(), "Session pool is closed");
    }
}
