//! renderfetch - Browser-Backed Page Fetching
//!
//! This crate extends a page-fetching pipeline so that flagged fetches are
//! satisfied by driving a real browser session and returning its rendered
//! HTML, instead of a raw network request.
//!
//! # Features
//!
//! - **Session Pool**: keyed, reusable CDP browser sessions with
//!   single-flight creation and best-effort teardown
//! - **Fetch Dispatcher**: routes each request to a browser session or the
//!   plain HTTP path, and converts the rendered DOM into a response
//! - **Narrow driver seam**: the automation backend sits behind
//!   [`SessionDriver`], so the pool and dispatcher are testable with fakes
//!
//! # Architecture
//!
//! ```text
//! Pipeline ──▶ FetchDispatcher ──▶ SessionPool ──▶ SessionDriver (CDP)
//!    │               │
//!    │               └── untagged requests ──▶ HttpFetcher (reqwest)
//!    └── "stopped" signal ──▶ pool shutdown
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use renderfetch::{Config, FetchDispatcher, FetchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = FetchDispatcher::new(Config::default());
//!
//!     let response = dispatcher
//!         .fetch(FetchRequest::get("https://example.com").browser(true))
//!         .await?;
//!
//!     println!("{} bytes of rendered HTML", response.body.len());
//!     dispatcher.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod pool;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, FetchError, Result, SessionError, ShutdownError};
pub use fetch::{FetchDispatcher, FetchRequest, FetchResponse, ResponseKind};
pub use pool::SessionPool;
pub use session::{SessionDriver, SessionFactory, SessionKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
