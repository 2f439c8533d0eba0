//! Fetch dispatcher
//!
//! Routes each request either through a pooled browser session or the
//! default network path, and owns the subsystem lifecycle: one pool per
//! dispatcher, shut down once when the host pipeline stops.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::net::{HttpFetcher, ReqwestFetcher};
use super::{FetchRequest, FetchResponse};
use crate::config::Config;
use crate::error::Result;
use crate::pool::SessionPool;
use crate::session::CdpSessionFactory;

/// Script evaluated against the live DOM to extract the rendered markup
const RENDERED_MARKUP_SCRIPT: &str = "document.documentElement.outerHTML";

/// Routes fetch requests and performs browser-driven fetches end-to-end.
///
/// A request is handled by the browser path iff it carries the browser
/// flag; everything else is delegated unchanged to the default path. Many
/// fetches may be in flight concurrently; only first-creation-per-key is
/// serialized (by the pool).
pub struct FetchDispatcher {
    config: Config,
    pool: Arc<SessionPool>,
    net: Arc<dyn HttpFetcher>,
}

impl FetchDispatcher {
    /// Create a dispatcher with the production wiring: CDP-backed sessions
    /// and a `reqwest` default path.
    pub fn new(config: Config) -> Self {
        let factory = Arc::new(CdpSessionFactory::new(config.clone()));
        Self {
            pool: Arc::new(SessionPool::new(factory)),
            net: Arc::new(ReqwestFetcher::new()),
            config,
        }
    }

    /// Create a dispatcher from explicit collaborators (test seam)
    pub fn with_parts(config: Config, pool: Arc<SessionPool>, net: Arc<dyn HttpFetcher>) -> Self {
        Self { config, pool, net }
    }

    /// The session pool owned by this dispatcher
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }

    /// The process-wide configuration this dispatcher resolved at startup
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch a request, routing it by its browser flag.
    ///
    /// Per-request failures are local: they fail this fetch without
    /// touching pool state or other in-flight fetches.
    #[instrument(skip(self, request), fields(url = %request.url, browser = request.browser))]
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        if !request.browser {
            return self.net.fetch(&request).await;
        }
        self.browser_fetch(request).await
    }

    /// The browser-fetch protocol: select a session, configure the wait,
    /// navigate, extract the rendered markup, build the response.
    async fn browser_fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        request.validate()?;

        let session = match request.session.clone() {
            // Caller keeps ownership; the pool never sees this session
            Some(session) => {
                debug!("using caller-supplied session");
                session
            }
            None => {
                let key = request.session_key(&self.config);
                self.pool.acquire(&key).await?
            }
        };

        let wait = request.implicit_wait.unwrap_or(self.config.implicit_wait);
        session.set_implicit_wait(wait).await?;

        session.navigate(&request.url).await?;
        let body = session.evaluate(RENDERED_MARKUP_SCRIPT).await?;

        debug!(bytes = body.len(), "rendered markup extracted");
        Ok(FetchResponse::browser_sourced_from(request.url, body))
    }

    /// Shut down the session pool. Invoked once when the host pipeline
    /// stops; after this, browser-flagged fetches fail.
    pub async fn shutdown(&self) -> Result<()> {
        info!("dispatcher shutting down");
        self.pool.shutdown().await
    }

    /// Consume the host pipeline's "stopped" notification.
    ///
    /// The spawned task waits for the signal (or for the sender to be
    /// dropped) and then shuts the pool down, logging an aggregate error
    /// rather than propagating it.
    pub fn spawn_stop_listener(self: Arc<Self>, stopped: oneshot::Receiver<()>) -> JoinHandle<()> {
        let dispatcher = self;
        tokio::spawn(async move {
            let _ = stopped.await;
            if let Err(e) = dispatcher.shutdown().await {
                warn!(error = %e, "shutdown reported failures");
            }
        })
    }
}
