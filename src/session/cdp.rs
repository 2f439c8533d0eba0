//! ChromiumOxide-backed session driver
//!
//! This module owns the concrete automation backend: launching (or
//! connecting to) a browser, holding its CDP event loop, and exposing it
//! through the [`SessionDriver`] interface.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{SessionDriver, SessionFactory, SessionKey};
use crate::config::Config;
use crate::error::{Error, FetchError, Result, SessionError};

/// How the factory obtains browser processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisionMode {
    /// Launch a local headless browser per session
    #[default]
    Local,
    /// Connect to the remote grid endpoint from [`Config::grid_url`]
    Remote,
}

/// A pooled browser session backed by a CDP connection.
///
/// Every session runs with the fixed capability profile: headless, stealth
/// scripts injected, image loading disabled.
pub struct CdpSession {
    id: String,
    key: SessionKey,
    browser: Mutex<Browser>,
    page: Page,
    handler: Mutex<Option<JoinHandle<()>>>,
    wait: RwLock<Duration>,
}

impl CdpSession {
    /// Short id for log correlation
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The key this session was created for
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Run `op` under the current implicit wait bound.
    async fn bounded<T>(
        &self,
        op: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let wait = *self.wait.read().await;
        if wait.is_zero() {
            op.await
        } else {
            tokio::time::timeout(wait, op)
                .await
                .map_err(|_| FetchError::Timeout(wait.as_millis() as u64))?
        }
    }
}

#[async_trait]
impl SessionDriver for CdpSession {
    async fn set_implicit_wait(&self, wait: Duration) -> Result<()> {
        *self.wait.write().await = wait;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(session = %self.id, url, "navigating");
        self.bounded(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| FetchError::Navigation(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn evaluate(&self, script: &str) -> Result<String> {
        self.bounded(async {
            let result = self
                .page
                .evaluate(script)
                .await
                .map_err(|e| FetchError::Extraction(e.to_string()))?;
            let value = result
                .into_value::<String>()
                .map_err(|e| FetchError::Extraction(e.to_string()))?;
            Ok(value)
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        info!(session = %self.id, key = %self.key, "closing session");
        self.browser.lock().await.close().await.map_err(Error::from)?;
        if let Some(handle) = self.handler.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        Ok(())
    }
}

/// Creates [`CdpSession`]s, either by launching local browsers or by
/// connecting to a remote grid.
pub struct CdpSessionFactory {
    config: Config,
    mode: ProvisionMode,
}

impl CdpSessionFactory {
    /// Factory that launches a local headless browser per session
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mode: ProvisionMode::Local,
        }
    }

    /// Factory that provisions sessions from the configured grid endpoint
    pub fn remote(config: Config) -> Self {
        Self {
            config,
            mode: ProvisionMode::Remote,
        }
    }

    /// The provisioning mode this factory uses
    pub fn mode(&self) -> ProvisionMode {
        self.mode
    }

    async fn launch(&self) -> Result<(Browser, chromiumoxide::Handler)> {
        let cdp_config = CdpBrowserConfig::builder()
            // Fixed capability profile: no images, no automation banner
            .arg("--blink-settings=imagesEnabled=false")
            .arg("--disable-blink-features=AutomationControlled")
            .build()
            .map_err(SessionError::ConfigError)?;

        Browser::launch(cdp_config)
            .await
            .map_err(|e| SessionError::CreateFailed(e.to_string()).into())
    }

    async fn connect(&self) -> Result<(Browser, chromiumoxide::Handler)> {
        Browser::connect(&self.config.grid_url)
            .await
            .map_err(|e| {
                SessionError::GridUnreachable {
                    url: self.config.grid_url.clone(),
                    message: e.to_string(),
                }
                .into()
            })
    }
}

/// Tear down a launched browser whose session setup failed, so a failed
/// creation does not leak the process or its event-loop task.
async fn abandon(mut browser: Browser, handler_task: JoinHandle<()>, id: &str) {
    if let Err(e) = browser.close().await {
        warn!(session = %id, error = %e, "failed to close browser after failed setup");
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), handler_task).await;
}

#[async_trait]
impl SessionFactory for CdpSessionFactory {
    #[instrument(skip(self), fields(key = %key))]
    async fn create(&self, key: &SessionKey) -> Result<Arc<dyn SessionDriver>> {
        let (browser, mut handler) = match self.mode {
            ProvisionMode::Local => self.launch().await?,
            ProvisionMode::Remote => self.connect().await?,
        };

        let id = Uuid::new_v4().to_string()[..8].to_string();
        let task_id = id.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    warn!(session = %task_id, "browser handler event error");
                    break;
                }
            }
            debug!(session = %task_id, "browser handler finished");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                abandon(browser, handler_task, &id).await;
                return Err(SessionError::CreateFailed(e.to_string()).into());
            }
        };

        if let Err(e) = super::stealth::apply(&page).await {
            abandon(browser, handler_task, &id).await;
            return Err(SessionError::CreateFailed(e.to_string()).into());
        }

        info!(session = %id, key = %key, mode = ?self.mode, "session created");

        Ok(Arc::new(CdpSession {
            id,
            key: key.clone(),
            browser: Mutex::new(browser),
            page,
            handler: Mutex::new(Some(handler_task)),
            wait: RwLock::new(Duration::ZERO),
        }))
    }
}
