//! Session pool
//!
//! Single authority over session identity, reuse, and teardown. Sessions
//! are created lazily on the first acquire of a key, live for the duration
//! of the crawl run, and are quit exactly once during shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SessionError, ShutdownError};
use crate::session::{SessionDriver, SessionFactory, SessionKey};

/// A session handle as stored and handed out by the pool
pub type PooledSession = Arc<dyn SessionDriver>;

type Slot = Arc<OnceCell<PooledSession>>;

struct PoolState {
    closed: bool,
    slots: HashMap<SessionKey, Slot>,
}

/// A pool of keyed browser sessions.
///
/// At most one session ever exists per key: the first acquire for a key
/// creates it, concurrent acquires for the same key await that creation and
/// share the result. The map lock is held only to look up or insert a slot,
/// never across session creation or teardown.
///
/// The pool does not serialize navigation on a shared session, and a failed
/// navigation does not evict the session; both follow the reference
/// behavior of the surrounding pipeline.
pub struct SessionPool {
    factory: Arc<dyn SessionFactory>,
    state: Mutex<PoolState>,
}

impl SessionPool {
    /// Create an empty pool that provisions sessions with `factory`
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            state: Mutex::new(PoolState {
                closed: false,
                slots: HashMap::new(),
            }),
        }
    }

    /// Return the session stored for `key`, creating and storing it first
    /// if none exists.
    ///
    /// Creation is single-flight per key: when several fetches race on the
    /// same fresh key, exactly one creates the session and the rest await
    /// and reuse it. A creation failure is surfaced to every waiter and
    /// leaves the key unpopulated, so a later acquire may try again.
    ///
    /// Fails with [`SessionError::PoolClosed`] after [`shutdown`].
    ///
    /// [`shutdown`]: SessionPool::shutdown
    #[instrument(skip(self), fields(key = %key))]
    pub async fn acquire(&self, key: &SessionKey) -> Result<PooledSession> {
        let slot = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(SessionError::PoolClosed.into());
            }
            state
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let session = slot
            .get_or_try_init(|| async {
                debug!("creating session");
                self.factory.create(key).await
            })
            .await?;
        let session = Arc::clone(session);

        // Shutdown may have drained the map while creation was in flight;
        // a session the sweep never saw must be closed here, not handed out.
        if self.state.lock().await.closed {
            if let Err(e) = session.close().await {
                warn!(key = %key, error = %e, "failed to close session created during shutdown");
            }
            return Err(SessionError::PoolClosed.into());
        }

        Ok(session)
    }

    /// Close every stored session and empty the pool.
    ///
    /// Best-effort: a session that fails to close is logged and collected
    /// into the aggregate [`ShutdownError`], and the sweep continues with
    /// the remaining sessions. Calling this on an empty (or already shut
    /// down) pool is a no-op. Once called, further acquires fail.
    pub async fn shutdown(&self) -> Result<()> {
        let slots = {
            let mut state = self.state.lock().await;
            state.closed = true;
            std::mem::take(&mut state.slots)
        };

        if slots.is_empty() {
            return Ok(());
        }

        info!(sessions = slots.len(), "shutting down session pool");

        let mut failures = Vec::new();
        for (key, slot) in slots {
            // Slots whose creation failed or never finished hold no session
            let Some(session) = slot.get() else { continue };
            if let Err(e) = session.close().await {
                warn!(key = %key, error = %e, "failed to close session");
                failures.push((key, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures }.into())
        }
    }

    /// Number of live sessions currently pooled
    pub async fn len(&self) -> usize {
        self.state
            .lock()
            .await
            .slots
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Whether the pool holds no live sessions
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether a live session is stored under `key`
    pub async fn contains(&self, key: &SessionKey) -> bool {
        self.state
            .lock()
            .await
            .slots
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }
}
