//! Session pool tests
//!
//! These tests exercise the pool's reuse, single-flight creation, and
//! shutdown contracts against a fake session factory; no browser needed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use renderfetch::{
    Error, Result, SessionDriver, SessionError, SessionFactory, SessionKey, SessionPool,
};

struct FakeDriver {
    closed: AtomicBool,
    close_fails: bool,
}

impl FakeDriver {
    fn new(close_fails: bool) -> Self {
        Self {
            closed: AtomicBool::new(false),
            close_fails,
        }
    }
}

#[async_trait]
impl SessionDriver for FakeDriver {
    async fn set_implicit_wait(&self, _wait: Duration) -> Result<()> {
        Ok(())
    }

    async fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn evaluate(&self, _script: &str) -> Result<String> {
        Ok("<html></html>".to_string())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        if self.close_fails {
            Err(Error::cdp("tab crashed during close"))
        } else {
            Ok(())
        }
    }
}

struct FakeFactory {
    created: AtomicUsize,
    fail_creation: AtomicBool,
    close_fails_for: Option<SessionKey>,
    create_delay: Duration,
    // When set, create() signals `entered` and parks until `resume` has a permit
    entered: Option<Arc<tokio::sync::Semaphore>>,
    resume: Option<Arc<tokio::sync::Semaphore>>,
    drivers: std::sync::Mutex<Vec<Arc<FakeDriver>>>,
}

impl FakeFactory {
    fn new() -> Self {
        Self {
            created: AtomicUsize::new(0),
            fail_creation: AtomicBool::new(false),
            close_fails_for: None,
            create_delay: Duration::ZERO,
            entered: None,
            resume: None,
            drivers: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn create(&self, key: &SessionKey) -> Result<Arc<dyn SessionDriver>> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        if let Some(entered) = &self.entered {
            entered.add_permits(1);
        }
        if let Some(resume) = &self.resume {
            resume.acquire().await.unwrap().forget();
        }
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(SessionError::CreateFailed("chrome not found".to_string()).into());
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let close_fails = self.close_fails_for.as_ref() == Some(key);
        let driver = Arc::new(FakeDriver::new(close_fails));
        self.drivers.lock().unwrap().push(Arc::clone(&driver));
        Ok(driver)
    }
}

#[tokio::test]
async fn acquire_reuses_session_for_same_key() {
    let factory = Arc::new(FakeFactory::new());
    let pool = SessionPool::new(factory.clone());
    let key = SessionKey::new("chrome", "default");

    let first = pool.acquire(&key).await.unwrap();
    let second = pool.acquire(&key).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.created(), 1);
    assert_eq!(pool.len().await, 1);
}

#[tokio::test]
async fn distinct_keys_get_distinct_sessions() {
    let factory = Arc::new(FakeFactory::new());
    let pool = SessionPool::new(factory.clone());

    let a = pool.acquire(&SessionKey::new("chrome", "default")).await.unwrap();
    let b = pool.acquire(&SessionKey::new("chrome", "profile-2")).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(factory.created(), 2);
    assert_eq!(pool.len().await, 2);
}

#[tokio::test]
async fn concurrent_acquires_create_exactly_one_session() {
    let mut factory = FakeFactory::new();
    factory.create_delay = Duration::from_millis(50);
    let factory = Arc::new(factory);
    let pool = Arc::new(SessionPool::new(factory.clone()));
    let key = SessionKey::new("chrome", "default");

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let pool = Arc::clone(&pool);
        let key = key.clone();
        tasks.push(tokio::spawn(async move { pool.acquire(&key).await }));
    }

    let mut sessions = Vec::new();
    for task in tasks {
        sessions.push(task.await.unwrap().unwrap());
    }

    assert_eq!(factory.created(), 1);
    for session in &sessions[1..] {
        assert!(Arc::ptr_eq(&sessions[0], session));
    }
}

#[tokio::test]
async fn creation_failure_leaves_key_unpopulated() {
    let factory = Arc::new(FakeFactory::new());
    let pool = SessionPool::new(factory.clone());
    let key = SessionKey::new("chrome", "default");

    factory.fail_creation.store(true, Ordering::SeqCst);
    let err = pool.acquire(&key).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Session(SessionError::CreateFailed(_))
    ));
    assert_eq!(pool.len().await, 0);
    assert!(!pool.contains(&key).await);

    // A later acquire may retry and succeed
    factory.fail_creation.store(false, Ordering::SeqCst);
    pool.acquire(&key).await.unwrap();
    assert_eq!(factory.created(), 1);
    assert!(pool.contains(&key).await);
}

#[tokio::test]
async fn shutdown_closes_every_session_and_empties_pool() {
    let factory = Arc::new(FakeFactory::new());
    let pool = SessionPool::new(factory.clone());

    pool.acquire(&SessionKey::new("chrome", "default")).await.unwrap();
    pool.acquire(&SessionKey::new("chrome", "profile-2")).await.unwrap();
    assert_eq!(pool.len().await, 2);

    pool.shutdown().await.unwrap();

    assert!(pool.is_empty().await);
    let drivers = factory.drivers.lock().unwrap();
    assert_eq!(drivers.len(), 2);
    for driver in drivers.iter() {
        assert!(driver.closed.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn shutdown_collects_close_failures_without_aborting() {
    let mut factory = FakeFactory::new();
    factory.close_fails_for = Some(SessionKey::new("chrome", "default"));
    let factory = Arc::new(factory);
    let pool = SessionPool::new(factory.clone());

    pool.acquire(&SessionKey::new("chrome", "default")).await.unwrap();
    pool.acquire(&SessionKey::new("chrome", "profile-2")).await.unwrap();

    let err = pool.shutdown().await.unwrap_err();
    match err {
        Error::Shutdown(shutdown) => {
            assert_eq!(shutdown.failures.len(), 1);
            assert_eq!(shutdown.failures[0].0, SessionKey::new("chrome", "default"));
        }
        other => panic!("expected shutdown error, got {other}"),
    }

    // Both close attempts were made despite the failure
    assert!(pool.is_empty().await);
    let drivers = factory.drivers.lock().unwrap();
    for driver in drivers.iter() {
        assert!(driver.closed.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let factory = Arc::new(FakeFactory::new());
    let pool = SessionPool::new(factory);

    pool.acquire(&SessionKey::new("chrome", "default")).await.unwrap();
    pool.shutdown().await.unwrap();
    pool.shutdown().await.unwrap();
    assert!(pool.is_empty().await);
}

#[tokio::test]
async fn shutdown_of_empty_pool_is_a_noop() {
    let pool = SessionPool::new(Arc::new(FakeFactory::new()));
    pool.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_during_in_flight_creation_closes_the_new_session() {
    let entered = Arc::new(tokio::sync::Semaphore::new(0));
    let resume = Arc::new(tokio::sync::Semaphore::new(0));
    let mut factory = FakeFactory::new();
    factory.entered = Some(Arc::clone(&entered));
    factory.resume = Some(Arc::clone(&resume));
    let factory = Arc::new(factory);
    let pool = Arc::new(SessionPool::new(factory.clone()));

    let acquiring = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.acquire(&SessionKey::new("chrome", "default")).await })
    };

    // Wait until the factory is parked inside create, then shut down
    entered.acquire().await.unwrap().forget();
    pool.shutdown().await.unwrap();

    // Let creation finish: the session must not be handed out, and it must
    // not leak past the (already completed) sweep
    resume.add_permits(1);
    let err = acquiring.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::PoolClosed)));

    assert!(pool.is_empty().await);
    let drivers = factory.drivers.lock().unwrap();
    assert_eq!(drivers.len(), 1);
    assert!(drivers[0].closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn acquire_after_shutdown_fails() {
    let pool = SessionPool::new(Arc::new(FakeFactory::new()));
    pool.shutdown().await.unwrap();

    let err = pool
        .acquire(&SessionKey::new("chrome", "default"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::PoolClosed)));
}
