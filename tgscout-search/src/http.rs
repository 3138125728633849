//! Shared HTTP pool with User-Agent rotation and connection bounds.
//!
//! [`HttpPool`] owns the process-wide [`reqwest::Client`] used by every
//! fetch. The client is built lazily on first use and reused afterwards.
//! Concurrency is bounded twice: a global semaphore caps requests in flight
//! across all hosts, and one semaphore per host keeps any single catalogue
//! site from being hammered. [`HttpPool::close`] releases the client and
//! makes every later fetch fail fast.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Realistic browser User-Agent strings, rotated per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] configured for catalogue scraping.
///
/// The client has:
/// - Cookie store enabled (some catalogues set a session cookie first)
/// - Random User-Agent from built-in rotation list (or custom if configured)
/// - Brotli and gzip decompression
/// - At most `max_connections_per_host` idle connections kept per host
///
/// Timeouts are applied per source by the fetch executor, not here.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(config.max_connections_per_host)
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Permits held for the duration of one request. Dropping it frees both
/// the global and the per-host slot.
#[derive(Debug)]
pub struct PoolPermit {
    _total: OwnedSemaphorePermit,
    _host: OwnedSemaphorePermit,
}

/// Lazily-built, explicitly-closed HTTP resource shared by all fetches.
#[derive(Debug)]
pub struct HttpPool {
    config: SearchConfig,
    client: Mutex<Option<reqwest::Client>>,
    total: Arc<Semaphore>,
    per_host: Mutex<HashMap<String, Arc<Semaphore>>>,
    closed: AtomicBool,
}

impl HttpPool {
    /// Create a pool. No client is built until the first request.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            config: config.clone(),
            client: Mutex::new(None),
            total: Arc::new(Semaphore::new(config.max_connections)),
            per_host: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the shared client, building it on first call.
    ///
    /// # Errors
    ///
    /// [`SearchError::Closed`] after [`close`](Self::close), or
    /// [`SearchError::Http`] if the client cannot be built.
    pub fn client(&self) -> Result<reqwest::Client, SearchError> {
        if self.is_closed() {
            return Err(SearchError::Closed);
        }
        let mut slot = lock(&self.client);
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = build_client(&self.config)?;
        tracing::debug!(
            max_connections = self.config.max_connections,
            per_host = self.config.max_connections_per_host,
            "HTTP pool initialised"
        );
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Wait for a global slot and a slot for `host`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Closed`] if the pool is closed while waiting.
    pub async fn acquire(&self, host: &str) -> Result<PoolPermit, SearchError> {
        let host_sem = self.host_semaphore(host)?;
        let total = Arc::clone(&self.total)
            .acquire_owned()
            .await
            .map_err(|_| SearchError::Closed)?;
        let host = host_sem
            .acquire_owned()
            .await
            .map_err(|_| SearchError::Closed)?;
        Ok(PoolPermit {
            _total: total,
            _host: host,
        })
    }

    fn host_semaphore(&self, host: &str) -> Result<Arc<Semaphore>, SearchError> {
        if self.is_closed() {
            return Err(SearchError::Closed);
        }
        let mut hosts = lock(&self.per_host);
        let sem = hosts
            .entry(host.to_ascii_lowercase())
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_connections_per_host)));
        Ok(Arc::clone(sem))
    }

    /// Release the client and refuse further requests.
    ///
    /// Requests already holding permits finish normally; waiters are woken
    /// with [`SearchError::Closed`]. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.total.close();
        for sem in lock(&self.per_host).values() {
            sem.close();
        }
        lock(&self.client).take();
        tracing::debug!("HTTP pool closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether the client has been built yet.
    pub fn is_initialised(&self) -> bool {
        lock(&self.client).is_some()
    }

    /// Free global slots right now.
    pub fn available_permits(&self) -> usize {
        self.total.available_permits()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
