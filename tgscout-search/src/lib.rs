//! # tgscout-search
//!
//! Concurrent discovery of public Telegram groups and channels.
//!
//! This crate finds groups by scraping public catalogue sites directly and
//! by probing `t.me` for identifiers guessed from the query. No API keys,
//! no accounts, no external services.
//!
//! ## Design
//!
//! - Every configured source is fetched concurrently over one shared,
//!   lazily-built HTTP pool with global and per-host connection bounds
//! - Catalogue pages are read with ordered CSS selector profiles, with a
//!   structure-agnostic link scan for irregular sites
//! - Records are deduplicated by link identity, scored for relevance and
//!   stably ranked
//! - When too few records survive, a single broadened pass runs against the
//!   best catalogues
//! - Graceful degradation: a source that fails or times out is logged and
//!   skipped, never fatal
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners: this is a library, not a server
//! - Search queries are logged only at debug level

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod probe;
pub mod source;
pub mod types;

use std::sync::Arc;

pub use cache::RequesterCache;
pub use config::{RankingMode, SearchConfig, SourceConfig};
pub use error::{Result, SearchError};
pub use types::{Record, SearchRequest, SearchResult, SourceKind};

use fetch::FetchExecutor;
use http::HttpPool;
use source::SourceDescriptor;

/// A configured search engine.
///
/// Cheap to share behind an `Arc`; every method takes `&self`. The HTTP
/// pool is built on the first search and released by
/// [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct GroupSearch {
    config: SearchConfig,
    descriptors: Vec<Arc<SourceDescriptor>>,
    executor: FetchExecutor,
    cache: RequesterCache,
}

impl GroupSearch {
    /// Validate `config` and build the engine.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let descriptors = source::build_descriptors(&config)?;
        let pool = Arc::new(HttpPool::new(&config));
        let executor = FetchExecutor::new(pool, config.user_agent.clone());
        let cache = RequesterCache::new(config.cache_capacity, config.cache_ttl_seconds);
        tracing::debug!(
            sources = descriptors.len(),
            requester_cache = cache.is_enabled(),
            "group search engine ready"
        );
        Ok(Self {
            config,
            descriptors,
            executor,
            cache,
        })
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search every source for `query` and return at most `max_results`
    /// ranked records.
    ///
    /// `max_results` is clamped, never rejected. Sources that fail are
    /// skipped; if all fail the result is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] if the trimmed query is outside
    /// the accepted length (no request is sent), or [`SearchError::Closed`]
    /// after [`shutdown`](Self::shutdown).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> tgscout_search::Result<()> {
    /// let engine = tgscout_search::GroupSearch::new(Default::default())?;
    /// let result = engine.search("rust jobs", 10).await?;
    /// for record in &result.records {
    ///     println!("{} {}", record.title, record.link);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(&self, query: &str, max_results: usize) -> Result<SearchResult> {
        if self.executor.pool().is_closed() {
            return Err(SearchError::Closed);
        }
        let request = SearchRequest::new(query, max_results, self.config.hard_ceiling)?;
        tracing::debug!(query = %request.query, max_results = request.max_results, "search");
        Ok(aggregate::run_search(&self.executor, &self.descriptors, &self.config, &request).await)
    }

    /// Like [`search`](Self::search), and remember the result as
    /// `requester`'s last one.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search). Nothing is cached on error.
    pub async fn search_for(
        &self,
        requester: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Arc<SearchResult>> {
        let result = Arc::new(self.search(query, max_results).await?);
        self.cache.insert(requester, Arc::clone(&result)).await;
        Ok(result)
    }

    /// The last result stored for `requester` by
    /// [`search_for`](Self::search_for), if still cached.
    pub async fn last_result(&self, requester: &str) -> Option<Arc<SearchResult>> {
        self.cache.get(requester).await
    }

    /// Release the HTTP pool. Later searches fail with
    /// [`SearchError::Closed`]. Idempotent.
    pub fn shutdown(&self) {
        self.executor.pool().close();
    }
}

/// Build an engine from `config`, run one search, and shut it down.
///
/// # Errors
///
/// [`SearchError::Config`] for an invalid configuration, otherwise same as
/// [`GroupSearch::search`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> tgscout_search::Result<()> {
/// let config = tgscout_search::SearchConfig::default();
/// let result = tgscout_search::search("crypto news", 20, &config).await?;
/// println!("{} groups in {:?}", result.records.len(), result.elapsed);
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, max_results: usize, config: &SearchConfig) -> Result<SearchResult> {
    let engine = GroupSearch::new(config.clone())?;
    let result = engine.search(query, max_results).await;
    engine.shutdown();
    result
}
