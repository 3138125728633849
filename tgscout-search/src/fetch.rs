//! Concurrent, failure-isolated fetching of every source.
//!
//! One future per descriptor is polled through a [`FuturesUnordered`]; no
//! tasks are spawned. Each future carries its own timeout, and the batch as
//! a whole is bounded by the request deadline. A source that fails, times
//! out or is still running at the deadline produces an `Err` outcome; the
//! other sources are unaffected.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tokio::time::Instant;

use crate::error::SearchError;
use crate::http::{random_user_agent, HttpPool};
use crate::probe;
use crate::source::{host_of, SourceDescriptor, Strategy};
use crate::types::Record;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGES: &str = "en-US,en;q=0.9,ru;q=0.8";

/// What one source produced for one query.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    /// Descriptor id.
    pub source_id: String,
    /// Extracted records, or why there are none.
    pub records: Result<Vec<Record>, SearchError>,
}

/// Runs descriptors against the shared [`HttpPool`].
#[derive(Debug, Clone)]
pub struct FetchExecutor {
    pool: Arc<HttpPool>,
    user_agent: Option<String>,
}

impl FetchExecutor {
    /// Create an executor over `pool`. A fixed `user_agent` disables
    /// rotation.
    pub fn new(pool: Arc<HttpPool>, user_agent: Option<String>) -> Self {
        Self { pool, user_agent }
    }

    /// The shared pool.
    pub fn pool(&self) -> &Arc<HttpPool> {
        &self.pool
    }

    /// Fetch every descriptor for `query` concurrently.
    ///
    /// Returns one outcome per descriptor, in descriptor order, once all
    /// have finished or `deadline` has passed. Sources still running at the
    /// deadline are cancelled and reported as [`SearchError::Timeout`].
    pub async fn run(
        &self,
        descriptors: &[Arc<SourceDescriptor>],
        query: &str,
        deadline: Instant,
    ) -> Vec<SourceOutcome> {
        let mut pending: FuturesUnordered<_> = descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| async move {
                (index, self.fetch_source(descriptor, query).await)
            })
            .collect();

        let mut slots: Vec<Option<Result<Vec<Record>, SearchError>>> =
            (0..descriptors.len()).map(|_| None).collect();

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((index, result))) => slots[index] = Some(result),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        unfinished = pending.len(),
                        "request deadline reached, cancelling remaining sources"
                    );
                    break;
                }
            }
        }
        drop(pending);

        descriptors
            .iter()
            .zip(slots)
            .map(|(descriptor, slot)| {
                let records = slot.unwrap_or_else(|| {
                    Err(SearchError::Timeout(format!(
                        "{} cancelled at request deadline",
                        descriptor.id
                    )))
                });
                if let Err(ref e) = records {
                    tracing::warn!(source = %descriptor.id, error = %e, "source failed");
                }
                SourceOutcome {
                    source_id: descriptor.id.clone(),
                    records,
                }
            })
            .collect()
    }

    /// Fetch one descriptor within its own timeout.
    async fn fetch_source(
        &self,
        descriptor: &SourceDescriptor,
        query: &str,
    ) -> Result<Vec<Record>, SearchError> {
        match &descriptor.strategy {
            Strategy::Page(extractor) => {
                let work = async {
                    let page = self.fetch_page(descriptor, query).await?;
                    let mut records = extractor.extract(&page, query);
                    records.truncate(descriptor.max_records);
                    tracing::debug!(
                        source = %descriptor.id,
                        extractor = extractor.name(),
                        count = records.len(),
                        "source answered"
                    );
                    Ok::<_, SearchError>(records)
                };
                tokio::time::timeout(descriptor.timeout, work)
                    .await
                    .map_err(|_| {
                        SearchError::Timeout(format!(
                            "{} did not answer within {} ms",
                            descriptor.id,
                            descriptor.timeout.as_millis()
                        ))
                    })?
            }
            // Bounded internally so hits confirmed before the budget runs
            // out are kept.
            Strategy::Probe(settings) => {
                let budget = Instant::now() + descriptor.timeout;
                probe::probe(&self.pool, descriptor, *settings, query, budget).await
            }
        }
    }

    /// GET the page for `query` and return its body.
    async fn fetch_page(
        &self,
        descriptor: &SourceDescriptor,
        query: &str,
    ) -> Result<String, SearchError> {
        let url = descriptor.url_for(query);
        let host = host_of(&url)?;
        let _permit = self.pool.acquire(&host).await?;

        let ua = match self.user_agent.as_deref() {
            Some(ua) => ua,
            None => random_user_agent(),
        };
        let mut request = self
            .pool
            .client()?
            .get(&url)
            .header(USER_AGENT, ua)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGES);
        if let Some(referer) = descriptor.referer() {
            request = request.header(REFERER, referer);
        }

        tracing::trace!(
            source = %descriptor.id,
            %url,
            free_slots = self.pool.available_permits(),
            "fetching page"
        );
        let response = request
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("{} request failed: {e}", descriptor.id)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                source_id: descriptor.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("{} body read failed: {e}", descriptor.id)))?;
        tracing::trace!(source = %descriptor.id, bytes = body.len(), "page received");
        Ok(body)
    }
}
