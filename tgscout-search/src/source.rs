//! Source descriptors: what to fetch and how to read it.
//!
//! A [`SourceDescriptor`] is built once per configured source when the
//! engine starts and then shared read-only by every concurrent fetch.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::{SearchConfig, SourceConfig};
use crate::error::SearchError;
use crate::extract::{
    Extractor, LinkScanExtractor, ProfileExtractor, TELEGRAM_CHANNELS_PROFILE, TLGRM_PROFILE,
};
use crate::types::SourceKind;

/// Substitute the form-encoded `query` into `template`'s `{query}` slot.
///
/// Spaces become `+`, everything outside the unreserved set is
/// percent-encoded.
pub fn expand_template(template: &str, query: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    template.replace("{query}", &encoded)
}

/// Settings of the direct-probe strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Timeout for each HEAD request.
    pub request_timeout: Duration,
    /// Maximum number of candidate identifiers derived from the query.
    pub max_candidates: usize,
}

/// How a descriptor turns a query into records.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// GET the expanded template and run the extractor over the body.
    Page(Arc<dyn Extractor>),
    /// HEAD `template(candidate)` for identifiers derived from the query.
    Probe(ProbeSettings),
}

/// Immutable description of one source.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Stable id, copied onto every record.
    pub id: String,
    /// Source family.
    pub kind: SourceKind,
    /// URL with a `{query}` placeholder.
    pub url_template: String,
    /// Cap on records taken from one fetch.
    pub max_records: usize,
    /// Budget for the whole fetch, extraction included.
    pub timeout: Duration,
    /// Page fetch or direct probe.
    pub strategy: Strategy,
}

impl SourceDescriptor {
    /// Build a descriptor from its configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the extractor for this kind
    /// cannot be built.
    pub fn from_config(source: &SourceConfig, config: &SearchConfig) -> Result<Self, SearchError> {
        let (strategy, default_timeout) = match source.kind {
            SourceKind::Tlgrm => (
                Strategy::Page(Arc::new(ProfileExtractor::new(
                    TLGRM_PROFILE,
                    &source.id,
                    source.max_records,
                )?)),
                config.source_timeout_ms,
            ),
            SourceKind::TelegramChannels => (
                Strategy::Page(Arc::new(ProfileExtractor::new(
                    TELEGRAM_CHANNELS_PROFILE,
                    &source.id,
                    source.max_records,
                )?)),
                config.source_timeout_ms,
            ),
            SourceKind::TelegramStore | SourceKind::Generic => (
                Strategy::Page(Arc::new(LinkScanExtractor::new(
                    &source.id,
                    source.max_records,
                )?)),
                config.source_timeout_ms,
            ),
            SourceKind::DirectProbe => (
                Strategy::Probe(ProbeSettings {
                    request_timeout: Duration::from_millis(config.probe_request_timeout_ms),
                    max_candidates: config.probe_max_candidates,
                }),
                config.probe_timeout_ms,
            ),
        };

        Ok(Self {
            id: source.id.clone(),
            kind: source.kind,
            url_template: source.url_template.clone(),
            max_records: source.max_records,
            timeout: Duration::from_millis(source.timeout_ms.unwrap_or(default_timeout)),
            strategy,
        })
    }

    /// URL for `query`.
    pub fn url_for(&self, query: &str) -> String {
        expand_template(&self.url_template, query)
    }

    /// Whether this descriptor fetches a page.
    pub fn is_page(&self) -> bool {
        matches!(self.strategy, Strategy::Page(_))
    }

    /// Origin of the template with a trailing slash, sent as `Referer`.
    pub fn referer(&self) -> Option<String> {
        let url = Url::parse(&self.url_for("")).ok()?;
        let origin = url.origin();
        origin
            .is_tuple()
            .then(|| format!("{}/", origin.ascii_serialization()))
    }
}

/// Build descriptors for every configured source, in configuration order.
///
/// # Errors
///
/// Returns the first [`SearchError::Config`] hit while building.
pub fn build_descriptors(config: &SearchConfig) -> Result<Vec<Arc<SourceDescriptor>>, SearchError> {
    config
        .sources
        .iter()
        .map(|source| SourceDescriptor::from_config(source, config).map(Arc::new))
        .collect()
}

/// Host part of `url`, lower-cased.
pub(crate) fn host_of(url: &str) -> Result<String, SearchError> {
    let parsed = Url::parse(url).map_err(|e| SearchError::Http(format!("invalid URL {url}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| SearchError::Http(format!("URL without host: {url}")))
}
