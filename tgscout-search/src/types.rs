//! Core types: discovered records, source kinds, requests and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::SearchError;

/// Minimum query length (in characters, after trimming).
pub const MIN_QUERY_CHARS: usize = 2;
/// Maximum query length (in characters, after trimming).
pub const MAX_QUERY_CHARS: usize = 50;
/// Smallest `max_results` honoured; lower values are raised to this.
pub const MIN_MAX_RESULTS: usize = 3;
/// Largest `max_results` honoured; higher values are lowered to this.
pub const MAX_MAX_RESULTS: usize = 40;

/// One discovered group or channel candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Display name. Never empty: derived from the link when the source
    /// gave none.
    pub title: String,
    /// Canonical link to the group; the unit of identity.
    pub link: String,
    /// Short description, empty when the source had none.
    pub description: String,
    /// Member/subscriber count, 0 when unknown.
    pub member_count: u64,
    /// Id of the source that produced this record.
    pub source_id: String,
    /// Relevance score assigned by the aggregator.
    pub score: f64,
}

impl Record {
    /// Build a record with no description and unknown member count.
    ///
    /// An empty (or whitespace-only) `title` is replaced by the trailing
    /// path segment of `link`.
    pub fn new(title: &str, link: &str, source_id: &str) -> Self {
        let title = title.trim();
        let title = if title.is_empty() {
            title_from_link(link)
        } else {
            title.to_string()
        };
        Self {
            title,
            link: link.to_string(),
            description: String::new(),
            member_count: 0,
            source_id: source_id.to_string(),
            score: 0.0,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Set the member count.
    pub fn with_members(mut self, member_count: u64) -> Self {
        self.member_count = member_count;
        self
    }
}

/// Trailing path segment of a link, without any leading `@`.
///
/// Falls back to the whole link when it has no usable segment.
pub fn title_from_link(link: &str) -> String {
    let trimmed = link
        .split(['?', '#'])
        .next()
        .unwrap_or(link)
        .trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let segment = segment.trim_start_matches('@');
    if segment.is_empty() {
        link.to_string()
    } else {
        segment.to_string()
    }
}

/// Source families the engine knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// tlgrm.eu channel catalogue.
    Tlgrm,
    /// telegramchannels.me catalogue.
    TelegramChannels,
    /// telegram-store.com search.
    TelegramStore,
    /// Any other page, read with the generic link scanner.
    Generic,
    /// Probes `t.me/<candidate>` directly instead of scraping a page.
    DirectProbe,
}

impl SourceKind {
    /// Returns the human-readable name of this source family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tlgrm => "TLGRM.eu",
            Self::TelegramChannels => "TelegramChannels.me",
            Self::TelegramStore => "Telegram-Store",
            Self::Generic => "Generic",
            Self::DirectProbe => "Direct probe",
        }
    }

    /// Fixed ranking bonus for records from this family.
    ///
    /// Curated catalogues score above raw link scans; probe hits only prove
    /// that a name exists and get nothing.
    pub fn quality_bonus(&self) -> f64 {
        match self {
            Self::Tlgrm => 1.0,
            Self::TelegramChannels => 0.5,
            Self::TelegramStore | Self::Generic | Self::DirectProbe => 0.0,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Trimmed query text.
    pub query: String,
    /// Result bound after clamping.
    pub max_results: usize,
}

impl SearchRequest {
    /// Validate `query` and clamp `max_results` into
    /// [`MIN_MAX_RESULTS`]..=[`MAX_MAX_RESULTS`] and `hard_ceiling`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] if the trimmed query is shorter
    /// than [`MIN_QUERY_CHARS`] or longer than [`MAX_QUERY_CHARS`].
    pub fn new(query: &str, max_results: usize, hard_ceiling: usize) -> Result<Self, SearchError> {
        let query = query.trim();
        let chars = query.chars().count();
        if chars < MIN_QUERY_CHARS {
            return Err(SearchError::InvalidQuery(format!(
                "query must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        if chars > MAX_QUERY_CHARS {
            return Err(SearchError::InvalidQuery(format!(
                "query must be at most {MAX_QUERY_CHARS} characters"
            )));
        }
        let max_results = max_results
            .clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS)
            .min(hard_ceiling);
        Ok(Self {
            query: query.to_string(),
            max_results,
        })
    }
}

/// The outcome of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The trimmed query that was searched.
    pub query: String,
    /// Ranked, deduplicated records; at most the requested bound.
    pub records: Vec<Record>,
    /// Wall-clock time spent on the search.
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,
    /// Sources contacted in the primary pass.
    pub sources_attempted: usize,
    /// Sources in the primary pass that answered without error.
    pub sources_succeeded: usize,
    /// Whether the broadening fallback ran.
    pub broadened: bool,
}

impl SearchResult {
    /// Returns `true` when nothing was found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
