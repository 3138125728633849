//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which sources are queried, timeouts, ranking
//! policy, connection limits and the requester cache. The defaults are
//! tuned for polite scraping of the public catalogue sites.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::source::expand_template;
use crate::types::{SourceKind, MIN_MAX_RESULTS};

/// How records without any query-term overlap are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Keep every record; irrelevant ones simply sort last.
    #[default]
    Loose,
    /// Drop records whose title and description share no word with the query.
    Strict,
}

/// Configuration of a single source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier, reported on every record from this source.
    pub id: String,
    /// Source family; selects the extractor (or the probe strategy).
    pub kind: SourceKind,
    /// URL with a `{query}` placeholder. For [`SourceKind::DirectProbe`] the
    /// placeholder receives each candidate identifier.
    pub url_template: String,
    /// Cap on records taken from this source per request.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    /// Per-source timeout override in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_max_records() -> usize {
    15
}

impl SourceConfig {
    /// Create a source entry with the default record cap.
    pub fn new(id: &str, kind: SourceKind, url_template: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            url_template: url_template.to_string(),
            max_records: default_max_records(),
            timeout_ms: None,
        }
    }
}

/// Built-in sources: three catalogue sites and the direct t.me probe.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "tlgrm",
            SourceKind::Tlgrm,
            "https://tlgrm.eu/channels?search={query}&sort=members",
        ),
        SourceConfig::new(
            "telegramchannels",
            SourceKind::TelegramChannels,
            "https://telegramchannels.me/channels?q={query}",
        ),
        SourceConfig::new(
            "telegram-store",
            SourceKind::TelegramStore,
            "https://telegram-store.com/search?q={query}",
        ),
        SourceConfig {
            max_records: 3,
            ..SourceConfig::new("direct-probe", SourceKind::DirectProbe, "https://t.me/{query}")
        },
    ]
}

/// Configuration for a [`GroupSearch`](crate::GroupSearch) engine.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour. Deserialises from a partial TOML
/// table; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Sources, in merge order.
    pub sources: Vec<SourceConfig>,
    /// Result bound used when a caller does not give one.
    pub default_max_results: usize,
    /// Absolute upper bound on returned records.
    pub hard_ceiling: usize,
    /// Broadening fires when fewer records than this survive the primary pass.
    pub min_results: usize,
    /// Zero-relevance policy.
    pub ranking: RankingMode,
    /// Also drop records whose normalised title was already seen.
    pub dedup_by_title: bool,
    /// Number of page sources (in order) queried with broadened terms.
    pub broaden_source_limit: usize,
    /// Timeout for each page source in milliseconds.
    pub source_timeout_ms: u64,
    /// Timeout for the whole direct-probe strategy in milliseconds.
    pub probe_timeout_ms: u64,
    /// Timeout for a single probe request in milliseconds.
    pub probe_request_timeout_ms: u64,
    /// Maximum number of candidate identifiers probed.
    pub probe_max_candidates: usize,
    /// Deadline for the whole request (primary pass plus broadening).
    pub request_deadline_ms: u64,
    /// Maximum concurrent requests across all hosts.
    pub max_connections: usize,
    /// Maximum concurrent requests to any single host.
    pub max_connections_per_host: usize,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Number of requesters whose last result is kept. 0 disables the cache.
    pub cache_capacity: u64,
    /// How long a cached last result lives, in seconds.
    pub cache_ttl_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            default_max_results: 40,
            hard_ceiling: 40,
            min_results: 3,
            ranking: RankingMode::Loose,
            dedup_by_title: false,
            broaden_source_limit: 2,
            source_timeout_ms: 12_000,
            probe_timeout_ms: 10_000,
            probe_request_timeout_ms: 4_000,
            probe_max_candidates: 6,
            request_deadline_ms: 15_000,
            max_connections: 30,
            max_connections_per_host: 4,
            user_agent: None,
            cache_capacity: 1_000,
            cache_ttl_seconds: 3_600,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - at least one source, with unique non-empty ids
    /// - every template contains `{query}` and expands to an http(s) URL
    /// - every per-source record cap is greater than 0
    /// - all timeouts and connection limits are greater than 0
    /// - `hard_ceiling` is at least the smallest honoured `max_results`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.sources.is_empty() {
            return Err(SearchError::Config(
                "at least one source must be configured".into(),
            ));
        }
        let mut ids = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(SearchError::Config("source id must not be empty".into()));
            }
            if !ids.insert(source.id.as_str()) {
                return Err(SearchError::Config(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            if !source.url_template.contains("{query}") {
                return Err(SearchError::Config(format!(
                    "url_template of '{}' must contain {{query}}",
                    source.id
                )));
            }
            let sample = expand_template(&source.url_template, "probe");
            match url::Url::parse(&sample) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => {
                    return Err(SearchError::Config(format!(
                        "url_template of '{}' is not an http(s) URL",
                        source.id
                    )))
                }
            }
            if source.max_records == 0 {
                return Err(SearchError::Config(format!(
                    "max_records of '{}' must be greater than 0",
                    source.id
                )));
            }
            if source.timeout_ms == Some(0) {
                return Err(SearchError::Config(format!(
                    "timeout_ms of '{}' must be greater than 0",
                    source.id
                )));
            }
        }
        if self.hard_ceiling < MIN_MAX_RESULTS {
            return Err(SearchError::Config(format!(
                "hard_ceiling must be at least {MIN_MAX_RESULTS}"
            )));
        }
        if self.source_timeout_ms == 0
            || self.probe_timeout_ms == 0
            || self.probe_request_timeout_ms == 0
        {
            return Err(SearchError::Config(
                "source timeouts must be greater than 0".into(),
            ));
        }
        if self.request_deadline_ms == 0 {
            return Err(SearchError::Config(
                "request_deadline_ms must be greater than 0".into(),
            ));
        }
        if self.max_connections == 0 || self.max_connections_per_host == 0 {
            return Err(SearchError::Config(
                "connection limits must be greater than 0".into(),
            ));
        }
        if self.probe_max_candidates == 0 {
            return Err(SearchError::Config(
                "probe_max_candidates must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.hard_ceiling, 40);
        assert_eq!(config.min_results, 3);
        assert_eq!(config.ranking, RankingMode::Loose);
        assert!(!config.dedup_by_title);
        assert!(config.request_deadline_ms >= config.source_timeout_ms);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn default_sources_cover_all_families() {
        let sources = default_sources();
        assert_eq!(sources.len(), 4);
        let kinds: Vec<SourceKind> = sources.iter().map(|s| s.kind).collect();
        assert!(kinds.contains(&SourceKind::Tlgrm));
        assert!(kinds.contains(&SourceKind::TelegramChannels));
        assert!(kinds.contains(&SourceKind::TelegramStore));
        assert!(kinds.contains(&SourceKind::DirectProbe));
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_sources_rejected() {
        let config = SearchConfig {
            sources: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("source"));
    }

    #[test]
    fn duplicate_source_ids_rejected() {
        let mut config = SearchConfig::default();
        config.sources[1].id = "tlgrm".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn template_without_placeholder_rejected() {
        let config = SearchConfig {
            sources: vec![SourceConfig::new(
                "broken",
                SourceKind::Generic,
                "https://example.com/search",
            )],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("{query}"));
    }

    #[test]
    fn non_http_template_rejected() {
        let config = SearchConfig {
            sources: vec![SourceConfig::new("ftp", SourceKind::Generic, "ftp://x/{query}")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = SearchConfig {
            source_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SearchConfig {
            request_deadline_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("deadline"));
    }

    #[test]
    fn zero_connection_limits_rejected() {
        let config = SearchConfig {
            max_connections_per_host: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_hard_ceiling_rejected() {
        let config = SearchConfig {
            hard_ceiling: 2,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("hard_ceiling"));
    }

    #[test]
    fn partial_table_fills_defaults() {
        let json = r#"{"min_results": 5, "ranking": "strict"}"#;
        let config: SearchConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.min_results, 5);
        assert_eq!(config.ranking, RankingMode::Strict);
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.max_connections, 30);
    }

    #[test]
    fn source_entry_defaults_record_cap() {
        let json = r#"{"id": "x", "kind": "generic", "url_template": "https://x.org/?q={query}"}"#;
        let source: SourceConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(source.max_records, 15);
        assert!(source.timeout_ms.is_none());
    }
}
