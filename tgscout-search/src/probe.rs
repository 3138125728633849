//! Direct probe: guess public identifiers from the query and check that
//! they exist.
//!
//! Catalogues only list groups somebody submitted. A query like
//! `"rust jobs"` often names a public group directly (`rustjobs`,
//! `rust_jobs`), so the probe derives a handful of candidate identifiers and
//! issues a HEAD request for each. Any 2xx or 3xx answer counts as a hit.

use tokio::time::Instant;

use crate::error::SearchError;
use crate::extract::telegram_link;
use crate::http::HttpPool;
use crate::source::{expand_template, host_of, ProbeSettings, SourceDescriptor};
use crate::types::Record;

/// Shortest public identifier Telegram accepts.
pub const MIN_IDENTIFIER_CHARS: usize = 5;
/// Longest public identifier Telegram accepts.
pub const MAX_IDENTIFIER_CHARS: usize = 32;

const SUFFIXES: &[&str] = &["group", "chat", "_group", "_chat"];

/// Candidate identifiers for `query`, most likely first.
///
/// Each word is reduced to `[a-z0-9_]` first; a query with nothing left
/// yields no candidates. Order: words joined, words joined with `_`, then
/// the joined form with each suffix. Candidates must start with a letter and
/// fit the identifier length rule. At most `max` distinct candidates are
/// returned.
pub fn candidates(query: &str, max: usize) -> Vec<String> {
    let lower = query.trim().to_lowercase();
    let words: Vec<String> = lower
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();
    if words.is_empty() {
        return Vec::new();
    }
    let joined = words.concat();
    let underscored = words.join("_");

    let mut raw = vec![joined.clone(), underscored];
    raw.extend(SUFFIXES.iter().map(|suffix| format!("{joined}{suffix}")));

    let mut out: Vec<String> = Vec::new();
    for candidate in raw {
        let starts_with_letter = candidate.starts_with(|c: char| c.is_ascii_lowercase());
        let len = candidate.len();
        if !starts_with_letter || !(MIN_IDENTIFIER_CHARS..=MAX_IDENTIFIER_CHARS).contains(&len) {
            continue;
        }
        if out.contains(&candidate) {
            continue;
        }
        out.push(candidate);
        if out.len() >= max {
            break;
        }
    }
    out
}

/// Probe candidates for `query` one after another until `budget`.
///
/// Stops after `descriptor.max_records` hits. Each request is bounded by
/// the per-request timeout and by what is left of `budget`; once the budget
/// is spent the hits found so far are returned. Errors on individual
/// candidates are logged and skipped.
///
/// # Errors
///
/// Returns [`SearchError::Closed`] if the pool is shut down, or
/// [`SearchError::Http`] if every probed candidate failed or timed out.
pub async fn probe(
    pool: &HttpPool,
    descriptor: &SourceDescriptor,
    settings: ProbeSettings,
    query: &str,
    budget: Instant,
) -> Result<Vec<Record>, SearchError> {
    let mut records = Vec::new();
    let mut attempted = 0usize;
    let mut failed = 0usize;

    for candidate in candidates(query, settings.max_candidates) {
        let remaining = budget.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::debug!(source = %descriptor.id, hits = records.len(), "probe budget spent");
            break;
        }
        attempted += 1;

        let url = expand_template(&descriptor.url_template, &candidate);
        let limit = settings.request_timeout.min(remaining);
        match tokio::time::timeout(limit, head(pool, &url)).await {
            Ok(Ok(true)) => {
                tracing::debug!(source = %descriptor.id, %candidate, "probe hit");
                let link = telegram_link(&url).unwrap_or_else(|| url.clone());
                records.push(Record::new(&format!("@{candidate}"), &link, &descriptor.id));
                if records.len() >= descriptor.max_records {
                    break;
                }
            }
            Ok(Ok(false)) => {
                tracing::trace!(source = %descriptor.id, %candidate, "probe miss");
            }
            Ok(Err(SearchError::Closed)) => return Err(SearchError::Closed),
            Ok(Err(e)) => {
                failed += 1;
                tracing::debug!(source = %descriptor.id, %candidate, error = %e, "probe failed");
            }
            Err(_) => {
                failed += 1;
                tracing::debug!(source = %descriptor.id, %candidate, "probe timed out");
            }
        }
    }

    if attempted > 0 && failed == attempted {
        return Err(SearchError::Http(format!(
            "{}: none of {attempted} probes answered",
            descriptor.id
        )));
    }
    Ok(records)
}

/// HEAD `url`; `true` for 2xx and 3xx.
async fn head(pool: &HttpPool, url: &str) -> Result<bool, SearchError> {
    let host = host_of(url)?;
    let _permit = pool.acquire(&host).await?;
    let response = pool
        .client()?
        .head(url)
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("probe request failed: {e}")))?;
    let status = response.status();
    Ok(status.is_success() || status.is_redirection())
}
