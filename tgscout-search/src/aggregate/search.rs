//! The search pipeline: primary fan-out, ranking, broadening, truncation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::fetch::{FetchExecutor, SourceOutcome};
use crate::source::SourceDescriptor;
use crate::types::{Record, SearchRequest, SearchResult};

use super::broaden::broaden_terms;
use super::dedup::deduplicate;
use super::scoring::rank;

/// Run one validated request through the whole pipeline.
///
/// # Pipeline
///
/// 1. Fan out `request.query` to every descriptor under the request deadline
/// 2. Merge successful outcomes in descriptor order
/// 3. Deduplicate by link identity (first seen wins)
/// 4. Score, filter and stably sort
/// 5. If fewer than `config.min_results` remain, fetch broadened terms from
///    the first page sources, append, and repeat 3–4 until the threshold
///    or the deadline is reached
/// 6. Truncate to `request.max_results`
///
/// Source failures are logged by the executor and never fail the search.
pub async fn run_search(
    executor: &FetchExecutor,
    descriptors: &[Arc<SourceDescriptor>],
    config: &SearchConfig,
    request: &SearchRequest,
) -> SearchResult {
    let started = Instant::now();
    let deadline = started + Duration::from_millis(config.request_deadline_ms);
    let bonuses: HashMap<String, f64> = descriptors
        .iter()
        .map(|d| (d.id.clone(), d.kind.quality_bonus()))
        .collect();
    let finish = |records: Vec<Record>| {
        rank(
            deduplicate(records, config.dedup_by_title),
            &request.query,
            config.ranking,
            &bonuses,
        )
    };

    // 1-2. Primary pass.
    let outcomes = executor.run(descriptors, &request.query, deadline).await;
    let sources_attempted = outcomes.len();
    let sources_succeeded = outcomes.iter().filter(|o| o.records.is_ok()).count();
    let mut merged = merge(outcomes);

    // 3-4. Dedup and rank.
    let mut ranked = finish(merged.clone());
    tracing::debug!(
        query = %request.query,
        merged = merged.len(),
        kept = ranked.len(),
        sources_succeeded,
        "primary pass complete"
    );

    // 5. Broaden at most once.
    let broadened = ranked.len() < config.min_results;
    if broadened {
        let page_sources: Vec<Arc<SourceDescriptor>> = descriptors
            .iter()
            .filter(|d| d.is_page())
            .take(config.broaden_source_limit)
            .cloned()
            .collect();

        for term in broaden_terms(&request.query) {
            if page_sources.is_empty() || Instant::now() >= deadline {
                break;
            }
            tracing::debug!(%term, sources = page_sources.len(), "broadening");
            let outcomes = executor.run(&page_sources, &term, deadline).await;
            merged.extend(merge(outcomes));
            ranked = finish(merged.clone());
            if ranked.len() >= config.min_results {
                break;
            }
        }
    }

    // 6. Truncate.
    ranked.truncate(request.max_results);

    let elapsed = started.elapsed();
    tracing::info!(
        count = ranked.len(),
        sources_attempted,
        sources_succeeded,
        broadened,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "search complete"
    );

    SearchResult {
        query: request.query.clone(),
        records: ranked,
        elapsed,
        sources_attempted,
        sources_succeeded,
        broadened,
    }
}

/// Concatenate successful outcomes in the order given.
fn merge(outcomes: Vec<SourceOutcome>) -> Vec<Record> {
    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.records.ok())
        .flatten()
        .collect()
}
