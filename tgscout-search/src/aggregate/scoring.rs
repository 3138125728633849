//! Relevance scoring and stable ranking.
//!
//! Assigns scores based on:
//! - Query terms found in the title (weight 3) and description (weight 1)
//! - Audience size (`+1` above 1 000 members, `+2` above 10 000)
//! - Source quality (from `SourceKind::quality_bonus()`)
//!
//! Formula: `score = 3·|Q∩T| + |Q∩D| + member_bonus + source_bonus`
//!
//! Ties are broken by member count, then by merge order.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::config::RankingMode;
use crate::types::Record;

/// Weight of a query term found in the title.
pub const TITLE_WEIGHT: f64 = 3.0;
/// Weight of a query term found in the description.
pub const DESCRIPTION_WEIGHT: f64 = 1.0;

/// Lower-cased alphanumeric runs of `text`.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Term-overlap part of the score.
pub fn relevance(query_terms: &HashSet<String>, record: &Record) -> f64 {
    let title = tokenize(&record.title);
    let description = tokenize(&record.description);
    let in_title = query_terms.intersection(&title).count();
    let in_description = query_terms.intersection(&description).count();
    TITLE_WEIGHT * in_title as f64 + DESCRIPTION_WEIGHT * in_description as f64
}

/// Bonus for audience size.
pub fn member_bonus(member_count: u64) -> f64 {
    match member_count {
        n if n > 10_000 => 2.0,
        n if n > 1_000 => 1.0,
        _ => 0.0,
    }
}

/// Score every record against `query`, drop irrelevant ones in
/// [`RankingMode::Strict`], and sort.
///
/// `source_bonus` maps a source id to its quality bonus; unknown ids get 0.
/// The sort is stable, so records equal in score and member count keep
/// their input order.
pub fn rank(
    records: Vec<Record>,
    query: &str,
    mode: RankingMode,
    source_bonus: &HashMap<String, f64>,
) -> Vec<Record> {
    let terms = tokenize(query);

    let mut ranked: Vec<Record> = records
        .into_iter()
        .filter_map(|mut record| {
            let relevance = relevance(&terms, &record);
            if mode == RankingMode::Strict && relevance == 0.0 {
                return None;
            }
            let bonus = source_bonus.get(&record.source_id).copied().unwrap_or(0.0);
            record.score = relevance + member_bonus(record.member_count) + bonus;
            Some(record)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.member_count.cmp(&a.member_count))
    });
    ranked
}
