//! Record deduplication by link identity.
//!
//! Two records describe the same group when their identity keys match. The
//! key ignores case, scheme, query string, fragment and trailing slash, and
//! for Telegram links reduces to the bare identifier, so `https://t.me/Foo/`
//! and `t.me/foo` collide. The first record seen for a key wins, which keeps
//! the merge order meaningful.

use std::collections::HashSet;

use crate::extract::{collapse_whitespace, is_telegram_host};
use crate::types::Record;

/// Normalised identity of a link.
pub fn identity_key(link: &str) -> String {
    let lower = link.trim().to_lowercase();
    let base = lower
        .split(['?', '#'])
        .next()
        .unwrap_or(&lower)
        .trim_end_matches('/');
    let rest = base
        .strip_prefix("https:")
        .or_else(|| base.strip_prefix("http:"))
        .unwrap_or(base)
        .trim_start_matches('/');

    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    if is_telegram_host(host) {
        let path = path.strip_prefix("s/").unwrap_or(path);
        let path = path.trim_start_matches('@');
        if !path.is_empty() {
            return path.to_string();
        }
    }
    rest.to_string()
}

/// Keep the first record per identity key, preserving order.
///
/// With `by_title`, a record is also dropped when its whitespace-collapsed,
/// lower-cased title was already seen.
pub fn deduplicate(records: Vec<Record>, by_title: bool) -> Vec<Record> {
    let mut links = HashSet::new();
    let mut titles = HashSet::new();

    records
        .into_iter()
        .filter(|record| {
            if !links.insert(identity_key(&record.link)) {
                return false;
            }
            !by_title || titles.insert(collapse_whitespace(&record.title).to_lowercase())
        })
        .collect()
}
