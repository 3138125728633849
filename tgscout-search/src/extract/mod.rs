//! Record extraction from catalogue pages.
//!
//! Every page-fetching source pairs with an [`Extractor`]. Two variants
//! exist: [`ProfileExtractor`], driven by an ordered table of candidate CSS
//! selectors per catalogue site, and [`LinkScanExtractor`], which ignores
//! page structure and collects every Telegram link in the document.
//!
//! Extractors never touch the network and never fail as a whole: an element
//! that cannot be turned into a [`Record`] is skipped.

pub mod link_scan;
pub mod profile;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::types::Record;

pub use link_scan::LinkScanExtractor;
pub use profile::{ProfileExtractor, SelectorProfile, TELEGRAM_CHANNELS_PROFILE, TLGRM_PROFILE};

/// Longest description kept, in characters, before the ellipsis.
pub const DESCRIPTION_MAX_CHARS: usize = 100;

/// Turns one fetched page into records.
pub trait Extractor: Send + Sync + fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Extract records from `page`. `query` is the text the page was
    /// fetched for.
    fn extract(&self, page: &str, query: &str) -> Vec<Record>;
}

/// Hosts that serve Telegram groups and channels by identifier.
const TELEGRAM_HOSTS: &[&str] = &["t.me", "telegram.me", "telegram.dog"];

/// First path segments on t.me that are not groups.
const NON_GROUP_PATHS: &[&str] = &[
    "share",
    "addstickers",
    "addemoji",
    "addtheme",
    "iv",
    "proxy",
    "socks",
    "setlanguage",
];

static TELEGRAM_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?:)?(?://)?(?:www\.)?(t\.me|telegram\.me|telegram\.dog)/([^?#\s]+)")
        .unwrap_or_else(|e| panic!("invalid telegram link pattern: {e}"))
});

static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([A-Za-z][A-Za-z0-9_]{4,31})$")
        .unwrap_or_else(|e| panic!("invalid username pattern: {e}"))
});

static MEMBER_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:[,.\s]\d{3})+|\d+)\s*(?:members?|subscribers?|subs\b|membres?|abonn[ée]s?|участник|подписчик)",
    )
    .unwrap_or_else(|e| panic!("invalid member count pattern: {e}"))
});

/// Canonicalise an href pointing at a Telegram group.
///
/// Returns `https://t.me/<path>` for `t.me`, `telegram.me` and
/// `telegram.dog` links with or without scheme. The `s/` web-preview prefix
/// and a leading `@` are removed; query and fragment are dropped. Returns
/// `None` for anything else, including t.me service paths like `share/`.
pub fn telegram_link(href: &str) -> Option<String> {
    let caps = TELEGRAM_LINK.captures(href.trim())?;
    let path = caps.get(2)?.as_str().trim_end_matches('/');
    let path = path.strip_prefix("s/").unwrap_or(path);
    let path = path.trim_start_matches('@');
    let first = path.split('/').next().unwrap_or(path);
    if first.is_empty() || NON_GROUP_PATHS.contains(&first.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some(format!("https://t.me/{path}"))
}

/// Whether `host` is one of the Telegram hosts.
pub fn is_telegram_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    TELEGRAM_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host))
}

/// Resolve a catalogue-relative href such as `/channels/@durov` or `@durov`
/// to a t.me link when its last segment is an `@`-prefixed public username.
pub fn username_link(href: &str) -> Option<String> {
    let trimmed = href.split(['?', '#']).next().unwrap_or(href);
    let segment = trimmed.trim_end_matches('/').rsplit('/').next()?;
    let caps = USERNAME.captures(segment)?;
    Some(format!("https://t.me/{}", caps.get(1)?.as_str()))
}

/// Parse a member count from free text such as `"12,345 members"`.
///
/// Grouping separators inside the number are ignored. Returns 0 when no
/// `<number> <members-word>` pair is found.
pub fn parse_member_count(text: &str) -> u64 {
    MEMBER_COUNT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Bound a description to [`DESCRIPTION_MAX_CHARS`], appending `...` when cut.
pub fn truncate_description(text: &str) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() > DESCRIPTION_MAX_CHARS {
        let cut: String = text.chars().take(DESCRIPTION_MAX_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        text
    }
}

/// Visible text of an element, whitespace-collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}
