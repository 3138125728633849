//! Selector-profile extraction for structured catalogue pages.
//!
//! A [`SelectorProfile`] lists, in priority order, the CSS selectors that
//! have matched a catalogue's result cards over time. The first container
//! pattern that matches anything on the page wins, so a redesign that
//! breaks one pattern degrades to the next instead of to nothing. Adding a
//! new site shape means adding a row, not a code path.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html, Selector};

use super::{
    element_text, parse_member_count, telegram_link, truncate_description, username_link,
    Extractor,
};
use crate::error::SearchError;
use crate::types::{title_from_link, Record};

/// Ordered selector tables for one catalogue site.
#[derive(Debug, Clone, Copy)]
pub struct SelectorProfile {
    /// Profile name for logs.
    pub name: &'static str,
    /// Result-card patterns, most specific first.
    pub containers: &'static [&'static str],
    /// Title patterns searched inside a card.
    pub titles: &'static [&'static str],
    /// Description patterns searched inside a card.
    pub descriptions: &'static [&'static str],
    /// Whether `/channels/@name`-style catalogue links count as group links.
    pub resolve_usernames: bool,
    /// Whether the link text may serve as title when no title pattern matches.
    pub title_from_anchor: bool,
}

/// tlgrm.eu channel listing.
pub const TLGRM_PROFILE: SelectorProfile = SelectorProfile {
    name: "tlgrm",
    containers: &[
        ".channel-card",
        r#"div[class*="channel"], a[class*="channel"]"#,
        r#"div[class*="group"], a[class*="group"]"#,
        r#"div[class*="item"], a[class*="item"]"#,
    ],
    titles: &[
        r#"h3[class*="title"], h4[class*="title"], div[class*="title"], span[class*="title"]"#,
        r#"[class*="name"]"#,
        "h3, h4",
    ],
    descriptions: &[
        r#"p[class*="desc"], div[class*="desc"], span[class*="desc"]"#,
        r#"[class*="about"]"#,
    ],
    resolve_usernames: true,
    title_from_anchor: false,
};

/// telegramchannels.me listing.
pub const TELEGRAM_CHANNELS_PROFILE: SelectorProfile = SelectorProfile {
    name: "telegramchannels",
    containers: &[
        r#"div[class*="channel"], li[class*="channel"]"#,
        r#"div[class*="group"], li[class*="group"]"#,
        r#"div[class*="result"], li[class*="result"]"#,
    ],
    titles: &[r#"[class*="title"]"#, r#"[class*="name"]"#],
    descriptions: &[
        r#"p[class*="desc"], div[class*="desc"]"#,
        r#"p[class*="summary"], div[class*="summary"]"#,
    ],
    resolve_usernames: false,
    title_from_anchor: true,
};

/// Extractor driven by a [`SelectorProfile`].
#[derive(Debug)]
pub struct ProfileExtractor {
    profile: SelectorProfile,
    source_id: String,
    max_records: usize,
    containers: Vec<Selector>,
    titles: Vec<Selector>,
    descriptions: Vec<Selector>,
    anchor: Selector,
}

impl ProfileExtractor {
    /// Compile the profile's selectors.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if any selector in the profile does
    /// not parse.
    pub fn new(
        profile: SelectorProfile,
        source_id: &str,
        max_records: usize,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            containers: compile(profile.name, profile.containers)?,
            titles: compile(profile.name, profile.titles)?,
            descriptions: compile(profile.name, profile.descriptions)?,
            anchor: Selector::parse("a[href]")
                .map_err(|e| SearchError::Config(format!("invalid anchor selector: {e:?}")))?,
            profile,
            source_id: source_id.to_string(),
            max_records,
        })
    }

    fn link_for<'a>(&self, card: ElementRef<'a>) -> Option<(String, ElementRef<'a>)> {
        if card.value().name() == "a" {
            if let Some(link) = card.value().attr("href").and_then(|h| self.resolve(h)) {
                return Some((link, card));
            }
        }
        card.select(&self.anchor).find_map(|a| {
            a.value()
                .attr("href")
                .and_then(|h| self.resolve(h))
                .map(|link| (link, a))
        })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        telegram_link(href).or_else(|| {
            if self.profile.resolve_usernames {
                username_link(href)
            } else {
                None
            }
        })
    }

    fn card_to_record(&self, card: ElementRef<'_>, link: &str, anchor: ElementRef<'_>) -> Record {
        let title = first_text(card, &self.titles)
            .or_else(|| {
                Some(anchor)
                    .filter(|_| self.profile.title_from_anchor)
                    .map(element_text)
                    .filter(|t| t.chars().count() >= 2)
            })
            .unwrap_or_else(|| title_from_link(link));

        let description = first_text(card, &self.descriptions)
            .map(|d| truncate_description(&d))
            .unwrap_or_default();

        let members = parse_member_count(&element_text(card));

        Record::new(&title, link, &self.source_id)
            .with_description(description)
            .with_members(members)
    }
}

impl Extractor for ProfileExtractor {
    fn name(&self) -> &'static str {
        self.profile.name
    }

    fn extract(&self, page: &str, _query: &str) -> Vec<Record> {
        let document = Html::parse_document(page);

        let Some((pattern, cards)) = self.containers.iter().enumerate().find_map(|(i, sel)| {
            let cards: Vec<ElementRef<'_>> = document.select(sel).collect();
            (!cards.is_empty()).then_some((i, cards))
        }) else {
            tracing::debug!(profile = self.profile.name, "no container pattern matched");
            return Vec::new();
        };

        let linked: Vec<(ElementRef<'_>, Option<(String, ElementRef<'_>)>)> =
            cards.into_iter().map(|card| (card, self.link_for(card))).collect();
        let links_by_node: HashMap<_, &str> = linked
            .iter()
            .filter_map(|(card, found)| found.as_ref().map(|(link, _)| (card.id(), link.as_str())))
            .collect();
        // A match holding a nested match that links elsewhere is a list
        // wrapper. Nested matches without a link (`channel-name` and similar
        // child classes) or with the card's own link do not count.
        let wraps_other_cards = |card: ElementRef<'_>, link: &str| {
            card.descendants()
                .skip(1)
                .filter_map(|node| links_by_node.get(&node.id()))
                .any(|nested| *nested != link)
        };

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (card, found) in &linked {
            let Some((link, anchor)) = found else {
                tracing::trace!(profile = self.profile.name, "card without group link skipped");
                continue;
            };
            if wraps_other_cards(*card, link.as_str()) {
                continue;
            }
            if !seen.insert(link.to_lowercase()) {
                continue;
            }
            records.push(self.card_to_record(*card, link, *anchor));
            if records.len() >= self.max_records {
                break;
            }
        }

        tracing::debug!(
            profile = self.profile.name,
            pattern,
            count = records.len(),
            "profile records extracted"
        );
        records
    }
}

fn first_text(scope: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        scope
            .select(sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

fn compile(profile: &str, patterns: &[&str]) -> Result<Vec<Selector>, SearchError> {
    patterns
        .iter()
        .map(|p| {
            Selector::parse(p).map_err(|e| {
                SearchError::Config(format!("invalid selector {p:?} in profile {profile}: {e:?}"))
            })
        })
        .collect()
}
