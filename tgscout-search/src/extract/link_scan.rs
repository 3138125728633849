//! Structure-agnostic extraction: every Telegram link on the page.
//!
//! Used for catalogues whose markup is too irregular for a selector
//! profile. The anchor text becomes the title; description and member
//! count are read from the nearest block-level ancestor.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use super::{element_text, parse_member_count, telegram_link, truncate_description, Extractor};
use crate::error::SearchError;
use crate::types::{title_from_link, Record};

/// Ancestors searched for description and member count, nearest first.
const CONTEXT_TAGS: &[&str] = &["div", "li", "article", "section", "tr"];

/// Extracts a record for each distinct Telegram link in a document.
#[derive(Debug)]
pub struct LinkScanExtractor {
    source_id: String,
    max_records: usize,
    anchor: Selector,
    description: Selector,
}

impl LinkScanExtractor {
    /// Create a scanner reporting records as `source_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the built-in selectors fail to
    /// parse.
    pub fn new(source_id: &str, max_records: usize) -> Result<Self, SearchError> {
        let parse = |s: &str| {
            Selector::parse(s)
                .map_err(|e| SearchError::Config(format!("invalid link scan selector {s:?}: {e:?}")))
        };
        Ok(Self {
            source_id: source_id.to_string(),
            max_records,
            anchor: parse("a[href]")?,
            description: parse(r#"[class*="desc"], [class*="about"], [class*="summary"]"#)?,
        })
    }

    fn context<'a>(&self, anchor: ElementRef<'a>) -> Option<ElementRef<'a>> {
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| CONTEXT_TAGS.contains(&el.value().name()))
    }
}

impl Extractor for LinkScanExtractor {
    fn name(&self) -> &'static str {
        "link-scan"
    }

    fn extract(&self, page: &str, _query: &str) -> Vec<Record> {
        let document = Html::parse_document(page);
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for anchor in document.select(&self.anchor) {
            let Some(link) = anchor.value().attr("href").and_then(telegram_link) else {
                continue;
            };
            if !seen.insert(link.to_ascii_lowercase()) {
                continue;
            }

            let text = element_text(anchor);
            let title = if text.chars().count() >= 2 {
                text
            } else {
                title_from_link(&link)
            };

            let (description, members) = match self.context(anchor) {
                Some(block) => (
                    block
                        .select(&self.description)
                        .map(element_text)
                        .find(|t| !t.is_empty())
                        .map(|d| truncate_description(&d))
                        .unwrap_or_default(),
                    parse_member_count(&element_text(block)),
                ),
                None => (String::new(), 0),
            };

            records.push(
                Record::new(&title, &link, &self.source_id)
                    .with_description(description)
                    .with_members(members),
            );
            if records.len() >= self.max_records {
                break;
            }
        }

        tracing::debug!(
            source = %self.source_id,
            count = records.len(),
            "link scan records extracted"
        );
        records
    }
}
