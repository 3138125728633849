//! Plain-text rendering of search results for chat-style transports.
//!
//! Transports cap message size, so a result is split into several
//! messages: at most `records_per_message` records each, and never more
//! than `max_message_chars` characters. Record order is preserved across
//! messages.

use tgscout_search::{Record, SearchResult};

use crate::config::RenderConfig;

/// Longest title shown, in characters.
pub const TITLE_MAX_CHARS: usize = 50;
/// Longest description shown, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 80;

/// Render `result` as one or more messages.
///
/// An empty result renders as the single [`render_no_results`] message.
pub fn render_result(result: &SearchResult, config: &RenderConfig) -> Vec<String> {
    if result.is_empty() {
        return vec![render_no_results(&result.query)];
    }

    let max_chars = config.max_message_chars;
    let per_message = config.records_per_message.max(1);

    let header = format!(
        "🎯 Results for '{}'\n📊 {} groups found in {:.1}s\n\n",
        result.query,
        result.records.len(),
        result.elapsed.as_secs_f64()
    );

    let mut messages = Vec::new();
    let mut current = truncate_chars(&header, max_chars);
    let mut in_current = 0usize;

    for (i, record) in result.records.iter().enumerate() {
        let block = truncate_chars(&render_record(i + 1, record), max_chars);
        let fits = current.chars().count() + block.chars().count() <= max_chars;
        if in_current > 0 && (in_current >= per_message || !fits) {
            messages.push(std::mem::take(&mut current));
            in_current = 0;
        } else if in_current == 0 && !fits {
            // Header and first block do not fit together.
            messages.push(std::mem::take(&mut current));
        }
        current.push_str(&block);
        in_current += 1;
    }
    if !current.is_empty() {
        messages.push(current);
    }

    messages
        .into_iter()
        .map(|m| m.trim_end().to_owned())
        .filter(|m| !m.is_empty())
        .collect()
}

/// Message sent when nothing was found.
pub fn render_no_results(query: &str) -> String {
    format!(
        "❌ No groups found for '{query}'.\n\n\
         💡 Try:\n\
         • different keywords\n\
         • more general terms\n\
         • English words"
    )
}

/// Message sent when the query was rejected.
pub fn render_invalid_query(reason: &str) -> String {
    format!("❌ {reason}\n\nExample: /search crypto")
}

fn render_record(index: usize, record: &Record) -> String {
    let icon = if record.source_id.starts_with("tlgrm") {
        "🔷"
    } else {
        "🔹"
    };
    let members = if record.member_count > 0 {
        format!(" • {} members", record.member_count)
    } else {
        String::new()
    };

    let mut block = format!(
        "{icon} {index}. {}{members}\n🔗 {}\n",
        truncate_chars(&record.title, TITLE_MAX_CHARS),
        record.link
    );
    if !record.description.is_empty() {
        block.push_str(&format!(
            "📝 {}\n",
            truncate_chars(&record.description, DESCRIPTION_MAX_CHARS)
        ));
    }
    block.push('\n');
    block
}

/// Cut `text` to `max` characters, marking the cut with `...` inside the
/// limit.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
