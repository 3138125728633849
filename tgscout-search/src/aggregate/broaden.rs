//! Broadened query terms for the fallback pass.

use crate::types::MIN_QUERY_CHARS;

/// Terms tried when the primary pass found too little, in order.
///
/// The first word (multi-word queries only), then `"<q> group"`,
/// `"<q> channel"` and `"telegram <q>"`. Terms equal to the query (ignoring
/// case) or too short to be a valid query are skipped.
pub fn broaden_terms(query: &str) -> Vec<String> {
    let query = query.trim();
    let mut terms = Vec::new();

    let mut words = query.split_whitespace();
    if let (Some(first), Some(_)) = (words.next(), words.next()) {
        terms.push(first.to_string());
    }
    terms.push(format!("{query} group"));
    terms.push(format!("{query} channel"));
    terms.push(format!("telegram {query}"));

    let lowered = query.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        if term.chars().count() < MIN_QUERY_CHARS || term.to_lowercase() == lowered {
            continue;
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(&term)) {
            out.push(term);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_query_starts_with_first_word() {
        assert_eq!(
            broaden_terms("crypto news"),
            [
                "crypto",
                "crypto news group",
                "crypto news channel",
                "telegram crypto news"
            ]
        );
    }

    #[test]
    fn single_word_query_skips_first_word_term() {
        assert_eq!(
            broaden_terms("crypto"),
            ["crypto group", "crypto channel", "telegram crypto"]
        );
    }

    #[test]
    fn short_first_word_skipped() {
        assert_eq!(
            broaden_terms("a bc"),
            ["a bc group", "a bc channel", "telegram a bc"]
        );
    }

    #[test]
    fn terms_never_repeat_the_query() {
        for term in broaden_terms("Telegram group") {
            assert!(!term.eq_ignore_ascii_case("telegram group"));
        }
    }
}
