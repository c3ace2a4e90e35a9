//! Keyword extraction and document-type classification.
//!
//! Both work on plain substring and token statistics; no language model is
//! involved. The document-type table here is independent of the knowledge
//! categorizer in [`crate::knowledge`], which uses its own labels and order.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::DocumentType;

/// Maritime terms tested for presence, in output order.
pub const KEYWORD_VOCABULARY: &[&str] = &[
    "laytime",
    "demurrage",
    "despatch",
    "charter party",
    "bill of lading",
    "vessel",
    "cargo",
    "port",
    "loading",
    "discharge",
    "weather",
    "routing",
    "voyage",
    "freight",
    "bunkers",
    "ballast",
    "draught",
    "tonnage",
    "berth",
    "anchorage",
    "pilot",
    "tug",
    "mooring",
];

pub const MAX_KEYWORDS: usize = 20;
/// Frequency-derived keywords added after the vocabulary hits.
pub const FREQUENT_TOKEN_COUNT: usize = 10;
/// Tokens must be longer than this to be counted.
const MIN_TOKEN_LEN: usize = 3;

static TOKEN_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid regex"));

/// Up to [`MAX_KEYWORDS`] keywords: vocabulary hits first, then the most
/// frequent tokens, deduplicated in encounter order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for term in KEYWORD_VOCABULARY {
        if lower.contains(term) && seen.insert(term.to_string()) {
            keywords.push(term.to_string());
        }
    }

    for token in most_frequent_tokens(&lower, FREQUENT_TOKEN_COUNT) {
        if seen.insert(token.to_string()) {
            keywords.push(token.to_string());
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}

/// The `n` most frequent tokens longer than three characters; ties keep the
/// order of first occurrence.
fn most_frequent_tokens(lower: &str, n: usize) -> Vec<&str> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, token) in TOKEN_SPLIT
        .split(lower)
        .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
        .enumerate()
    {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(token, _, _)| token).collect()
}

/// One row of the document-type table. A rule matches when any content
/// term occurs in the content or any filename term occurs in the filename.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub label: DocumentType,
    pub content_terms: &'static [&'static str],
    pub filename_terms: &'static [&'static str],
}

impl TypeRule {
    fn matches(&self, content_lower: &str, filename_lower: &str) -> bool {
        self.content_terms.iter().any(|t| content_lower.contains(t))
            || self.filename_terms.iter().any(|t| filename_lower.contains(t))
    }
}

/// Ordered; the first matching rule wins.
pub const DOCUMENT_TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        label: DocumentType::CharterParty,
        content_terms: &["charter party"],
        filename_terms: &["charter"],
    },
    TypeRule {
        label: DocumentType::BillOfLading,
        content_terms: &["bill of lading"],
        filename_terms: &["bl"],
    },
    TypeRule {
        label: DocumentType::WeatherReport,
        content_terms: &["weather"],
        filename_terms: &["weather"],
    },
    TypeRule {
        label: DocumentType::VoyageInstructions,
        content_terms: &["voyage"],
        filename_terms: &["voyage"],
    },
    TypeRule {
        label: DocumentType::LaytimeCalculation,
        content_terms: &["laytime", "demurrage"],
        filename_terms: &[],
    },
];

/// Heuristic document type. Falls back to [`DocumentType::GeneralMaritime`].
pub fn classify_document(content: &str, filename: &str) -> DocumentType {
    let content_lower = content.to_lowercase();
    let filename_lower = filename.to_lowercase();
    DOCUMENT_TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&content_lower, &filename_lower))
        .map(|rule| rule.label)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_hits_come_before_frequent_tokens() {
        let text = "Shall shall shall SHALL. The Charterers shall pay demurrage. \
                    Charterers Charterers.";
        let keywords = extract_keywords(text);
        assert_eq!(keywords[0], "demurrage");
        assert_eq!(keywords[1], "shall");
        assert_eq!(keywords[2], "charterers");
        // "demurrage" is both a vocabulary hit and a token; it appears once.
        assert_eq!(keywords.iter().filter(|k| *k == "demurrage").count(), 1);
    }

    #[test]
    fn frequency_ties_keep_first_occurrence() {
        let keywords = extract_keywords("zulu yankee xray zulu yankee xray");
        assert_eq!(keywords, ["zulu", "yankee", "xray"]);
    }

    #[test]
    fn short_tokens_are_ignored() {
        let keywords = extract_keywords("the the the and and for");
        assert!(keywords.is_empty());
    }

    #[test]
    fn keyword_set_is_capped() {
        let mut text = KEYWORD_VOCABULARY.join(" ");
        for i in 0..30 {
            text.push_str(&format!(" token{}", i));
        }
        let keywords = extract_keywords(&text);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(&keywords[..3], &["laytime", "demurrage", "despatch"]);
    }

    #[test]
    fn multi_word_terms_match_case_insensitively() {
        let keywords = extract_keywords("This Charter Party and the Bill of Lading.");
        assert!(keywords.contains(&"charter party".to_string()));
        assert!(keywords.contains(&"bill of lading".to_string()));
    }

    #[test]
    fn classification_follows_rule_order() {
        assert_eq!(
            classify_document("This Charter Party is made on...", "doc.pdf"),
            DocumentType::CharterParty
        );
        assert_eq!(
            classify_document("weather routing advice", "gencon_charter.pdf"),
            DocumentType::CharterParty
        );
        assert_eq!(
            classify_document("Shipped on board, bill of lading no. 4", "scan.pdf"),
            DocumentType::BillOfLading
        );
        // "bl" matches anywhere in the filename.
        assert_eq!(
            classify_document("daily weather", "table.txt"),
            DocumentType::BillOfLading
        );
        assert_eq!(
            classify_document("Heavy WEATHER expected", "noon.txt"),
            DocumentType::WeatherReport
        );
        assert_eq!(
            classify_document("laytime statement", "voyage_orders.txt"),
            DocumentType::VoyageInstructions
        );
        assert_eq!(
            classify_document("Demurrage accrued at USD 12,000 per day", "calc.txt"),
            DocumentType::LaytimeCalculation
        );
        assert_eq!(
            classify_document("Crew list", "crew.txt"),
            DocumentType::GeneralMaritime
        );
    }

    #[test]
    fn laytime_in_filename_alone_does_not_classify() {
        assert_eq!(
            classify_document("nothing relevant", "laytime.txt"),
            DocumentType::GeneralMaritime
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let content = "Voyage instructions for the vessel. Weather permitting.";
        let first = classify_document(content, "orders.txt");
        for _ in 0..5 {
            assert_eq!(classify_document(content, "orders.txt"), first);
        }
        assert_eq!(first, DocumentType::WeatherReport);
    }
}
