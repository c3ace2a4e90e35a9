//! Knowledge-base entries derived from document sections.
//!
//! Entries are never stored. They are recomputed from a document's sections
//! whenever they are needed, so [`build_knowledge_entries`] is a pure
//! function and entry ids are stable across recomputation.
//!
//! # Scoring
//!
//! ```text
//! relevance = round2(0.6 * min(len / 1000, 1) + 0.4 * keyword_score)
//! keyword_score = matched category keywords / category keyword count
//!               = 0.5 for categories without a keyword list
//! ```

use crate::error::StoreError;
use crate::models::{KnowledgeCategory, KnowledgeEntry, ProcessedDocument};
use crate::store::DocumentStore;

/// Sections with content of this many characters or fewer yield no entry.
pub const MIN_SECTION_CHARS: usize = 50;

/// Content length at which the length component saturates.
const FULL_LENGTH_CHARS: f64 = 1000.0;
const LENGTH_WEIGHT: f64 = 0.6;
const KEYWORD_WEIGHT: f64 = 0.4;
/// Keyword score for categories without a keyword list.
const NEUTRAL_KEYWORD_SCORE: f64 = 0.5;

pub const MAX_TAGS: usize = 5;

/// Tag vocabulary, in output order.
pub const TAG_VOCABULARY: &[&str] = &[
    "maritime",
    "shipping",
    "vessel",
    "cargo",
    "port",
    "navigation",
    "contract",
    "legal",
    "operations",
    "logistics",
    "commercial",
];

/// One row of the categorizer table: any term present selects `category`.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: KnowledgeCategory,
    pub terms: &'static [&'static str],
}

/// Ordered; the first matching rule wins, otherwise `general`.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: KnowledgeCategory::Laytime,
        terms: &["laytime", "demurrage"],
    },
    CategoryRule {
        category: KnowledgeCategory::Weather,
        terms: &["weather", "wind"],
    },
    CategoryRule {
        category: KnowledgeCategory::Distance,
        terms: &["distance", "route"],
    },
    CategoryRule {
        category: KnowledgeCategory::CpClause,
        terms: &["charter", "clause"],
    },
    CategoryRule {
        category: KnowledgeCategory::VoyageGuidance,
        terms: &["voyage", "port"],
    },
];

/// Keywords counted towards the relevance score of each category.
pub fn category_keywords(category: KnowledgeCategory) -> &'static [&'static str] {
    match category {
        KnowledgeCategory::Laytime => &["laytime", "demurrage", "despatch", "loading", "discharge"],
        KnowledgeCategory::Weather => &["weather", "wind", "storm", "forecast", "routing"],
        KnowledgeCategory::Distance => &["distance", "nautical", "route", "passage", "voyage"],
        KnowledgeCategory::CpClause => &["clause", "charter", "party", "terms", "conditions"],
        KnowledgeCategory::VoyageGuidance => &["port", "berth", "pilot", "tug", "mooring"],
        KnowledgeCategory::General => &[],
    }
}

pub fn categorize_section(content: &str) -> KnowledgeCategory {
    let lower = content.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.terms.iter().any(|t| lower.contains(t)))
        .map(|rule| rule.category)
        .unwrap_or(KnowledgeCategory::General)
}

/// Relevance in `[0, 1]`, rounded to two decimals.
pub fn relevance_score(content: &str, category: KnowledgeCategory) -> f64 {
    let length = content.chars().count() as f64;
    let base = (length / FULL_LENGTH_CHARS).min(1.0);

    let keywords = category_keywords(category);
    let keyword_score = if keywords.is_empty() {
        NEUTRAL_KEYWORD_SCORE
    } else {
        let lower = content.to_lowercase();
        let matched = keywords.iter().filter(|k| lower.contains(*k)).count();
        matched as f64 / keywords.len() as f64
    };

    round2(LENGTH_WEIGHT * base + KEYWORD_WEIGHT * keyword_score)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Up to [`MAX_TAGS`] vocabulary tags present in the content.
pub fn section_tags(content: &str) -> Vec<String> {
    let lower = content.to_lowercase();
    TAG_VOCABULARY
        .iter()
        .filter(|tag| lower.contains(*tag))
        .take(MAX_TAGS)
        .map(|tag| tag.to_string())
        .collect()
}

/// Entry id for section `index` of `document_id`.
pub fn entry_id(document_id: &str, index: usize) -> String {
    format!("kb_{}_{}", document_id, index)
}

/// Derive knowledge entries from a document's sections, in section order.
pub fn build_knowledge_entries(doc: &ProcessedDocument) -> Vec<KnowledgeEntry> {
    doc.sections
        .iter()
        .enumerate()
        .filter(|(_, section)| section.content.chars().count() > MIN_SECTION_CHARS)
        .map(|(index, section)| {
            let category = categorize_section(&section.content);
            let title = if section.title.trim().is_empty() {
                format!("Section {}", index + 1)
            } else {
                section.title.clone()
            };
            KnowledgeEntry {
                id: entry_id(&doc.id, index),
                document_id: doc.id.clone(),
                title,
                content: section.content.clone(),
                category,
                relevance_score: relevance_score(&section.content, category),
                tags: section_tags(&section.content),
            }
        })
        .collect()
}

/// Sort by descending relevance; equal scores keep their discovery order.
pub fn rank_entries(entries: &mut [KnowledgeEntry]) {
    entries.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}

/// Entries of every stored document, ranked.
pub async fn knowledge_base(store: &dyn DocumentStore) -> Result<Vec<KnowledgeEntry>, StoreError> {
    let mut entries: Vec<KnowledgeEntry> = store
        .list()
        .await?
        .iter()
        .flat_map(build_knowledge_entries)
        .collect();
    rank_entries(&mut entries);
    Ok(entries)
}

/// Entries of documents matching `query`, optionally restricted to one
/// category, ranked and truncated to `limit`.
pub async fn search_knowledge(
    store: &dyn DocumentStore,
    query: &str,
    category: Option<KnowledgeCategory>,
    limit: usize,
) -> Result<Vec<KnowledgeEntry>, StoreError> {
    let mut entries: Vec<KnowledgeEntry> = store
        .search(query)
        .await?
        .iter()
        .flat_map(build_knowledge_entries)
        .filter(|entry| category.map_or(true, |c| entry.category == c))
        .collect();
    rank_entries(&mut entries);
    entries.truncate(limit);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentMetadata, DocumentType, Section, SectionKind};
    use chrono::Utc;

    fn section(title: &str, content: &str) -> Section {
        Section {
            title: title.to_string(),
            content: content.to_string(),
            page: 1,
            kind: SectionKind::Clause,
        }
    }

    fn doc_with(sections: Vec<Section>) -> ProcessedDocument {
        let now = Utc::now();
        ProcessedDocument {
            id: "doc_test".to_string(),
            filename: "1700000000000_cp.txt".to_string(),
            original_name: "cp.txt".to_string(),
            content: "irrelevant".to_string(),
            summary: String::new(),
            document_type: DocumentType::CharterParty,
            metadata: DocumentMetadata {
                pages: 1,
                size: 10,
                uploaded_at: now,
                processed_at: now,
            },
            keywords: Vec::new(),
            sections,
        }
    }

    #[test]
    fn categorizer_follows_rule_order() {
        assert_eq!(categorize_section("Demurrage in bad weather"), KnowledgeCategory::Laytime);
        assert_eq!(categorize_section("Strong WIND on the route"), KnowledgeCategory::Weather);
        assert_eq!(categorize_section("Distance via Suez"), KnowledgeCategory::Distance);
        assert_eq!(categorize_section("This clause governs the port"), KnowledgeCategory::CpClause);
        assert_eq!(categorize_section("Port of Rotterdam"), KnowledgeCategory::VoyageGuidance);
        assert_eq!(categorize_section("Crew list attached"), KnowledgeCategory::General);
    }

    #[test]
    fn relevance_formula() {
        // 100 chars, 2 of 5 laytime keywords: 0.6 * 0.1 + 0.4 * 0.4 = 0.22
        let content = format!("laytime loading {}", "x".repeat(84));
        assert_eq!(content.chars().count(), 100);
        assert_eq!(relevance_score(&content, KnowledgeCategory::Laytime), 0.22);

        // General uses the neutral keyword score: 0.6 * 1.0 + 0.4 * 0.5 = 0.8
        let long = "y".repeat(2500);
        assert_eq!(relevance_score(&long, KnowledgeCategory::General), 0.8);
    }

    #[test]
    fn relevance_stays_in_unit_interval() {
        let samples = [
            String::new(),
            "laytime demurrage despatch loading discharge".repeat(40),
            "port berth pilot tug mooring".to_string(),
            "z".repeat(10_000),
        ];
        for content in &samples {
            for category in KnowledgeCategory::ALL {
                let score = relevance_score(content, category);
                assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
                assert_eq!(score, relevance_score(content, category));
            }
        }
    }

    #[test]
    fn tags_follow_vocabulary_order_and_cap() {
        let tags = section_tags(
            "Commercial logistics: the vessel, its cargo and the port; \
             navigation under the contract (legal). Maritime shipping operations.",
        );
        assert_eq!(tags, ["maritime", "shipping", "vessel", "cargo", "port"]);
        assert!(section_tags("nothing to see").is_empty());
    }

    #[test]
    fn content_length_threshold_is_strict() {
        let exactly_50 = "a".repeat(50);
        let exactly_51 = "a".repeat(51);
        let doc = doc_with(vec![section("CLAUSE 1", &exactly_50)]);
        assert!(build_knowledge_entries(&doc).is_empty());

        let doc = doc_with(vec![section("CLAUSE 1", &exactly_51)]);
        assert_eq!(build_knowledge_entries(&doc).len(), 1);
    }

    #[test]
    fn entries_carry_stable_ids_and_titles() {
        let weather = "Weather Working Days shall exclude periods of rain, snow or strong wind at the berth.";
        let doc = doc_with(vec![
            section("CLAUSE 1", "short"),
            section("CLAUSE 2", weather),
            section("  ", weather),
        ]);
        let entries = build_knowledge_entries(&doc);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "kb_doc_test_1");
        assert_eq!(entries[0].document_id, "doc_test");
        assert_eq!(entries[0].title, "CLAUSE 2");
        assert_eq!(entries[0].category, KnowledgeCategory::Weather);
        assert_eq!(entries[1].id, "kb_doc_test_2");
        assert_eq!(entries[1].title, "Section 3");
    }

    #[test]
    fn building_entries_is_idempotent() {
        let doc = doc_with(vec![
            section("LAYTIME", &"Laytime for loading shall be 72 running hours. ".repeat(3)),
            section("PORTS", &"Safe port always afloat, one safe berth. ".repeat(3)),
        ]);
        assert_eq!(build_knowledge_entries(&doc), build_knowledge_entries(&doc));
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let doc = doc_with(vec![
            section("A", &"g".repeat(60)),
            section("B", &"laytime demurrage despatch loading discharge ".repeat(30)),
            section("C", &"h".repeat(60)),
        ]);
        let mut entries = build_knowledge_entries(&doc);
        rank_entries(&mut entries);
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["B", "A", "C"]);
        assert_eq!(entries[1].relevance_score, entries[2].relevance_score);
    }
}
