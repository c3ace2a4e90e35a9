//! Core data models used throughout the knowledge base.
//!
//! These types represent the processed documents, sections, and knowledge
//! entries that flow through the ingestion and retrieval pipeline. The serde
//! representation of [`ProcessedDocument`] is the on-disk record format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of document types assigned at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CharterParty,
    BillOfLading,
    WeatherReport,
    VoyageInstructions,
    LaytimeCalculation,
    #[default]
    GeneralMaritime,
    /// Reported by the external classifier for documents it cannot place.
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CharterParty => "charter_party",
            Self::BillOfLading => "bill_of_lading",
            Self::WeatherReport => "weather_report",
            Self::VoyageInstructions => "voyage_instructions",
            Self::LaytimeCalculation => "laytime_calculation",
            Self::GeneralMaritime => "general_maritime",
            Self::Other => "other",
        }
    }

    /// Parse a label as produced by [`as_str`](Self::as_str).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "charter_party" => Some(Self::CharterParty),
            "bill_of_lading" => Some(Self::BillOfLading),
            "weather_report" => Some(Self::WeatherReport),
            "voyage_instructions" => Some(Self::VoyageInstructions),
            "laytime_calculation" => Some(Self::LaytimeCalculation),
            "general_maritime" => Some(Self::GeneralMaritime),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a section was detected by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Header,
    Clause,
    Paragraph,
}

/// A contiguous, titled span of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    /// Approximate page, see [`crate::segment::LINES_PER_PAGE`].
    pub page: u32,
    #[serde(rename = "type")]
    pub kind: SectionKind,
}

/// Size and timing metadata fixed when a document is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub pages: u32,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

/// The unit of ingestion, persisted as one record per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    pub id: String,
    /// Stored filename, prefixed with the upload time to avoid collisions.
    pub filename: String,
    pub original_name: String,
    pub content: String,
    pub summary: String,
    pub document_type: DocumentType,
    pub metadata: DocumentMetadata,
    pub keywords: Vec<String>,
    pub sections: Vec<Section>,
}

/// Knowledge-entry category, assigned per section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeCategory {
    Laytime,
    Weather,
    Distance,
    CpClause,
    VoyageGuidance,
    General,
}

impl KnowledgeCategory {
    pub const ALL: [KnowledgeCategory; 6] = [
        Self::Laytime,
        Self::Weather,
        Self::Distance,
        Self::CpClause,
        Self::VoyageGuidance,
        Self::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laytime => "laytime",
            Self::Weather => "weather",
            Self::Distance => "distance",
            Self::CpClause => "cp_clause",
            Self::VoyageGuidance => "voyage_guidance",
            Self::General => "general",
        }
    }
}

impl fmt::Display for KnowledgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KnowledgeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}'. Use laytime, weather, distance, cp_clause, voyage_guidance, or general.",
                    s
                )
            })
    }
}

/// A scored, categorized excerpt derived from one document section.
///
/// Never persisted; recomputed from the document's sections on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub category: KnowledgeCategory,
    pub relevance_score: f64,
    pub tags: Vec<String>,
}
