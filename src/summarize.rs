//! Document summaries with a local fallback.
//!
//! The enrichment capability is tried first under a timeout. When it is
//! disabled, fails, or times out, an extractive summary is built from the
//! first qualifying sentences. This fallback never fails, so ingestion can
//! complete with no external service reachable.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::enrichment::Enricher;
use crate::error::CapabilityError;
use crate::models::DocumentType;

/// Returned when the content has no sentence long enough to quote.
pub const FALLBACK_PLACEHOLDER: &str = "Document processed successfully.";

/// Sentences must be longer than this (trimmed) to be quoted.
const MIN_SENTENCE_CHARS: usize = 20;
const SUMMARY_SENTENCES: usize = 3;

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

/// A summary and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// `false` when the extractive fallback produced the text.
    pub enriched: bool,
}

/// Extractive summary: the first three sentences longer than twenty
/// characters, joined with `". "` and closed with a period.
pub fn fallback_summary(content: &str) -> String {
    let sentences: Vec<&str> = SENTENCE_END
        .split(content)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(SUMMARY_SENTENCES)
        .collect();

    if sentences.is_empty() {
        return FALLBACK_PLACEHOLDER.to_string();
    }
    format!("{}.", sentences.join(". "))
}

/// Summarize via `enricher`, falling back to [`fallback_summary`].
pub async fn summarize(
    enricher: &dyn Enricher,
    content: &str,
    doc_type: DocumentType,
    max_tokens: u32,
    timeout: Duration,
) -> Summary {
    let attempt = tokio::time::timeout(timeout, enricher.summarize(content, doc_type, max_tokens))
        .await
        .unwrap_or(Err(CapabilityError::Timeout(timeout.as_secs())));

    match attempt {
        Ok(text) if !text.trim().is_empty() => Summary {
            text,
            enriched: true,
        },
        Ok(_) => {
            warn!(enricher = enricher.name(), "empty summary returned, using fallback");
            local(content)
        }
        Err(CapabilityError::Unavailable) => {
            info!("summarization not configured, using fallback");
            local(content)
        }
        Err(e) => {
            warn!(enricher = enricher.name(), error = %e, "summarization failed, using fallback");
            local(content)
        }
    }
}

fn local(content: &str) -> Summary {
    Summary {
        text: fallback_summary(content),
        enriched: false,
    }
}
