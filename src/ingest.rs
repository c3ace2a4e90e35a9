//! Ingestion pipeline orchestration.
//!
//! Coordinates the full flow for one upload: extraction → segmentation and
//! keyword extraction (concurrently, on blocking threads) → classification →
//! summary (enriched or fallback) → storage. Also exposes the read-side
//! operations over stored documents and their derived knowledge entries.
//!
//! Nothing is persisted unless every step before the store write succeeded.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::enrichment::{create_enricher, Enricher, CLASSIFY_PREVIEW_CHARS};
use crate::error::{CapabilityError, IngestError, StoreError};
use crate::extract::extract_text;
use crate::features::{classify_document, extract_keywords};
use crate::knowledge;
use crate::models::{DocumentMetadata, KnowledgeCategory, KnowledgeEntry, ProcessedDocument};
use crate::segment::segment_text;
use crate::store::{DocumentStore, FsStore};
use crate::summarize::summarize;

/// Tunables of a [`Pipeline`], normally taken from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub summary_max_tokens: u32,
    pub enrichment_timeout: Duration,
    pub search_limit: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            summary_max_tokens: 500,
            enrichment_timeout: Duration::from_secs(30),
            search_limit: 20,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            summary_max_tokens: config.enrichment.summary_max_tokens,
            enrichment_timeout: Duration::from_secs(config.enrichment.timeout_secs),
            search_limit: config.knowledge.search_limit,
        }
    }
}

pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    enricher: Arc<dyn Enricher>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        enricher: Arc<dyn Enricher>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            enricher,
            options,
        }
    }

    /// Open the configured [`FsStore`] and enrichment provider.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = FsStore::open(&config.store.path).await?;
        let enricher = create_enricher(&config.enrichment)?;
        Ok(Self::new(
            Arc::new(store),
            enricher,
            PipelineOptions::from_config(config),
        ))
    }

    /// Turn an upload into a stored [`ProcessedDocument`].
    ///
    /// Fails only on extraction or storage errors. Enrichment problems are
    /// absorbed by the summary fallback.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<ProcessedDocument, IngestError> {
        let uploaded_at = Utc::now();
        let extracted = extract_text(bytes, mime_type, filename)?;

        let text: Arc<str> = Arc::from(extracted.text);
        let (sections, keywords) = {
            let seg_text = Arc::clone(&text);
            let kw_text = Arc::clone(&text);
            tokio::try_join!(
                tokio::task::spawn_blocking(move || segment_text(&seg_text)),
                tokio::task::spawn_blocking(move || extract_keywords(&kw_text)),
            )?
        };
        debug!(
            filename,
            sections = sections.len(),
            keywords = keywords.len(),
            "analysed document text"
        );

        let document_type = classify_document(&text, filename);
        let summary = summarize(
            self.enricher.as_ref(),
            &text,
            document_type,
            self.options.summary_max_tokens,
            self.options.enrichment_timeout,
        )
        .await;

        let doc = ProcessedDocument {
            id: new_document_id(),
            filename: stored_filename(uploaded_at.timestamp_millis(), filename),
            original_name: filename.to_string(),
            content: text.to_string(),
            summary: summary.text,
            document_type,
            metadata: DocumentMetadata {
                pages: extracted.page_count,
                size: extracted.byte_size,
                uploaded_at,
                processed_at: Utc::now(),
            },
            keywords,
            sections,
        };

        self.store.create(&doc).await?;
        info!(
            id = %doc.id,
            filename,
            document_type = %doc.document_type,
            enriched = summary.enriched,
            "ingested document"
        );
        Ok(doc)
    }

    pub async fn list_documents(&self) -> Result<Vec<ProcessedDocument>, StoreError> {
        self.store.list().await
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<ProcessedDocument>, StoreError> {
        self.store.get(id).await
    }

    /// Remove a document (and with it, its knowledge entries).
    pub async fn delete_document(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!(id, "deleted document");
        }
        Ok(deleted)
    }

    pub async fn search_documents(&self, query: &str) -> Result<Vec<ProcessedDocument>, StoreError> {
        self.store.search(query).await
    }

    /// Ask the enrichment capability to classify a stored document.
    ///
    /// On success the stored type is overwritten and, when an enriched
    /// summary can be produced for the new type, the summary too. On failure
    /// the heuristic type stays. Returns `None` for an unknown id.
    pub async fn refine_document_type(
        &self,
        id: &str,
    ) -> Result<Option<ProcessedDocument>, StoreError> {
        let Some(mut doc) = self.store.get(id).await? else {
            return Ok(None);
        };

        let preview: String = doc.content.chars().take(CLASSIFY_PREVIEW_CHARS).collect();
        let classified = tokio::time::timeout(
            self.options.enrichment_timeout,
            self.enricher.classify(&doc.original_name, &preview),
        )
        .await
        .unwrap_or(Err(CapabilityError::Timeout(
            self.options.enrichment_timeout.as_secs(),
        )));

        let refined = match classified {
            Ok(document_type) => document_type,
            Err(CapabilityError::Unavailable) => {
                info!(id, "classification not configured, keeping heuristic type");
                return Ok(Some(doc));
            }
            Err(e) => {
                warn!(id, error = %e, "classification failed, keeping heuristic type");
                return Ok(Some(doc));
            }
        };

        if refined == doc.document_type {
            debug!(id, document_type = %refined, "classification agrees with heuristic");
            return Ok(Some(doc));
        }

        let summary = summarize(
            self.enricher.as_ref(),
            &doc.content,
            refined,
            self.options.summary_max_tokens,
            self.options.enrichment_timeout,
        )
        .await;
        info!(id, from = %doc.document_type, to = %refined, "refined document type");
        doc.document_type = refined;
        if summary.enriched {
            doc.summary = summary.text;
        }

        if !self.store.replace(&doc).await? {
            // Deleted while the classifier was running.
            return Ok(None);
        }
        Ok(Some(doc))
    }

    pub async fn knowledge_base(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        knowledge::knowledge_base(self.store.as_ref()).await
    }

    /// Ranked entries of documents matching `query`, capped at the configured
    /// search limit.
    pub async fn search_knowledge(
        &self,
        query: &str,
        category: Option<KnowledgeCategory>,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        knowledge::search_knowledge(
            self.store.as_ref(),
            query,
            category,
            self.options.search_limit,
        )
        .await
    }
}

fn new_document_id() -> String {
    format!("doc_{}", Uuid::new_v4().simple())
}

/// `<millis>_<name>` with the name reduced to a safe file-name component.
pub fn stored_filename(millis: i64, original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        format!("{}_document", millis)
    } else {
        format!("{}_{}", millis, sanitized)
    }
}
