//! Storage abstraction for processed documents.
//!
//! The [`DocumentStore`] trait defines the record operations the pipeline
//! needs, enabling pluggable backends:
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`FsStore`] | One JSON file per document, written atomically |
//! | [`InMemoryStore`] | Tests and embedding in other processes |
//!
//! Records are independent of each other; no operation locks more than the
//! record it touches.

pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::ProcessedDocument;

pub use fs::FsStore;
pub use memory::InMemoryStore;

/// Abstract record store for [`ProcessedDocument`]s.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create`](DocumentStore::create) | Persist a new record keyed by its id |
/// | [`replace`](DocumentStore::replace) | Overwrite an existing record (type/summary refinement) |
/// | [`get`](DocumentStore::get) | Read one record, `None` if absent |
/// | [`list`](DocumentStore::list) | All readable records, newest upload first |
/// | [`delete`](DocumentStore::delete) | Remove a record, `false` if absent |
/// | [`search`](DocumentStore::search) | Case-insensitive substring search |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new record. Fails with [`StoreError::AlreadyExists`] if the
    /// id is taken.
    async fn create(&self, doc: &ProcessedDocument) -> Result<(), StoreError>;

    /// Overwrite an existing record. Returns `false` if there was none.
    async fn replace(&self, doc: &ProcessedDocument) -> Result<bool, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<ProcessedDocument>, StoreError>;

    /// All records sorted by upload time, newest first. Unreadable records
    /// are skipped.
    async fn list(&self) -> Result<Vec<ProcessedDocument>, StoreError>;

    /// Returns `true` iff a record existed and was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Records whose content, original name, keywords, or summary contain
    /// `query`, ignoring case. Keeps the [`list`](DocumentStore::list) order.
    async fn search(&self, query: &str) -> Result<Vec<ProcessedDocument>, StoreError> {
        let query_lower = query.to_lowercase();
        let mut docs = self.list().await?;
        docs.retain(|doc| matches_query(doc, &query_lower));
        Ok(docs)
    }
}

/// Substring match against an already lower-cased query.
pub fn matches_query(doc: &ProcessedDocument, query_lower: &str) -> bool {
    doc.content.to_lowercase().contains(query_lower)
        || doc.original_name.to_lowercase().contains(query_lower)
        || doc
            .keywords
            .iter()
            .any(|k| k.to_lowercase().contains(query_lower))
        || doc.summary.to_lowercase().contains(query_lower)
}

/// Newest upload first; stable for equal timestamps.
pub fn sort_newest_first(docs: &mut [ProcessedDocument]) {
    docs.sort_by(|a, b| b.metadata.uploaded_at.cmp(&a.metadata.uploaded_at));
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}
