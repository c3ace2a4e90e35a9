//! Error taxonomy for the ingestion pipeline.
//!
//! Library modules return these typed errors; the CLI wraps them in
//! `anyhow` at the edges. Only [`ExtractionError`] and [`StoreError`] ever
//! reach a caller of [`Pipeline::ingest`](crate::ingest::Pipeline::ingest):
//! [`CapabilityError`] is always recovered by a local fallback.

use std::path::PathBuf;

/// Raw bytes could not be turned into document text.
///
/// Ingestion aborts on this error and nothing is persisted.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed: {0}")]
    Pdf(#[source] pdf_extract::OutputError),

    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("document is not valid UTF-8 text: {0}")]
    Utf8(#[source] std::str::Utf8Error),

    #[error("no text could be extracted from {filename}")]
    Empty { filename: String },
}

/// The optional enrichment capability could not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("enrichment capability is not configured")]
    Unavailable,

    #[error("enrichment request failed: {0}")]
    Http(String),

    #[error("invalid enrichment response: {0}")]
    InvalidResponse(String),

    #[error("enrichment call timed out after {0}s")]
    Timeout(u64),
}

/// Document store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt document record at {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize document {id}: {source}")]
    Serialize {
        id: String,
        source: serde_json::Error,
    },

    #[error("invalid document id: {0:?}")]
    InvalidId(String),

    #[error("document already exists: {0}")]
    AlreadyExists(String),
}

impl StoreError {
    /// Wrap a `std::io::Error` with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a whole ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
