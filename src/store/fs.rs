//! Directory-backed [`DocumentStore`]: one `<id>.json` record per document.
//!
//! Writes go to a hidden temporary file in the same directory and are then
//! moved into place, so a concurrent reader sees either the complete record
//! or nothing. New records are linked into place with `hard_link`, which
//! refuses to clobber an existing id; replacements use `rename`.
//!
//! `replace` and `delete` are serialized by a per-store lock, so a replace
//! that checked for the record can never resurrect it after a delete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{sort_newest_first, validate_id, DocumentStore};
use crate::error::StoreError;
use crate::models::ProcessedDocument;

const RECORD_EXTENSION: &str = "json";

pub struct FsStore {
    dir: PathBuf,
    /// Held across the existence check and rename of `replace`, and by `delete`.
    mutation: Mutex<()>,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self {
            dir,
            mutation: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Serialize `doc` into a fresh temporary file and return its path.
    async fn write_temp(&self, doc: &ProcessedDocument) -> Result<PathBuf, StoreError> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Serialize {
            id: doc.id.clone(),
            source,
        })?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", doc.id, Uuid::new_v4().simple()));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await
        }
        .await;

        match result {
            Ok(()) => Ok(tmp),
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(StoreError::io(&tmp, e))
            }
        }
    }

    async fn read_record(path: &Path) -> Result<Option<ProcessedDocument>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn is_record_file(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('.'));
    visible && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn create(&self, doc: &ProcessedDocument) -> Result<(), StoreError> {
        let path = self.record_path(&doc.id)?;
        let tmp = self.write_temp(doc).await?;

        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => {
                debug!(id = %doc.id, path = %path.display(), "stored document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(doc.id.clone()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    async fn replace(&self, doc: &ProcessedDocument) -> Result<bool, StoreError> {
        let path = self.record_path(&doc.id)?;
        let _guard = self.mutation.lock().await;
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            return Ok(false);
        }

        let tmp = self.write_temp(doc).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::io(&path, e));
        }
        debug!(id = %doc.id, "replaced document");
        Ok(true)
    }

    async fn get(&self, id: &str) -> Result<Option<ProcessedDocument>, StoreError> {
        let path = self.record_path(id)?;
        Self::read_record(&path).await
    }

    async fn list(&self) -> Result<Vec<ProcessedDocument>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?;

        let mut docs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.dir, e))?
        {
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(doc)) => docs.push(doc),
                // Deleted between read_dir and read.
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping unreadable document record"),
            }
        }

        sort_newest_first(&mut docs);
        Ok(docs)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.record_path(id)?;
        let _guard = self.mutation.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id, "deleted document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}
