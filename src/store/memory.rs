//! In-memory [`DocumentStore`] implementation for testing and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Nothing
//! survives the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{sort_newest_first, validate_id, DocumentStore};
use crate::error::StoreError;
use crate::models::ProcessedDocument;

#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, ProcessedDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, doc: &ProcessedDocument) -> Result<(), StoreError> {
        validate_id(&doc.id)?;
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        if docs.contains_key(&doc.id) {
            return Err(StoreError::AlreadyExists(doc.id.clone()));
        }
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn replace(&self, doc: &ProcessedDocument) -> Result<bool, StoreError> {
        validate_id(&doc.id)?;
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        match docs.get_mut(&doc.id) {
            Some(slot) => {
                *slot = doc.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<ProcessedDocument>, StoreError> {
        validate_id(id)?;
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<ProcessedDocument>, StoreError> {
        let mut out: Vec<ProcessedDocument> = {
            let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
            docs.values().cloned().collect()
        };
        // HashMap order is arbitrary; break upload-time ties by id.
        out.sort_by(|a, b| a.id.cmp(&b.id));
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        validate_id(id)?;
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::sample_doc;

    #[tokio::test]
    async fn crud_cycle() {
        let store = InMemoryStore::new();
        let doc = sample_doc("doc_1", "cp.txt", "Freight", 0);
        store.create(&doc).await.unwrap();
        assert!(matches!(
            store.create(&doc).await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.get("doc_1").await.unwrap(), Some(doc.clone()));

        let mut refined = doc.clone();
        refined.summary = "Refined".to_string();
        assert!(store.replace(&refined).await.unwrap());
        assert_eq!(store.get("doc_1").await.unwrap().unwrap().summary, "Refined");

        assert!(store.delete("doc_1").await.unwrap());
        assert!(!store.delete("doc_1").await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_orders_by_upload_time() {
        let store = InMemoryStore::new();
        store.create(&sample_doc("doc_b", "b.txt", "b", 20)).await.unwrap();
        store.create(&sample_doc("doc_a", "a.txt", "a", 2)).await.unwrap();
        store.create(&sample_doc("doc_c", "c.txt", "c", 20)).await.unwrap();
        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, ["doc_a", "doc_b", "doc_c"]);
    }
}
