//! In-memory implementation of `DocumentStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::index::MemoryIndex;
use crate::errors::SearchIndexError;
use crate::interfaces::DocumentStore;
use crate::mapping::{IndexMapping, IndexSettings};
use crate::query::{Query, SearchRequest};
use crate::types::{BatchOperationResult, BatchOperationSummary, IndexOperation, SearchHits};
use crate::utils::{validate_document_id, validate_index_name};

/// In-memory document store.
///
/// Indexes live behind an async `RwLock`. Writes are visible to the next read,
/// so `refresh` only checks that the index exists.
///
/// # Example
///
/// ```
/// use catalog_repository::{DocumentStore, MemoryStore};
/// use catalog_repository::mapping::IndexSettings;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), catalog_repository::SearchIndexError> {
/// let store = MemoryStore::new();
/// assert!(store.create_index("good", &IndexSettings::new(1, 0)).await?);
/// assert!(store.index_exists("good").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings and mapping of an index, if it exists.
    pub async fn index_metadata(&self, index: &str) -> Option<(IndexSettings, IndexMapping)> {
        let indexes = self.indexes.read().await;
        indexes
            .get(index)
            .map(|i| (i.settings, i.mapping.clone()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<bool, SearchIndexError> {
        validate_index_name(index)?;

        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(index) {
            debug!(index = %index, "Index already exists");
            return Ok(false);
        }
        indexes.insert(index.to_string(), MemoryIndex::new(*settings));

        info!(
            index = %index,
            shards = settings.number_of_shards,
            replicas = settings.number_of_replicas,
            "Created in-memory index"
        );
        Ok(true)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        Ok(self.indexes.read().await.contains_key(index))
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchIndexError> {
        let removed = self.indexes.write().await.remove(index).is_some();
        if removed {
            info!(index = %index, "Deleted in-memory index");
        }
        Ok(removed)
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<(), SearchIndexError> {
        let mut indexes = self.indexes.write().await;
        let target = indexes
            .get_mut(index)
            .ok_or_else(|| SearchIndexError::index_not_found(index))?;
        target.put_mapping(mapping)?;

        debug!(index = %index, fields = mapping.fields.len(), "Mapping applied");
        Ok(())
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchIndexError> {
        if self.indexes.read().await.contains_key(index) {
            Ok(())
        } else {
            Err(SearchIndexError::index_not_found(index))
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        validate_document_id(id)?;

        let mut indexes = self.indexes.write().await;
        let target = indexes.entry(index.to_string()).or_insert_with(|| {
            debug!(index = %index, "Auto-creating index on first write");
            MemoryIndex::new(IndexSettings::default())
        });
        target.upsert(id, document)?;

        debug!(index = %index, doc_id = %id, "Document indexed");
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        index: &str,
        operations: &[IndexOperation],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        validate_index_name(index)?;

        let mut indexes = self.indexes.write().await;
        let target = indexes
            .entry(index.to_string())
            .or_insert_with(|| MemoryIndex::new(IndexSettings::default()));

        let results = operations
            .iter()
            .map(|operation| {
                let outcome = validate_document_id(&operation.id)
                    .and_then(|_| target.upsert(&operation.id, &operation.document));
                BatchOperationResult {
                    id: operation.id.clone(),
                    success: outcome.is_ok(),
                    error: outcome.err(),
                }
            })
            .collect();
        let summary = BatchOperationSummary::from_results(results);

        debug!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk index completed"
        );
        Ok(summary)
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchIndexError> {
        let indexes = self.indexes.read().await;
        Ok(indexes.get(index).and_then(|i| i.get(id)).cloned())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchIndexError> {
        let mut indexes = self.indexes.write().await;
        Ok(indexes.get_mut(index).is_some_and(|i| i.remove(id)))
    }

    async fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError> {
        let mut indexes = self.indexes.write().await;
        let target = indexes
            .get_mut(index)
            .ok_or_else(|| SearchIndexError::index_not_found(index))?;
        let deleted = target.delete_matching(query)?;

        debug!(index = %index, deleted, remaining = target.len(), "Deleted by query");
        Ok(deleted)
    }

    async fn count(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError> {
        let indexes = self.indexes.read().await;
        indexes
            .get(index)
            .ok_or_else(|| SearchIndexError::index_not_found(index))?
            .count(query)
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchHits, SearchIndexError> {
        let indexes = self.indexes.read().await;
        let target = indexes
            .get(index)
            .ok_or_else(|| SearchIndexError::index_not_found(index))?;
        target.search(request)
    }
}
