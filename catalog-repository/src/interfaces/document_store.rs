//! Document store trait definition.
//!
//! This module defines the abstract interface for index and document operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::mapping::{IndexMapping, IndexSettings};
use crate::query::{Query, SearchRequest};
use crate::types::{BatchOperationSummary, IndexOperation, SearchHits};

/// Abstracts the underlying search engine (OpenSearch, in-memory, etc.).
///
/// This trait defines the interface for all document store backends. Implementations
/// are injected into `DocumentRepository` to enable dependency injection and easy
/// testing with mock implementations.
///
/// Documents are untyped JSON here; the repository layer converts to and from
/// entity types. All methods return `Result<T, SearchIndexError>` for consistent
/// error handling across backends, and no implementation retries on failure.
///
/// # Write semantics
///
/// Writes are upserts keyed by document id: indexing a document whose id already
/// exists replaces the stored document entirely. Writing into an index that does
/// not exist creates it with default settings and dynamic field mappings.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an index with the given settings.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was created
    /// * `Ok(false)` - If the index already existed (its settings are left untouched)
    /// * `Err(SearchIndexError)` - If creation fails
    async fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<bool, SearchIndexError>;

    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Delete an index and every document in it.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was deleted
    /// * `Ok(false)` - If the index did not exist
    async fn delete_index(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Apply field mappings to an existing index.
    ///
    /// New fields are added. Changing the kind or analyzer of an already mapped
    /// field fails with `SearchIndexError::MappingError`.
    async fn put_mapping(&self, index: &str, mapping: &IndexMapping)
        -> Result<(), SearchIndexError>;

    /// Make recent writes visible to searches.
    async fn refresh(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Index (upsert) one document.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchIndexError>;

    /// Index (upsert) many documents and report per-document outcomes.
    ///
    /// The batch is not atomic: some documents may be written while others fail.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_index_documents(
        &self,
        index: &str,
        operations: &[IndexOperation],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Fetch a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(document))` - The stored document
    /// * `Ok(None)` - If the document or the index does not exist
    async fn get_document(&self, index: &str, id: &str)
        -> Result<Option<Value>, SearchIndexError>;

    /// Delete a document by id.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the document was deleted
    /// * `Ok(false)` - If it did not exist
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchIndexError>;

    /// Delete every document matching `query`, returning how many were deleted.
    async fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError>;

    /// Count the documents matching `query`.
    async fn count(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError>;

    /// Execute a search request.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchHits)` - The hits of the requested page, the total match count
    ///   and any aggregation results
    /// * `Err(SearchIndexError::IndexNotFound)` - If the index does not exist
    /// * `Err(SearchIndexError::QueryError)` - If the store rejects the request
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchHits, SearchIndexError>;
}
