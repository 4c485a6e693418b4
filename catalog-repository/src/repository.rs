//! Typed document repository.
//!
//! `DocumentRepository<T>` is the high-level API application code uses. It
//! converts entities to and from JSON documents, validates input, and delegates
//! every backend operation to a `DocumentStore`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use catalog_shared::{Page, Sort};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RepositoryConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::DocumentStore;
use crate::mapping::IndexDefinition;
use crate::query::{Aggregations, Query, SearchRequest};
use crate::types::{IndexOperation, SearchHits};

/// An entity stored as a document in a search index.
///
/// Implementations describe the index the entity lives in and which value
/// keys the document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Index name, settings and field mappings for this entity.
    fn index_definition() -> IndexDefinition;

    /// The id of this entity's document.
    fn document_id(&self) -> String;

    /// Check the entity before it is written.
    ///
    /// Returns an error message for values the index cannot store faithfully.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A page of entities together with the aggregation results of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPage<T> {
    pub page: Page<T>,
    pub aggregations: Aggregations,
}

/// Repository of `T` documents backed by a `DocumentStore`.
///
/// Writes are upserts keyed by [`Document::document_id`]. Lookups of absent
/// documents return `None` rather than an error. Store failures propagate
/// unchanged; the repository never retries.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use catalog_repository::{GoodRepository, MemoryStore};
/// use catalog_shared::Good;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), catalog_repository::SearchIndexError> {
/// let repository = GoodRepository::new(Arc::new(MemoryStore::new()));
/// repository.create_index().await?;
/// repository.put_mapping().await?;
///
/// repository.save(Good::with_brand(1, "小米手机", 2999.3, "小米")).await?;
/// let found = repository.find_by_id(1).await?;
/// assert_eq!(found.map(|g| g.title), Some("小米手机".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct DocumentRepository<T> {
    store: Arc<dyn DocumentStore>,
    definition: IndexDefinition,
    config: RepositoryConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> DocumentRepository<T> {
    /// Create a repository with the default configuration.
    ///
    /// The default configuration limits `save_all` to 1000 documents.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    /// Create a repository with a custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: RepositoryConfig) -> Self {
        Self {
            store,
            definition: T::index_definition(),
            config,
            _marker: PhantomData,
        }
    }

    /// Name of the index this repository reads and writes.
    pub fn index_name(&self) -> &str {
        &self.definition.name
    }

    /// The index definition of `T`.
    pub fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    fn to_document(entity: &T) -> Result<Value, SearchIndexError> {
        entity.validate().map_err(|reason| {
            SearchIndexError::validation(format!(
                "Invalid document [{}]: {}",
                entity.document_id(),
                reason
            ))
        })?;
        serde_json::to_value(entity).map_err(|e| {
            SearchIndexError::serialization(format!(
                "Failed to serialize document [{}]: {}",
                entity.document_id(),
                e
            ))
        })
    }

    fn from_document(id: &str, source: Value) -> Result<T, SearchIndexError> {
        serde_json::from_value(source).map_err(|e| {
            SearchIndexError::parse(format!("Failed to read document [{}]: {}", id, e))
        })
    }

    /// Create the index with the settings of `T`'s definition.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was created
    /// * `Ok(false)` - If it already existed
    pub async fn create_index(&self) -> Result<bool, SearchIndexError> {
        let created = self
            .store
            .create_index(&self.definition.name, &self.definition.settings)
            .await?;
        info!(index = %self.definition.name, created, "Ensured index");
        Ok(created)
    }

    /// Apply the field mappings of `T`'s definition to the index.
    pub async fn put_mapping(&self) -> Result<(), SearchIndexError> {
        self.store
            .put_mapping(&self.definition.name, &self.definition.mapping)
            .await?;
        info!(
            index = %self.definition.name,
            fields = self.definition.mapping.fields.len(),
            "Applied mapping"
        );
        Ok(())
    }

    /// Check whether the index exists.
    pub async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        self.store.index_exists(&self.definition.name).await
    }

    /// Delete the index and all of its documents.
    pub async fn delete_index(&self) -> Result<bool, SearchIndexError> {
        let deleted = self.store.delete_index(&self.definition.name).await?;
        info!(index = %self.definition.name, deleted, "Deleted index");
        Ok(deleted)
    }

    /// Make recent writes visible to searches.
    pub async fn refresh(&self) -> Result<(), SearchIndexError> {
        self.store.refresh(&self.definition.name).await
    }

    /// Upsert one entity and return it.
    ///
    /// A stored document with the same id is replaced entirely.
    pub async fn save(&self, entity: T) -> Result<T, SearchIndexError> {
        let id = entity.document_id();
        let document = Self::to_document(&entity)?;
        self.store
            .index_document(&self.definition.name, &id, &document)
            .await?;
        debug!(index = %self.definition.name, doc_id = %id, "Saved document");
        Ok(entity)
    }

    /// Upsert many entities and return them.
    ///
    /// The batch is not atomic. If any document fails, the others may already be
    /// stored and the call returns `SearchIndexError::BulkIndexError`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<T>)` - The saved entities, in input order
    /// * `Err(SearchIndexError::ValidationError)` - If any entity fails [`Document::validate`];
    ///   nothing is sent
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch exceeds `max_batch_size`
    /// * `Err(SearchIndexError::BulkIndexError)` - If one or more documents failed
    pub async fn save_all(&self, entities: Vec<T>) -> Result<Vec<T>, SearchIndexError> {
        if entities.is_empty() {
            return Ok(entities);
        }
        self.validate_batch_size(entities.len())?;

        let operations = entities
            .iter()
            .map(|entity| -> Result<IndexOperation, SearchIndexError> {
                Ok(IndexOperation::new(
                    entity.document_id(),
                    Self::to_document(entity)?,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let summary = self
            .store
            .bulk_index_documents(&self.definition.name, &operations)
            .await?;

        if let Some(failure) = summary.first_error() {
            let reason = failure
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown failure".to_string());
            warn!(
                index = %self.definition.name,
                failed = summary.failed,
                total = summary.total,
                first_failed_id = %failure.id,
                "Bulk save had failures"
            );
            return Err(SearchIndexError::bulk_index(format!(
                "{} of {} documents failed, first [{}]: {}",
                summary.failed, summary.total, failure.id, reason
            )));
        }

        info!(
            index = %self.definition.name,
            count = summary.succeeded,
            "Saved documents"
        );
        Ok(entities)
    }

    /// Look up an entity by id.
    ///
    /// Returns `None` if the document or the index does not exist.
    pub async fn find_by_id(&self, id: impl fmt::Display) -> Result<Option<T>, SearchIndexError> {
        let id = id.to_string();
        match self.store.get_document(&self.definition.name, &id).await? {
            Some(source) => Self::from_document(&id, source).map(Some),
            None => Ok(None),
        }
    }

    /// Check whether a document with `id` exists.
    pub async fn exists_by_id(&self, id: impl fmt::Display) -> Result<bool, SearchIndexError> {
        let id = id.to_string();
        Ok(self
            .store
            .get_document(&self.definition.name, &id)
            .await?
            .is_some())
    }

    /// All entities, ordered by `sort`.
    ///
    /// Fails with `SearchIndexError::QueryError` when more documents exist than
    /// one unpaged search returns. Use [`Self::search_page`] for those.
    pub async fn find_all(&self, sort: Sort) -> Result<Vec<T>, SearchIndexError> {
        self.search_complete(SearchRequest::match_all().with_sort(sort))
            .await
    }

    /// All entities matching `query`, in relevance order.
    ///
    /// Fails like [`Self::find_all`] when the matches do not fit in one response.
    pub async fn search(&self, query: Query) -> Result<Vec<T>, SearchIndexError> {
        self.search_complete(SearchRequest::new(query)).await
    }

    async fn search_complete(&self, request: SearchRequest) -> Result<Vec<T>, SearchIndexError> {
        let hits = self.execute(&request).await?;
        let total = hits.hits_total();
        let returned = hits.returned();
        if total > returned {
            warn!(
                index = %self.definition.name,
                total,
                returned,
                "Unpaged search truncated"
            );
            return Err(SearchIndexError::query(format!(
                "{} documents match but an unpaged search returns at most {}, \
                 page through them with search_page",
                total, returned
            )));
        }
        hits.into_entities()
    }

    /// Execute a search request and return one page of entities.
    ///
    /// Hits without a source, as returned when the request disables source
    /// fetching, contribute to the total but not to the content.
    pub async fn search_page(&self, request: SearchRequest) -> Result<Page<T>, SearchIndexError> {
        let hits = self.execute(&request).await?;
        let total = hits.hits_total();
        Ok(Self::to_page(&request, total, hits.into_entities()?))
    }

    /// Execute a search request and return the page together with its aggregations.
    pub async fn search_aggregated(
        &self,
        request: SearchRequest,
    ) -> Result<AggregatedPage<T>, SearchIndexError> {
        let hits = self.execute(&request).await?;
        let total = hits.hits_total();
        let (entities, aggregations) = hits.into_entities_and_aggregations()?;
        Ok(AggregatedPage {
            page: Self::to_page(&request, total, entities),
            aggregations,
        })
    }

    /// Number of documents in the index.
    pub async fn count(&self) -> Result<u64, SearchIndexError> {
        self.store
            .count(&self.definition.name, &Query::MatchAll)
            .await
    }

    /// Delete the document with `id`. Returns whether it existed.
    pub async fn delete_by_id(&self, id: impl fmt::Display) -> Result<bool, SearchIndexError> {
        let id = id.to_string();
        let deleted = self
            .store
            .delete_document(&self.definition.name, &id)
            .await?;
        debug!(index = %self.definition.name, doc_id = %id, deleted, "Deleted document");
        Ok(deleted)
    }

    /// Delete the document of `entity`. Returns whether it existed.
    pub async fn delete(&self, entity: &T) -> Result<bool, SearchIndexError> {
        self.delete_by_id(entity.document_id()).await
    }

    /// Delete every document in the index, returning how many were deleted.
    pub async fn delete_all(&self) -> Result<u64, SearchIndexError> {
        let deleted = self
            .store
            .delete_by_query(&self.definition.name, &Query::MatchAll)
            .await?;
        info!(index = %self.definition.name, deleted, "Deleted all documents");
        Ok(deleted)
    }

    async fn execute(&self, request: &SearchRequest) -> Result<TypedHits<T>, SearchIndexError> {
        request.validate().map_err(SearchIndexError::validation)?;
        if let Some(pageable) = request.pageable {
            let end = pageable.offset().saturating_add(pageable.size);
            if end > self.config.max_result_window {
                return Err(SearchIndexError::validation(format!(
                    "Result window is too large, from + size must be <= {} but was [{}]",
                    self.config.max_result_window, end
                )));
            }
        }

        let hits = self.store.search(&self.definition.name, request).await?;
        debug!(
            index = %self.definition.name,
            total = hits.total,
            returned = hits.hits.len(),
            "Search executed"
        );
        Ok(TypedHits {
            hits,
            _marker: PhantomData,
        })
    }

    fn to_page(request: &SearchRequest, total: u64, content: Vec<T>) -> Page<T> {
        match request.pageable {
            Some(pageable) => Page::new(content, total, pageable),
            None => Page::unpaged(content, total),
        }
    }
}

/// Search hits not yet converted to entities.
struct TypedHits<T> {
    hits: SearchHits,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> TypedHits<T> {
    fn hits_total(&self) -> u64 {
        self.hits.total
    }

    fn returned(&self) -> u64 {
        self.hits.hits.len() as u64
    }

    fn into_entities(self) -> Result<Vec<T>, SearchIndexError> {
        self.into_entities_and_aggregations()
            .map(|(entities, _)| entities)
    }

    fn into_entities_and_aggregations(self) -> Result<(Vec<T>, Aggregations), SearchIndexError> {
        let SearchHits {
            hits, aggregations, ..
        } = self.hits;
        let entities = hits
            .into_iter()
            .filter_map(|hit| {
                hit.source
                    .map(|source| DocumentRepository::<T>::from_document(&hit.id, source))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((entities, aggregations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldMapping, IndexMapping, IndexSettings};
    use crate::query::AggregationRequest;
    use crate::types::{BatchOperationResult, BatchOperationSummary, SearchHit};
    use async_trait::async_trait;
    use catalog_shared::Pageable;
    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        body: String,
    }

    impl Document for Note {
        fn index_definition() -> IndexDefinition {
            IndexDefinition::new(
                "note",
                IndexSettings::new(1, 0),
                IndexMapping::new()
                    .field("id", FieldMapping::long())
                    .field("body", FieldMapping::standard_text()),
            )
        }

        fn document_id(&self) -> String {
            self.id.to_string()
        }
    }

    fn note(id: u32, body: &str) -> Note {
        Note {
            id,
            body: body.to_string(),
        }
    }

    /// Mock store for testing
    #[derive(Default)]
    struct MockStore {
        calls: Mutex<Vec<String>>,
        documents: Mutex<Vec<(String, Value)>>,
        search_hits: SearchHits,
        failing_ids: Vec<String>,
        should_fail: bool,
    }

    impl MockStore {
        fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::default()
            }
        }

        async fn record(&self, call: &str) -> Result<(), SearchIndexError> {
            self.calls.lock().await.push(call.to_string());
            if self.should_fail {
                return Err(SearchIndexError::connection("Mock failure"));
            }
            Ok(())
        }

        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn create_index(
            &self,
            _index: &str,
            _settings: &IndexSettings,
        ) -> Result<bool, SearchIndexError> {
            self.record("create_index").await?;
            Ok(true)
        }

        async fn index_exists(&self, _index: &str) -> Result<bool, SearchIndexError> {
            self.record("index_exists").await?;
            Ok(true)
        }

        async fn delete_index(&self, _index: &str) -> Result<bool, SearchIndexError> {
            self.record("delete_index").await?;
            Ok(true)
        }

        async fn put_mapping(
            &self,
            _index: &str,
            _mapping: &IndexMapping,
        ) -> Result<(), SearchIndexError> {
            self.record("put_mapping").await
        }

        async fn refresh(&self, _index: &str) -> Result<(), SearchIndexError> {
            self.record("refresh").await
        }

        async fn index_document(
            &self,
            _index: &str,
            id: &str,
            document: &Value,
        ) -> Result<(), SearchIndexError> {
            self.record("index_document").await?;
            self.documents
                .lock()
                .await
                .push((id.to_string(), document.clone()));
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            _index: &str,
            operations: &[IndexOperation],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            self.record("bulk_index_documents").await?;

            let mut results = Vec::new();
            for operation in operations {
                if self.failing_ids.contains(&operation.id) {
                    results.push(BatchOperationResult {
                        id: operation.id.clone(),
                        success: false,
                        error: Some(SearchIndexError::index("Mock rejection")),
                    });
                } else {
                    self.documents
                        .lock()
                        .await
                        .push((operation.id.clone(), operation.document.clone()));
                    results.push(BatchOperationResult {
                        id: operation.id.clone(),
                        success: true,
                        error: None,
                    });
                }
            }
            Ok(BatchOperationSummary::from_results(results))
        }

        async fn get_document(
            &self,
            _index: &str,
            id: &str,
        ) -> Result<Option<Value>, SearchIndexError> {
            self.record("get_document").await?;
            let documents = self.documents.lock().await;
            Ok(documents
                .iter()
                .rev()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, source)| source.clone()))
        }

        async fn delete_document(&self, _index: &str, id: &str) -> Result<bool, SearchIndexError> {
            self.record("delete_document").await?;
            let mut documents = self.documents.lock().await;
            let before = documents.len();
            documents.retain(|(doc_id, _)| doc_id != id);
            Ok(documents.len() != before)
        }

        async fn delete_by_query(
            &self,
            _index: &str,
            _query: &Query,
        ) -> Result<u64, SearchIndexError> {
            self.record("delete_by_query").await?;
            let mut documents = self.documents.lock().await;
            let deleted = documents.len() as u64;
            documents.clear();
            Ok(deleted)
        }

        async fn count(&self, _index: &str, _query: &Query) -> Result<u64, SearchIndexError> {
            self.record("count").await?;
            Ok(self.documents.lock().await.len() as u64)
        }

        async fn search(
            &self,
            _index: &str,
            _request: &SearchRequest,
        ) -> Result<SearchHits, SearchIndexError> {
            self.record("search").await?;
            Ok(self.search_hits.clone())
        }
    }

    fn repository(store: Arc<MockStore>) -> DocumentRepository<Note> {
        DocumentRepository::new(store)
    }

    #[tokio::test]
    async fn test_index_lifecycle_uses_definition() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store.clone());

        assert_eq!(repo.index_name(), "note");
        assert!(repo.create_index().await.unwrap());
        repo.put_mapping().await.unwrap();
        repo.refresh().await.unwrap();

        assert_eq!(store.calls().await, vec!["create_index", "put_mapping", "refresh"]);
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store.clone());

        let saved = repo.save(note(1, "first")).await.unwrap();
        assert_eq!(saved, note(1, "first"));

        assert_eq!(repo.find_by_id(1).await.unwrap(), Some(note(1, "first")));
        assert_eq!(repo.find_by_id(2).await.unwrap(), None);
        assert!(repo.exists_by_id(1).await.unwrap());
        assert!(!repo.exists_by_id("2").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_id_rejects_malformed_source() {
        let store = Arc::new(MockStore::default());
        store
            .documents
            .lock()
            .await
            .push(("1".to_string(), json!({"id": "not a number"})));
        let repo = repository(store);

        let result = repo.find_by_id(1).await;
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_save_all_empty_skips_store() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store.clone());

        let saved = repo.save_all(vec![]).await.unwrap();

        assert!(saved.is_empty());
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_all_batch_size_exceeded() {
        let store = Arc::new(MockStore::default());
        let repo = DocumentRepository::<Note>::with_config(
            store.clone(),
            RepositoryConfig::with_max_batch_size(2),
        );

        let result = repo
            .save_all(vec![note(1, "a"), note(2, "b"), note(3, "c")])
            .await;

        assert!(matches!(
            result,
            Err(SearchIndexError::BatchSizeExceeded {
                provided: 3,
                max: 2
            })
        ));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_all_reports_partial_failure() {
        let store = Arc::new(MockStore {
            failing_ids: vec!["2".to_string()],
            ..MockStore::default()
        });
        let repo = repository(store.clone());

        let result = repo
            .save_all(vec![note(1, "a"), note(2, "b"), note(3, "c")])
            .await;

        match result {
            Err(SearchIndexError::BulkIndexError(message)) => {
                assert!(message.contains("1 of 3"), "{}", message);
                assert!(message.contains("[2]"), "{}", message);
            }
            other => panic!("expected BulkIndexError, got {:?}", other),
        }
        // The batch is not atomic
        assert_eq!(repo.find_by_id(3).await.unwrap(), Some(note(3, "c")));
    }

    #[tokio::test]
    async fn test_save_all_returns_entities_in_order() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store);

        let notes = vec![note(2, "b"), note(1, "a")];
        let saved = repo.save_all(notes.clone()).await.unwrap();

        assert_eq!(saved, notes);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let store = Arc::new(MockStore::failing());
        let repo = repository(store);

        assert!(matches!(
            repo.save(note(1, "a")).await,
            Err(SearchIndexError::ConnectionError(_))
        ));
        assert!(matches!(
            repo.find_by_id(1).await,
            Err(SearchIndexError::ConnectionError(_))
        ));
        assert!(matches!(
            repo.search(Query::MatchAll).await,
            Err(SearchIndexError::ConnectionError(_))
        ));
        assert!(matches!(
            repo.delete_all().await,
            Err(SearchIndexError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_search_page_validates_before_sending() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store.clone());

        let result = repo
            .search_page(SearchRequest::match_all().with_pageable(Pageable::of(0, 0)))
            .await;

        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_search_page_past_result_window() {
        let store = Arc::new(MockStore::default());
        let repo = DocumentRepository::<Note>::with_config(
            store.clone(),
            RepositoryConfig::default().result_window(10),
        );

        let within = repo
            .search_page(SearchRequest::match_all().with_pageable(Pageable::of(4, 2)))
            .await;
        assert!(within.is_ok());

        let past = repo
            .search_page(SearchRequest::match_all().with_pageable(Pageable::of(5, 2)))
            .await;
        assert!(matches!(past, Err(SearchIndexError::ValidationError(_))));
        assert_eq!(store.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_search_page_builds_page() {
        let store = Arc::new(MockStore {
            search_hits: SearchHits {
                hits: vec![
                    SearchHit {
                        id: "1".to_string(),
                        score: Some(2.0),
                        source: Some(json!({"id": 1, "body": "a"})),
                    },
                    SearchHit {
                        id: "2".to_string(),
                        score: Some(1.0),
                        source: Some(json!({"id": 2, "body": "b"})),
                    },
                ],
                total: 5,
                aggregations: Aggregations::new(),
            },
            ..MockStore::default()
        });
        let repo = repository(store);

        let page = repo
            .search_page(SearchRequest::match_all().with_pageable(Pageable::of(0, 2)))
            .await
            .unwrap();

        assert_eq!(page.content, vec![note(1, "a"), note(2, "b")]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.number(), 0);
        assert_eq!(page.size(), 2);
    }

    #[tokio::test]
    async fn test_search_rejects_truncated_results() {
        let store = Arc::new(MockStore {
            search_hits: SearchHits {
                hits: vec![SearchHit {
                    id: "1".to_string(),
                    score: Some(1.0),
                    source: Some(json!({"id": 1, "body": "a"})),
                }],
                total: 3,
                aggregations: Aggregations::new(),
            },
            ..MockStore::default()
        });
        let repo = repository(store);

        let result = repo.search(Query::MatchAll).await;
        assert!(matches!(result, Err(SearchIndexError::QueryError(_))));

        let result = repo.find_all(Sort::asc("id")).await;
        assert!(matches!(result, Err(SearchIndexError::QueryError(_))));
    }

    #[tokio::test]
    async fn test_search_aggregated_without_source() {
        let mut aggregations = Aggregations::new();
        aggregations.insert(
            "bodies",
            crate::query::Aggregation::Terms(crate::query::TermsAggregation::default()),
        );
        let store = Arc::new(MockStore {
            search_hits: SearchHits {
                hits: vec![SearchHit {
                    id: "1".to_string(),
                    score: None,
                    source: None,
                }],
                total: 1,
                aggregations,
            },
            ..MockStore::default()
        });
        let repo = repository(store);

        let result = repo
            .search_aggregated(
                SearchRequest::match_all()
                    .without_source()
                    .with_aggregation(AggregationRequest::terms("bodies", "body")),
            )
            .await
            .unwrap();

        assert!(result.page.content.is_empty());
        assert_eq!(result.page.total_elements, 1);
        assert!(result.aggregations.terms("bodies").is_some());
    }

    #[tokio::test]
    async fn test_delete_operations() {
        let store = Arc::new(MockStore::default());
        let repo = repository(store);

        repo.save_all(vec![note(1, "a"), note(2, "b"), note(3, "c")])
            .await
            .unwrap();

        assert!(repo.delete_by_id(1).await.unwrap());
        assert!(!repo.delete_by_id(1).await.unwrap());
        assert!(repo.delete(&note(2, "b")).await.unwrap());
        assert_eq!(repo.delete_all().await.unwrap(), 1);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
