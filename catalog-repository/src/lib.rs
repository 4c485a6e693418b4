//! # Catalog Repository
//!
//! This crate provides the typed repository over a search index and the stores
//! behind it. It includes definitions for errors, the `DocumentStore` interface,
//! the query and aggregation model, an OpenSearch store, and an in-memory store
//! that evaluates the same requests in process.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod goods;
pub mod interfaces;
pub mod mapping;
pub mod memory;
pub mod opensearch;
pub mod query;
pub mod repository;
pub mod types;
pub mod utils;

pub use config::RepositoryConfig;
pub use errors::SearchIndexError;
pub use goods::GoodRepository;
pub use interfaces::DocumentStore;
pub use memory::MemoryStore;
pub use opensearch::{OpenSearchConfig, OpenSearchStore, RefreshPolicy};
pub use repository::{AggregatedPage, Document, DocumentRepository};
pub use types::{BatchOperationResult, BatchOperationSummary, IndexOperation, SearchHit, SearchHits};
pub use utils::{validate_document_id, validate_index_name};
