//! In-memory document store.
//!
//! This module provides a `DocumentStore` that keeps every index in process memory.
//! It evaluates the same query model as the OpenSearch store, analysing text
//! fields with the analyzers named in their mappings, so it can stand in for a
//! cluster in tests and local runs.

mod index;
mod store;

pub use store::MemoryStore;
