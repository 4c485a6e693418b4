//! OpenSearch implementation of the document store.
//!
//! This module provides a concrete implementation of `DocumentStore`
//! using OpenSearch as the backend.

mod index_config;
mod provider;
mod query_dsl;

pub use index_config::{mapping_body, settings_body, OpenSearchConfig, RefreshPolicy, DEFAULT_URL};
pub use provider::OpenSearchStore;
pub use query_dsl::{query_to_json, search_body};
