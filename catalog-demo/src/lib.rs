//! # Catalog Demo
//!
//! Demo driver for the goods catalog. It walks a `GoodRepository` through the
//! whole index lifecycle and the supported query shapes, against either
//! OpenSearch or the in-memory store.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and store wiring
//! - [`driver`]: The demo sequence and its report

pub mod config;
pub mod driver;

pub use config::Dependencies;
pub use driver::{run_demo, DemoReport};

use catalog_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur during demo initialization or execution.
#[derive(Error, Debug)]
pub enum DemoError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A repository or store operation failed.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),
}

impl DemoError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
