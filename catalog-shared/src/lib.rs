//! # Catalog Shared
//!
//! This crate defines the data structures shared across the goods catalog:
//! the `Good` entity stored in the search index, and the paging and sorting
//! value types used by the repository layer.

pub mod types;

pub use types::good::Good;
pub use types::page::{Page, Pageable, MAX_PAGE_SIZE};
pub use types::sort::{Sort, SortDirection};
