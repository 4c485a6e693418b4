//! This module defines the core data structures used across the catalog.
//! It re-exports the `Good` entity together with paging and sorting types.

pub mod good;
pub mod page;
pub mod sort;

pub use good::Good;
pub use page::{Page, Pageable};
pub use sort::{Sort, SortDirection};
