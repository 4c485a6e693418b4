//! Paging types for search results.
//!
//! This module defines the page request and the page of results returned
//! from paginated search operations.

use serde::{Deserialize, Serialize};

/// Maximum page size accepted by [`Pageable::validate`].
pub const MAX_PAGE_SIZE: usize = 10_000;

/// A request for one page of results.
///
/// Page numbers are 0-based: page 0 is the first page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pageable {
    /// The 0-based page number.
    pub page: usize,
    /// The number of results per page.
    pub size: usize,
}

impl Pageable {
    /// Create a page request.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_shared::Pageable;
    ///
    /// let pageable = Pageable::of(2, 3);
    /// assert_eq!(pageable.offset(), 6);
    /// ```
    pub fn of(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// The number of results skipped before this page starts.
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// Validate the page size.
    ///
    /// Only the size is checked here. How deep a page may reach depends on the
    /// index's result window, which the repository enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.size == 0 {
            return Err("Page size must be at least 1".to_string());
        }
        if self.size > MAX_PAGE_SIZE {
            return Err(format!(
                "Page size {} exceeds maximum {}",
                self.size, MAX_PAGE_SIZE
            ));
        }
        Ok(())
    }
}

/// One page of search results with metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// The results on this page.
    pub content: Vec<T>,

    /// Total number of matching documents across all pages.
    pub total_elements: u64,

    /// The page request that produced this page, `None` when unpaged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pageable: Option<Pageable>,
}

impl<T> Page<T> {
    /// Create a page for a paged request.
    pub fn new(content: Vec<T>, total_elements: u64, pageable: Pageable) -> Self {
        Self {
            content,
            total_elements,
            pageable: Some(pageable),
        }
    }

    /// Create a single page holding an unpaged result set.
    pub fn unpaged(content: Vec<T>, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            pageable: None,
        }
    }

    /// Create an empty page.
    pub fn empty() -> Self {
        Self::unpaged(Vec::new(), 0)
    }

    /// The 0-based page number.
    pub fn number(&self) -> usize {
        self.pageable.map(|p| p.page).unwrap_or(0)
    }

    /// The requested page size, or the number of results when unpaged.
    pub fn size(&self) -> usize {
        self.pageable
            .map(|p| p.size)
            .unwrap_or_else(|| self.content.len())
    }

    /// Total number of pages: `ceil(total_elements / size)`.
    pub fn total_pages(&self) -> u64 {
        match self.pageable {
            Some(pageable) if pageable.size > 0 => {
                self.total_elements.div_ceil(pageable.size as u64)
            }
            _ if self.total_elements == 0 => 0,
            _ => 1,
        }
    }

    /// Whether a page follows this one.
    pub fn has_next(&self) -> bool {
        (self.number() as u64 + 1) < self.total_pages()
    }

    /// Returns true if this page holds no results.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the number of results on this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Iterate over the results on this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.content.iter()
    }

    /// Convert the results, keeping the page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            pageable: self.pageable,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}
