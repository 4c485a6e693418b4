//! Sort types for search queries.

use serde::{Deserialize, Serialize};

/// Sort direction for a field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest value first. This is the default direction.
    #[default]
    Asc,
    /// Largest value first.
    Desc,
}

impl SortDirection {
    /// The lowercase name used in search engine requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Ordering of search results by a single field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sort {
    /// The field to sort on. `_score` sorts by relevance.
    pub field: String,
    /// The direction of the sort.
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sort {
    /// Create a sort on `field` in `direction`.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_shared::{Sort, SortDirection};
    ///
    /// let sort = Sort::by(SortDirection::Desc, "price");
    /// assert_eq!(sort.field, "price");
    /// ```
    pub fn by(direction: SortDirection, field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::by(SortDirection::Asc, field)
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::by(SortDirection::Desc, field)
    }

    /// Validate the sort parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.field.trim().is_empty() {
            return Err("Sort field cannot be empty".to_string());
        }
        Ok(())
    }
}
