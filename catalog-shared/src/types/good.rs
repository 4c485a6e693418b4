//! Good entity for the catalog index.
//!
//! This module defines the document structure that is indexed in the search engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A product in the catalog, as stored in the search index.
///
/// The `id` doubles as the document key, so writing a `Good` whose `id` is
/// already present replaces the stored document as a whole.
///
/// # Fields
///
/// - `id`: Unique identifier, used as the document id
/// - `title`: Free text title, analysed with word segmentation
/// - `price`: Numeric price, used for range queries and sorting
/// - `brand`: Optional brand, matched exactly and used for aggregations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Good {
    pub id: i64,
    pub title: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl Good {
    /// Create a good without a brand.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_shared::Good;
    ///
    /// let good = Good::new(1, "小米手机", 2999.3);
    /// assert!(good.brand.is_none());
    /// ```
    pub fn new(id: i64, title: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            brand: None,
        }
    }

    /// Create a good with a brand.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_shared::Good;
    ///
    /// let good = Good::with_brand(1, "小米手机", 2999.3, "小米");
    /// assert_eq!(good.brand.as_deref(), Some("小米"));
    /// ```
    pub fn with_brand(
        id: i64,
        title: impl Into<String>,
        price: f64,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            brand: Some(brand.into()),
        }
    }

    /// The document id used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl fmt::Display for Good {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Good{{id={}, title='{}', price={}",
            self.id, self.title, self.price
        )?;
        if let Some(brand) = &self.brand {
            write!(f, ", brand={}", brand)?;
        }
        write!(f, "}}")
    }
}
