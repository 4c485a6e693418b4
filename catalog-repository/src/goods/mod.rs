//! The goods catalog: `Good` documents and their repository.

pub mod queries;

use catalog_shared::Good;
use tracing::debug;

use crate::errors::SearchIndexError;
use crate::mapping::IndexDefinition;
use crate::repository::{Document, DocumentRepository};

impl Document for Good {
    fn index_definition() -> IndexDefinition {
        queries::index_definition()
    }

    fn document_id(&self) -> String {
        Good::document_id(self)
    }

    /// JSON has no NaN or infinity, so a non-finite price would be stored as null.
    fn validate(&self) -> Result<(), String> {
        if !self.price.is_finite() {
            return Err(format!("price must be a finite number, got {}", self.price));
        }
        Ok(())
    }
}

/// Repository of goods in the `good` index.
pub type GoodRepository = DocumentRepository<Good>;

impl DocumentRepository<Good> {
    /// Goods priced between `low` and `high`, both bounds inclusive.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Good>)` - Every matching good, unpaged
    /// * `Err(SearchIndexError::ValidationError)` - If `low > high` or a bound is NaN
    pub async fn find_by_price_between(
        &self,
        low: f64,
        high: f64,
    ) -> Result<Vec<Good>, SearchIndexError> {
        if low.is_nan() || high.is_nan() {
            return Err(SearchIndexError::validation("Price bounds must be numbers"));
        }
        if low > high {
            return Err(SearchIndexError::validation(format!(
                "Lower price bound {} is above upper bound {}",
                low, high
            )));
        }

        let goods = self.search(queries::price_between(low, high)).await?;
        debug!(low, high, found = goods.len(), "Found goods by price");
        Ok(goods)
    }
}
