//! Request and response types shared by document store implementations.

use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::query::Aggregations;

/// A document to write in a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOperation {
    /// The document id (the key in the index).
    pub id: String,
    /// The full document body. Replaces any existing document with the same id.
    pub document: Value,
}

impl IndexOperation {
    /// Create a new index operation.
    pub fn new(id: impl Into<String>, document: Value) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of a single operation within a batch. It
/// indicates whether the operation succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document id.
    pub id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// The store reports partial failures here rather than failing the whole call,
/// so callers can decide how to surface them.
#[derive(Debug, Clone)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// An empty summary for a batch with no items.
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            results: vec![],
        }
    }

    /// Build a summary from individual results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// The first recorded failure, if any.
    pub fn first_error(&self) -> Option<&BatchOperationResult> {
        self.results.iter().find(|r| !r.success)
    }
}

/// One hit returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The document id.
    pub id: String,
    /// Relevance score, absent when results are sorted by a field.
    pub score: Option<f64>,
    /// The stored document, absent when source retrieval was suppressed.
    pub source: Option<Value>,
}

/// Untyped response of a search request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHits {
    /// The hits on the requested page, in result order.
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents.
    pub total: u64,
    /// Aggregation results keyed by aggregation name.
    pub aggregations: Aggregations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_results() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult {
                id: "1".to_string(),
                success: true,
                error: None,
            },
            BatchOperationResult {
                id: "2".to_string(),
                success: false,
                error: Some(SearchIndexError::index("rejected")),
            },
        ]);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.first_error().map(|r| r.id.as_str()), Some("2"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchOperationSummary::empty();
        assert_eq!(summary.total, 0);
        assert!(summary.first_error().is_none());
    }
}
