//! Search requests combining a query with paging, sorting and aggregations.

use catalog_shared::{Pageable, Sort};
use serde::{Deserialize, Serialize};

use super::{AggregationRequest, Query};

/// A complete search request.
///
/// Built from a query with chained `with_*` calls:
///
/// ```
/// use catalog_repository::query::{Query, SearchRequest};
/// use catalog_shared::{Pageable, Sort};
///
/// let request = SearchRequest::new(Query::term("title", "手机"))
///     .with_pageable(Pageable::of(0, 3))
///     .with_sort(Sort::desc("price"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    /// The query selecting documents.
    pub query: Query,
    /// Page to return. `None` returns every match in one page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageable: Option<Pageable>,
    /// Sort clauses, applied in order. Empty sorts by relevance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
    /// Whether hits carry the stored document.
    #[serde(default = "default_fetch_source")]
    pub fetch_source: bool,
    /// Aggregations computed over every matching document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<AggregationRequest>,
}

fn default_fetch_source() -> bool {
    true
}

impl SearchRequest {
    /// Create a request for `query`, unpaged, sorted by relevance.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            pageable: None,
            sorts: Vec::new(),
            fetch_source: default_fetch_source(),
            aggregations: Vec::new(),
        }
    }

    /// A request matching every document.
    pub fn match_all() -> Self {
        Self::new(Query::MatchAll)
    }

    /// Return only the requested page.
    pub fn with_pageable(mut self, pageable: Pageable) -> Self {
        self.pageable = Some(pageable);
        self
    }

    /// Append a sort clause.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Suppress retrieval of stored documents; hits carry only ids.
    pub fn without_source(mut self) -> Self {
        self.fetch_source = false;
        self
    }

    /// Append an aggregation.
    pub fn with_aggregation(mut self, aggregation: AggregationRequest) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    /// Validate the request.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        self.query.validate()?;
        if let Some(pageable) = &self.pageable {
            pageable.validate()?;
        }
        for sort in &self.sorts {
            sort.validate()?;
        }
        for (i, aggregation) in self.aggregations.iter().enumerate() {
            let AggregationRequest::Terms { name, field, size } = aggregation;
            if name.trim().is_empty() || field.trim().is_empty() {
                return Err("Aggregation name and field cannot be empty".to_string());
            }
            if *size == 0 {
                return Err(format!("Aggregation '{}' must request at least one bucket", name));
            }
            if self.aggregations[..i].iter().any(|a| a.name() == name) {
                return Err(format!("Duplicate aggregation name '{}'", name));
            }
        }
        Ok(())
    }
}
