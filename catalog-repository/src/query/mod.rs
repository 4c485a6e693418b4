//! Query model for document searches.
//!
//! Queries are plain data. Each store translates them: the OpenSearch store into
//! the query DSL, the in-memory store into direct evaluation against documents.

mod aggregation;
mod request;

pub use aggregation::{
    Aggregation, AggregationKind, AggregationRequest, Aggregations, TermsAggregation, TermsBucket,
    DEFAULT_TERMS_SIZE,
};
pub use request::SearchRequest;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric bounds of a range query. Unset bounds are open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

impl RangeBounds {
    /// Both bounds inclusive: `low <= value <= high`.
    pub fn inclusive(low: f64, high: f64) -> Self {
        Self {
            gte: Some(low),
            lte: Some(high),
            ..Self::default()
        }
    }

    /// Returns true if `value` lies within every set bound.
    pub fn contains(&self, value: f64) -> bool {
        self.gt.map_or(true, |b| value > b)
            && self.gte.map_or(true, |b| value >= b)
            && self.lt.map_or(true, |b| value < b)
            && self.lte.map_or(true, |b| value <= b)
    }
}

/// Compound query combining clauses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BoolQuery {
    /// Clauses that must match and contribute to the score.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    /// Clauses that must match without contributing to the score.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    /// Optional clauses. At least one must match when there is no `must` or `filter`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    /// Clauses that must not match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
}

impl BoolQuery {
    /// Create an empty bool query, which matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: Query) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: Query) -> Self {
        self.filter.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }
}

/// A search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Matches every document.
    MatchAll,
    /// Full-text match: the text is analysed with the field's analyzer and any
    /// resulting token matches.
    Match { field: String, text: String },
    /// Exact term match against the indexed tokens, without analysing the value.
    Term { field: String, value: Value },
    /// Numeric range match.
    Range { field: String, bounds: RangeBounds },
    /// Matches documents by id.
    Ids { values: Vec<String> },
    /// Compound query.
    Bool(BoolQuery),
}

impl Query {
    /// Full-text match on `field`.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_repository::query::Query;
    ///
    /// let query = Query::matching("title", "小米");
    /// ```
    pub fn matching(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Exact term match on `field`.
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Numeric range on `field`.
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Self::Range {
            field: field.into(),
            bounds,
        }
    }

    /// Inclusive numeric range `low..=high` on `field`.
    pub fn between(field: impl Into<String>, low: f64, high: f64) -> Self {
        Self::range(field, RangeBounds::inclusive(low, high))
    }

    /// Match documents whose id is one of `values`.
    pub fn ids<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ids {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate the query tree.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Query::MatchAll => Ok(()),
            Query::Match { field, .. } | Query::Term { field, .. } => validate_field(field),
            Query::Range { field, bounds } => {
                validate_field(field)?;
                let low = bounds.gte.or(bounds.gt);
                let high = bounds.lte.or(bounds.lt);
                if let (Some(low), Some(high)) = (low, high) {
                    if low > high {
                        return Err(format!(
                            "Range on '{}' has lower bound {} above upper bound {}",
                            field, low, high
                        ));
                    }
                }
                Ok(())
            }
            Query::Ids { .. } => Ok(()),
            Query::Bool(bool_query) => bool_query
                .must
                .iter()
                .chain(&bool_query.filter)
                .chain(&bool_query.should)
                .chain(&bool_query.must_not)
                .try_for_each(Query::validate),
        }
    }
}

impl From<BoolQuery> for Query {
    fn from(query: BoolQuery) -> Self {
        Query::Bool(query)
    }
}

fn validate_field(field: &str) -> Result<(), String> {
    if field.trim().is_empty() {
        return Err("Query field cannot be empty".to_string());
    }
    Ok(())
}
