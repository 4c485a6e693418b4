//! Aggregation requests and tagged aggregation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default number of buckets returned by a terms aggregation.
pub const DEFAULT_TERMS_SIZE: usize = 10;

/// An aggregation to compute over the documents matching a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationRequest {
    /// Group documents by the exact values of `field`.
    Terms {
        /// Name under which the result is returned.
        name: String,
        /// The field to group by. Must be a keyword or numeric field.
        field: String,
        /// Maximum number of buckets.
        size: usize,
    },
}

impl AggregationRequest {
    /// A terms aggregation named `name` on `field`, returning up to
    /// [`DEFAULT_TERMS_SIZE`] buckets.
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Terms {
            name: name.into(),
            field: field.into(),
            size: DEFAULT_TERMS_SIZE,
        }
    }

    /// Set the maximum number of buckets.
    pub fn with_size(self, new_size: usize) -> Self {
        match self {
            Self::Terms { name, field, .. } => Self::Terms {
                name,
                field,
                size: new_size,
            },
        }
    }

    /// The name under which the result is returned.
    pub fn name(&self) -> &str {
        match self {
            Self::Terms { name, .. } => name,
        }
    }

    /// The kind of result this request produces.
    pub fn kind(&self) -> AggregationKind {
        match self {
            Self::Terms { .. } => AggregationKind::Terms,
        }
    }
}

/// Tag identifying the shape of an aggregation result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Terms,
}

/// One group of a terms aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermsBucket {
    /// The field value shared by the documents in this bucket.
    pub key: String,
    /// Number of matching documents with this value.
    pub doc_count: u64,
}

/// Result of a terms aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TermsAggregation {
    /// Buckets in the order the store returned them.
    pub buckets: Vec<TermsBucket>,
    /// Documents whose values fell outside the returned buckets.
    #[serde(default)]
    pub sum_other_doc_count: u64,
}

impl TermsAggregation {
    /// Doc count of the bucket for `key`, if present.
    pub fn doc_count(&self, key: &str) -> Option<u64> {
        self.buckets
            .iter()
            .find(|bucket| bucket.key == key)
            .map(|bucket| bucket.doc_count)
    }

    /// Bucket keys mapped to their doc counts.
    pub fn counts(&self) -> BTreeMap<String, u64> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.key.clone(), bucket.doc_count))
            .collect()
    }
}

/// A tagged aggregation result. Callers match on the variant to read buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    Terms(TermsAggregation),
}

impl Aggregation {
    /// The kind tag of this result.
    pub fn kind(&self) -> AggregationKind {
        match self {
            Aggregation::Terms(_) => AggregationKind::Terms,
        }
    }

    /// The terms result, if this is a terms aggregation.
    pub fn as_terms(&self) -> Option<&TermsAggregation> {
        match self {
            Aggregation::Terms(terms) => Some(terms),
        }
    }
}

/// Aggregation results keyed by aggregation name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Aggregations(BTreeMap<String, Aggregation>);

impl Aggregations {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of the aggregation `name`.
    pub fn insert(&mut self, name: impl Into<String>, aggregation: Aggregation) {
        self.0.insert(name.into(), aggregation);
    }

    /// The result of the aggregation `name`.
    pub fn get(&self, name: &str) -> Option<&Aggregation> {
        self.0.get(name)
    }

    /// The result of the aggregation `name`, if it is a terms aggregation.
    pub fn terms(&self, name: &str) -> Option<&TermsAggregation> {
        self.get(name).and_then(Aggregation::as_terms)
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over results by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Aggregation)> {
        self.0.iter()
    }
}
