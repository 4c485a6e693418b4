//! A single in-memory index: stored documents, mappings and query evaluation.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use catalog_shared::{SortDirection, MAX_PAGE_SIZE};
use serde_json::Value;

use crate::analysis::Analyzer;
use crate::errors::SearchIndexError;
use crate::mapping::{FieldKind, FieldMapping, IndexMapping, IndexSettings};
use crate::query::{
    Aggregation, AggregationRequest, Aggregations, BoolQuery, Query, RangeBounds, SearchRequest,
    TermsAggregation, TermsBucket,
};
use crate::types::{SearchHit, SearchHits};

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    source: Value,
}

/// Documents of one index, kept in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct MemoryIndex {
    pub settings: IndexSettings,
    pub mapping: IndexMapping,
    documents: Vec<StoredDocument>,
}

impl MemoryIndex {
    pub fn new(settings: IndexSettings) -> Self {
        Self {
            settings,
            mapping: IndexMapping::new(),
            documents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn put_mapping(&mut self, mapping: &IndexMapping) -> Result<(), SearchIndexError> {
        if let Some(conflict) = self.mapping.conflict_with(mapping) {
            return Err(SearchIndexError::mapping(conflict));
        }
        self.mapping.merge(mapping);
        Ok(())
    }

    /// Insert or replace a document. Unmapped fields are mapped dynamically.
    pub fn upsert(&mut self, id: &str, source: &Value) -> Result<(), SearchIndexError> {
        let fields = source.as_object().ok_or_else(|| {
            SearchIndexError::index(format!("Document [{}] must be a JSON object", id))
        })?;

        let mut dynamic = IndexMapping::new();
        for (name, value) in fields {
            match self.mapping.get(name) {
                Some(mapping) => check_value(name, mapping, value)?,
                None => {
                    if let Some(mapping) = dynamic_mapping(value) {
                        dynamic = dynamic.field(name.clone(), mapping);
                    }
                }
            }
        }
        self.mapping.merge(&dynamic);

        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.source = source.clone(),
            None => self.documents.push(StoredDocument {
                id: id.to_string(),
                source: source.clone(),
            }),
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| &d.source)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }

    pub fn count(&self, query: &Query) -> Result<u64, SearchIndexError> {
        Ok(self.matching(query)?.len() as u64)
    }

    pub fn delete_matching(&mut self, query: &Query) -> Result<u64, SearchIndexError> {
        let matched: BTreeSet<usize> =
            self.matching(query)?.into_iter().map(|(i, _)| i).collect();
        let mut position = 0;
        self.documents.retain(|_| {
            let keep = !matched.contains(&position);
            position += 1;
            keep
        });
        Ok(matched.len() as u64)
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchHits, SearchIndexError> {
        request.validate().map_err(SearchIndexError::query)?;

        let mut matched = self.matching(&request.query)?;
        let total = matched.len() as u64;

        let mut aggregations = Aggregations::new();
        for aggregation in &request.aggregations {
            let result = self.aggregate(aggregation, &matched)?;
            aggregations.insert(aggregation.name(), result);
        }

        if request.sorts.is_empty() {
            // Stable: ties keep insertion order.
            matched.sort_by(|a, b| b.1.total_cmp(&a.1));
        } else {
            self.sort(&mut matched, request)?;
        }

        let (offset, limit) = match request.pageable {
            Some(pageable) => (pageable.offset(), pageable.size),
            // Same cap as the size sent to OpenSearch for unpaged requests.
            None => (0, MAX_PAGE_SIZE),
        };

        let hits = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(i, score)| {
                let document = &self.documents[i];
                SearchHit {
                    id: document.id.clone(),
                    score: request.sorts.is_empty().then_some(score),
                    source: request.fetch_source.then(|| document.source.clone()),
                }
            })
            .collect();

        Ok(SearchHits {
            hits,
            total,
            aggregations,
        })
    }

    /// Positions and scores of every document matching `query`, in insertion order.
    fn matching(&self, query: &Query) -> Result<Vec<(usize, f64)>, SearchIndexError> {
        let mut matched = Vec::new();
        for (i, document) in self.documents.iter().enumerate() {
            if let Some(score) = self.score(query, document)? {
                matched.push((i, score));
            }
        }
        Ok(matched)
    }

    /// Score of `document` for `query`, `None` when it does not match.
    fn score(
        &self,
        query: &Query,
        document: &StoredDocument,
    ) -> Result<Option<f64>, SearchIndexError> {
        match query {
            Query::MatchAll => Ok(Some(1.0)),
            Query::Ids { values } => Ok(values.contains(&document.id).then_some(1.0)),
            Query::Match { field, text } => self.score_match(field, text, &document.source),
            Query::Term { field, value } => self.score_term(field, value, &document.source),
            Query::Range { field, bounds } => self.score_range(field, bounds, &document.source),
            Query::Bool(bool_query) => self.score_bool(bool_query, document),
        }
    }

    fn score_match(
        &self,
        field: &str,
        text: &str,
        source: &Value,
    ) -> Result<Option<f64>, SearchIndexError> {
        let Some(mapping) = self.mapping.get(field) else {
            return Ok(None);
        };
        let values = field_values(source, field);

        match mapping.kind {
            FieldKind::Text => {
                let analyzer = Analyzer::from_name(mapping.analyzer.as_deref());
                let indexed: BTreeSet<String> = values
                    .iter()
                    .filter_map(|v| value_as_text(v))
                    .flat_map(|v| analyzer.analyze(&v))
                    .collect();
                let query_tokens: BTreeSet<String> = analyzer.analyze(text).into_iter().collect();
                let hits = query_tokens.iter().filter(|t| indexed.contains(*t)).count();
                Ok((hits > 0).then_some(hits as f64))
            }
            FieldKind::Long | FieldKind::Double => {
                let wanted = parse_number(field, text)?;
                Ok(values
                    .iter()
                    .any(|v| value_as_f64(v) == Some(wanted))
                    .then_some(1.0))
            }
            FieldKind::Keyword | FieldKind::Boolean => Ok(values
                .iter()
                .any(|v| value_as_text(v).as_deref() == Some(text))
                .then_some(1.0)),
        }
    }

    fn score_term(
        &self,
        field: &str,
        term: &Value,
        source: &Value,
    ) -> Result<Option<f64>, SearchIndexError> {
        let Some(mapping) = self.mapping.get(field) else {
            return Ok(None);
        };
        let values = field_values(source, field);

        match mapping.kind {
            FieldKind::Text => {
                let Some(term) = value_as_text(term) else {
                    return Ok(None);
                };
                let analyzer = Analyzer::from_name(mapping.analyzer.as_deref());
                Ok(values
                    .iter()
                    .filter_map(|v| value_as_text(v))
                    .any(|v| analyzer.analyze(&v).contains(&term))
                    .then_some(1.0))
            }
            FieldKind::Long | FieldKind::Double => {
                let wanted = value_as_f64(term).ok_or_else(|| {
                    SearchIndexError::query(format!(
                        "failed to create query: term {} is not a number for field [{}]",
                        term, field
                    ))
                })?;
                Ok(values
                    .iter()
                    .any(|v| value_as_f64(v) == Some(wanted))
                    .then_some(1.0))
            }
            FieldKind::Keyword | FieldKind::Boolean => {
                let term = value_as_text(term);
                Ok(values
                    .iter()
                    .any(|v| term.is_some() && value_as_text(v) == term)
                    .then_some(1.0))
            }
        }
    }

    fn score_range(
        &self,
        field: &str,
        bounds: &RangeBounds,
        source: &Value,
    ) -> Result<Option<f64>, SearchIndexError> {
        let Some(mapping) = self.mapping.get(field) else {
            return Ok(None);
        };
        if !mapping.kind.is_numeric() {
            return Err(SearchIndexError::query(format!(
                "range query on field [{}] of type [{}] is not supported",
                field, mapping.kind
            )));
        }
        Ok(field_values(source, field)
            .iter()
            .filter_map(|v| value_as_f64(v))
            .any(|v| bounds.contains(v))
            .then_some(1.0))
    }

    fn score_bool(
        &self,
        query: &BoolQuery,
        document: &StoredDocument,
    ) -> Result<Option<f64>, SearchIndexError> {
        let mut score = 0.0;

        for clause in &query.must {
            match self.score(clause, document)? {
                Some(s) => score += s,
                None => return Ok(None),
            }
        }
        for clause in &query.filter {
            if self.score(clause, document)?.is_none() {
                return Ok(None);
            }
        }
        for clause in &query.must_not {
            if self.score(clause, document)?.is_some() {
                return Ok(None);
            }
        }

        let mut should_matched = 0;
        for clause in &query.should {
            if let Some(s) = self.score(clause, document)? {
                should_matched += 1;
                score += s;
            }
        }
        if query.must.is_empty()
            && query.filter.is_empty()
            && !query.should.is_empty()
            && should_matched == 0
        {
            return Ok(None);
        }

        if query.must.is_empty() && query.should.is_empty() && query.filter.is_empty() {
            score = 1.0;
        }
        Ok(Some(score))
    }

    fn sort(
        &self,
        matched: &mut [(usize, f64)],
        request: &SearchRequest,
    ) -> Result<(), SearchIndexError> {
        // Resolve every sort field up front so an invalid one fails the request.
        let mut keys: Vec<(Option<FieldKind>, &str, SortDirection)> = Vec::new();
        for sort in &request.sorts {
            if sort.field == "_score" {
                keys.push((None, "_score", sort.direction));
                continue;
            }
            let mapping = self.mapping.get(&sort.field).ok_or_else(|| {
                SearchIndexError::query(format!(
                    "No mapping found for [{}] in order to sort on",
                    sort.field
                ))
            })?;
            if !mapping.kind.has_doc_values() {
                return Err(SearchIndexError::query(format!(
                    "Text fields are not optimised for sorting, field [{}] cannot be sorted on",
                    sort.field
                )));
            }
            keys.push((Some(mapping.kind), sort.field.as_str(), sort.direction));
        }

        matched.sort_by(|a, b| {
            for (kind, field, direction) in &keys {
                let ordering = match kind {
                    None => compare_sort_values(
                        &SortValue::Number(a.1),
                        &SortValue::Number(b.1),
                        *direction,
                    ),
                    Some(kind) => compare_sort_values(
                        &self.sort_value(a.0, field, *kind),
                        &self.sort_value(b.0, field, *kind),
                        *direction,
                    ),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(())
    }

    fn sort_value(&self, position: usize, field: &str, kind: FieldKind) -> SortValue {
        let values = field_values(&self.documents[position].source, field);
        let Some(first) = values.first() else {
            return SortValue::Missing;
        };
        if kind.is_numeric() {
            value_as_f64(first).map_or(SortValue::Missing, SortValue::Number)
        } else {
            value_as_text(first).map_or(SortValue::Missing, SortValue::Text)
        }
    }

    fn aggregate(
        &self,
        request: &AggregationRequest,
        matched: &[(usize, f64)],
    ) -> Result<Aggregation, SearchIndexError> {
        let AggregationRequest::Terms { field, size, .. } = request;

        let Some(mapping) = self.mapping.get(field) else {
            return Ok(Aggregation::Terms(TermsAggregation::default()));
        };
        if !mapping.kind.has_doc_values() {
            return Err(SearchIndexError::query(format!(
                "Text fields are not optimised for aggregations, \
                 field [{}] cannot be aggregated on",
                field
            )));
        }

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for (position, _) in matched {
            let keys: BTreeSet<String> = field_values(&self.documents[*position].source, field)
                .iter()
                .filter_map(|v| bucket_key(v, mapping.kind))
                .collect();
            for key in keys {
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        let numeric = mapping.kind.is_numeric();
        let mut buckets: Vec<TermsBucket> = counts
            .into_iter()
            .map(|(key, doc_count)| TermsBucket { key, doc_count })
            .collect();
        buckets.sort_by(|a, b| {
            b.doc_count
                .cmp(&a.doc_count)
                .then_with(|| compare_keys(&a.key, &b.key, numeric))
        });

        let sum_other_doc_count = buckets.iter().skip(*size).map(|b| b.doc_count).sum();
        buckets.truncate(*size);

        Ok(Aggregation::Terms(TermsAggregation {
            buckets,
            sum_other_doc_count,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

/// Missing values sort last in either direction.
fn compare_sort_values(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (SortValue::Missing, SortValue::Missing) => return Ordering::Equal,
        (SortValue::Missing, _) => return Ordering::Greater,
        (_, SortValue::Missing) => return Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn compare_keys(a: &str, b: &str, numeric: bool) -> Ordering {
    if numeric {
        if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
            return x.total_cmp(&y);
        }
    }
    a.cmp(b)
}

fn bucket_key(value: &Value, kind: FieldKind) -> Option<String> {
    match kind {
        FieldKind::Long => value_as_f64(value).map(|v| (v as i64).to_string()),
        FieldKind::Double => value_as_f64(value).map(|v| v.to_string()),
        _ => value_as_text(value),
    }
}

/// Values of a top-level field, with arrays flattened and nulls dropped.
fn field_values<'a>(source: &'a Value, field: &str) -> Vec<&'a Value> {
    match source.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(value) => vec![value],
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_number(field: &str, text: &str) -> Result<f64, SearchIndexError> {
    text.trim().parse().map_err(|_| {
        SearchIndexError::query(format!(
            "failed to create query: [{}] is not a number for field [{}]",
            text, field
        ))
    })
}

/// Mapping inferred for a field seen for the first time.
fn dynamic_mapping(value: &Value) -> Option<FieldMapping> {
    match value {
        Value::String(_) => Some(FieldMapping::standard_text()),
        Value::Number(n) if n.is_f64() => Some(FieldMapping::double()),
        Value::Number(_) => Some(FieldMapping::long()),
        Value::Bool(_) => Some(FieldMapping::boolean()),
        Value::Array(items) => items.iter().find(|v| !v.is_null()).and_then(dynamic_mapping),
        Value::Null | Value::Object(_) => None,
    }
}

/// Reject values that cannot be indexed under the field's mapping.
fn check_value(
    field: &str,
    mapping: &FieldMapping,
    value: &Value,
) -> Result<(), SearchIndexError> {
    let rejected = |v: &Value| {
        SearchIndexError::index(format!(
            "failed to parse field [{}] of type [{}]: {}",
            field, mapping.kind, v
        ))
    };

    let values = match value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };
    for v in values {
        if v.is_null() {
            continue;
        }
        let valid = match mapping.kind {
            FieldKind::Long | FieldKind::Double => value_as_f64(v).is_some(),
            FieldKind::Boolean => matches!(v, Value::Bool(_))
                || matches!(v.as_str(), Some("true") | Some("false")),
            FieldKind::Text | FieldKind::Keyword => !v.is_object(),
        };
        if !valid {
            return Err(rejected(v));
        }
    }
    Ok(())
}
