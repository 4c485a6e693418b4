//! Translation between the query model and the OpenSearch query DSL.

use catalog_shared::MAX_PAGE_SIZE;
use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;
use crate::query::{
    Aggregation, AggregationRequest, Aggregations, BoolQuery, Query, RangeBounds, SearchRequest,
    TermsAggregation, TermsBucket,
};
use crate::types::{
    BatchOperationResult, BatchOperationSummary, IndexOperation, SearchHit, SearchHits,
};

/// Translate a query into its DSL form.
pub fn query_to_json(query: &Query) -> Value {
    match query {
        Query::MatchAll => json!({ "match_all": {} }),
        Query::Match { field, text } => json!({ "match": { field: { "query": text } } }),
        Query::Term { field, value } => json!({ "term": { field: { "value": value } } }),
        Query::Range { field, bounds } => json!({ "range": { field: range_to_json(bounds) } }),
        Query::Ids { values } => json!({ "ids": { "values": values } }),
        Query::Bool(bool_query) => json!({ "bool": bool_to_json(bool_query) }),
    }
}

fn range_to_json(bounds: &RangeBounds) -> Value {
    let mut range = Map::new();
    for (name, bound) in [
        ("gt", bounds.gt),
        ("gte", bounds.gte),
        ("lt", bounds.lt),
        ("lte", bounds.lte),
    ] {
        if let Some(bound) = bound {
            range.insert(name.to_string(), json!(bound));
        }
    }
    Value::Object(range)
}

fn bool_to_json(query: &BoolQuery) -> Value {
    let mut clauses = Map::new();
    for (occur, queries) in [
        ("must", &query.must),
        ("filter", &query.filter),
        ("should", &query.should),
        ("must_not", &query.must_not),
    ] {
        if !queries.is_empty() {
            let translated: Vec<Value> = queries.iter().map(query_to_json).collect();
            clauses.insert(occur.to_string(), Value::Array(translated));
        }
    }
    Value::Object(clauses)
}

/// Body of a search request.
///
/// Unpaged requests fetch up to `MAX_PAGE_SIZE` hits. Documents missing a sort
/// field sort last.
pub fn search_body(request: &SearchRequest) -> Value {
    let (from, size) = match &request.pageable {
        Some(pageable) => (pageable.offset(), pageable.size),
        None => (0, MAX_PAGE_SIZE),
    };

    let mut body = Map::new();
    body.insert("query".to_string(), query_to_json(&request.query));
    body.insert("from".to_string(), json!(from));
    body.insert("size".to_string(), json!(size));
    body.insert("track_total_hits".to_string(), json!(true));

    if !request.sorts.is_empty() {
        let sorts: Vec<Value> = request
            .sorts
            .iter()
            .map(|sort| {
                if sort.field == "_score" {
                    json!({ "_score": { "order": sort.direction.as_str() } })
                } else {
                    json!({
                        sort.field.as_str(): {
                            "order": sort.direction.as_str(),
                            "missing": "_last"
                        }
                    })
                }
            })
            .collect();
        body.insert("sort".to_string(), Value::Array(sorts));
    }

    if !request.fetch_source {
        body.insert("_source".to_string(), json!(false));
    }

    if !request.aggregations.is_empty() {
        let aggs: Map<String, Value> = request
            .aggregations
            .iter()
            .map(|aggregation| match aggregation {
                AggregationRequest::Terms { name, field, size } => (
                    name.clone(),
                    json!({ "terms": { "field": field, "size": size } }),
                ),
            })
            .collect();
        body.insert("aggs".to_string(), Value::Object(aggs));
    }

    Value::Object(body)
}

/// Parse a search response, reading back the aggregations `request` asked for.
pub fn parse_search_response(
    response: &Value,
    request: &SearchRequest,
) -> Result<SearchHits, SearchIndexError> {
    let hits_section = response
        .get("hits")
        .ok_or_else(|| SearchIndexError::parse("Search response has no 'hits' section"))?;

    let total = match hits_section.get("total") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(total) => total.get("value").and_then(Value::as_u64),
        None => None,
    }
    .ok_or_else(|| SearchIndexError::parse("Search response has no hit total"))?;

    let hits = hits_section
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Search response has no hit list"))?
        .iter()
        .map(parse_hit)
        .collect::<Result<Vec<_>, _>>()?;

    let mut aggregations = Aggregations::new();
    for requested in &request.aggregations {
        let name = requested.name();
        let raw = response
            .get("aggregations")
            .and_then(|aggs| aggs.get(name))
            .ok_or_else(|| {
                SearchIndexError::parse(format!("Search response has no aggregation '{}'", name))
            })?;
        match requested {
            AggregationRequest::Terms { .. } => {
                aggregations.insert(name, Aggregation::Terms(parse_terms(name, raw)?));
            }
        }
    }

    Ok(SearchHits {
        hits,
        total,
        aggregations,
    })
}

fn parse_hit(hit: &Value) -> Result<SearchHit, SearchIndexError> {
    let id = hit
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| SearchIndexError::parse("Search hit has no '_id'"))?;

    Ok(SearchHit {
        id: id.to_string(),
        score: hit.get("_score").and_then(Value::as_f64),
        source: hit.get("_source").cloned(),
    })
}

fn parse_terms(name: &str, raw: &Value) -> Result<TermsAggregation, SearchIndexError> {
    let buckets = raw
        .get("buckets")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SearchIndexError::parse(format!("Terms aggregation '{}' has no buckets", name))
        })?
        .iter()
        .map(|bucket| -> Result<TermsBucket, SearchIndexError> {
            let key = match (bucket.get("key_as_string"), bucket.get("key")) {
                (Some(Value::String(key)), _) | (_, Some(Value::String(key))) => key.clone(),
                (_, Some(key)) if !key.is_null() => key.to_string(),
                _ => {
                    return Err(SearchIndexError::parse(format!(
                        "Bucket of '{}' has no key",
                        name
                    )))
                }
            };
            let doc_count = bucket
                .get("doc_count")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    SearchIndexError::parse(format!(
                        "Bucket '{}' of '{}' has no doc_count",
                        key, name
                    ))
                })?;
            Ok(TermsBucket { key, doc_count })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TermsAggregation {
        buckets,
        sum_other_doc_count: raw
            .get("sum_other_doc_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    })
}

/// Bulk request body: an `index` action line followed by the document, per operation.
pub fn bulk_body(operations: &[IndexOperation]) -> Vec<Value> {
    operations
        .iter()
        .flat_map(|operation| {
            [
                json!({ "index": { "_id": operation.id } }),
                operation.document.clone(),
            ]
        })
        .collect()
}

/// Build the per-item summary of a bulk response.
///
/// Items are matched to operations by position, as the bulk API preserves order.
pub fn parse_bulk_response(
    response: &Value,
    operations: &[IndexOperation],
) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no 'items'"))?;

    if items.len() != operations.len() {
        return Err(SearchIndexError::parse(format!(
            "Bulk response has {} items for {} operations",
            items.len(),
            operations.len()
        )));
    }

    let results = items
        .iter()
        .zip(operations)
        .map(|(item, operation)| {
            let outcome = item.get("index").unwrap_or(item);
            let error = outcome.get("error").map(|error| {
                let reason = error
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                SearchIndexError::index(reason)
            });
            BatchOperationResult {
                id: operation.id.clone(),
                success: error.is_none(),
                error,
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_shared::{Pageable, Sort};

    #[test]
    fn test_query_translation() {
        assert_eq!(
            query_to_json(&Query::matching("title", "小米")),
            json!({"match": {"title": {"query": "小米"}}})
        );
        assert_eq!(
            query_to_json(&Query::term("title", "手机")),
            json!({"term": {"title": {"value": "手机"}}})
        );
        assert_eq!(
            query_to_json(&Query::between("price", 2000.0, 4000.0)),
            json!({"range": {"price": {"gte": 2000.0, "lte": 4000.0}}})
        );
        assert_eq!(
            query_to_json(&Query::ids(["1", "2"])),
            json!({"ids": {"values": ["1", "2"]}})
        );
    }

    #[test]
    fn test_bool_query_skips_empty_clauses() {
        let query: Query = BoolQuery::new()
            .must(Query::term("title", "手机"))
            .must_not(Query::term("brand", "华为"))
            .into();

        assert_eq!(
            query_to_json(&query),
            json!({"bool": {
                "must": [{"term": {"title": {"value": "手机"}}}],
                "must_not": [{"term": {"brand": {"value": "华为"}}}]
            }})
        );
    }

    #[test]
    fn test_search_body_paged_and_sorted() {
        let request = SearchRequest::new(Query::term("title", "手机"))
            .with_pageable(Pageable::of(1, 3))
            .with_sort(Sort::desc("price"));

        let body = search_body(&request);

        assert_eq!(body["from"], 3);
        assert_eq!(body["size"], 3);
        assert_eq!(body["track_total_hits"], true);
        assert_eq!(
            body["sort"],
            json!([{"price": {"order": "desc", "missing": "_last"}}])
        );
        assert!(body.get("_source").is_none());
        assert!(body.get("aggs").is_none());
    }

    #[test]
    fn test_search_body_unpaged_with_aggregation() {
        let request = SearchRequest::match_all()
            .without_source()
            .with_aggregation(AggregationRequest::terms("brands", "brand"));

        let body = search_body(&request);

        assert_eq!(body["from"], 0);
        assert_eq!(body["size"], MAX_PAGE_SIZE);
        assert_eq!(body["_source"], false);
        assert_eq!(
            body["aggs"]["brands"],
            json!({"terms": {"field": "brand", "size": 10}})
        );
    }

    #[test]
    fn test_parse_search_response() {
        let request = SearchRequest::match_all()
            .with_aggregation(AggregationRequest::terms("brands", "brand"));
        let response = json!({
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_id": "1", "_score": 1.5, "_source": {"id": 1}},
                    {"_id": "6", "_score": null}
                ]
            },
            "aggregations": {
                "brands": {
                    "sum_other_doc_count": 0,
                    "buckets": [
                        {"key": "华为", "doc_count": 2},
                        {"key": "apple", "doc_count": 1}
                    ]
                }
            }
        });

        let parsed = parse_search_response(&response, &request).unwrap();

        assert_eq!(parsed.total, 2);
        assert_eq!(parsed.hits[0].id, "1");
        assert_eq!(parsed.hits[0].score, Some(1.5));
        assert_eq!(parsed.hits[0].source, Some(json!({"id": 1})));
        assert_eq!(parsed.hits[1].score, None);
        assert!(parsed.hits[1].source.is_none());

        let brands = parsed.aggregations.terms("brands").unwrap();
        assert_eq!(brands.doc_count("华为"), Some(2));
        assert_eq!(brands.doc_count("apple"), Some(1));
    }

    #[test]
    fn test_parse_search_response_legacy_total_and_numeric_keys() {
        let request =
            SearchRequest::match_all().with_aggregation(AggregationRequest::terms("ids", "id"));
        let response = json!({
            "hits": {"total": 1, "hits": []},
            "aggregations": {"ids": {"buckets": [{"key": 7, "doc_count": 1}]}}
        });

        let parsed = parse_search_response(&response, &request).unwrap();

        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.aggregations.terms("ids").unwrap().doc_count("7"), Some(1));
    }

    #[test]
    fn test_parse_search_response_missing_aggregation() {
        let request = SearchRequest::match_all()
            .with_aggregation(AggregationRequest::terms("brands", "brand"));
        let response = json!({"hits": {"total": {"value": 0}, "hits": []}});

        let result = parse_search_response(&response, &request);
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[test]
    fn test_bulk_body() {
        let operations = vec![IndexOperation::new("1", json!({"id": 1}))];
        assert_eq!(
            bulk_body(&operations),
            vec![json!({"index": {"_id": "1"}}), json!({"id": 1})]
        );
    }

    #[test]
    fn test_parse_bulk_response() {
        let operations = vec![
            IndexOperation::new("1", json!({"price": 1.0})),
            IndexOperation::new("2", json!({"price": "x"})),
        ];
        let response = json!({
            "errors": true,
            "items": [
                {"index": {"_id": "1", "status": 201}},
                {"index": {"_id": "2", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [price] of type [double]"
                }}}
            ]
        });

        let summary = parse_bulk_response(&response, &operations).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        let failure = summary.first_error().unwrap();
        assert_eq!(failure.id, "2");
        assert!(matches!(
            &failure.error,
            Some(SearchIndexError::IndexError(reason)) if reason.contains("price")
        ));
    }
}
