//! OpenSearch store implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutMappingParts,
        IndicesRefreshParts,
    },
    BulkParts, CountParts, DeleteByQueryParts, DeleteParts, GetParts, IndexParts, OpenSearch,
    SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::DocumentStore;
use crate::mapping::{IndexMapping, IndexSettings};
use crate::opensearch::index_config::{mapping_body, settings_body, OpenSearchConfig};
use crate::opensearch::query_dsl::{
    bulk_body, parse_bulk_response, parse_search_response, query_to_json, search_body,
};
use crate::query::{Query, SearchRequest};
use crate::types::{BatchOperationSummary, IndexOperation, SearchHits};
use crate::utils::{validate_document_id, validate_index_name};

/// OpenSearch store implementation.
///
/// Executes index, document and search operations against a single OpenSearch
/// node over HTTP.
///
/// # Example
///
/// ```ignore
/// use catalog_repository::opensearch::{OpenSearchConfig, OpenSearchStore};
///
/// let store = OpenSearchStore::new(OpenSearchConfig::new("http://localhost:9200"))?;
/// store.ping().await?;
/// ```
pub struct OpenSearchStore {
    client: OpenSearch,
    config: OpenSearchConfig,
}

impl OpenSearchStore {
    /// Create a new OpenSearch store for the configured URL.
    ///
    /// No request is sent; use [`OpenSearchStore::ping`] to check connectivity.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchStore)` - A new store instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub fn new(config: OpenSearchConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            refresh = ?config.refresh,
            "Created OpenSearch store"
        );

        Ok(Self { client, config })
    }

    /// Check that the cluster answers.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping to {} failed with status {}",
                self.config.url, status
            )));
        }

        debug!(url = %self.config.url, "OpenSearch ping succeeded");
        Ok(())
    }

    /// Read the error body of a failed response and log it.
    async fn failure_body(response: Response, operation: &str) -> (u16, String) {
        let (status, error_body) = Self::response_body(response).await;
        Self::log_failure(status, &error_body, operation);
        (status, error_body)
    }

    async fn response_body(response: Response) -> (u16, String) {
        let status = response.status_code().as_u16();
        (status, response.text().await.unwrap_or_default())
    }

    fn log_failure(status: u16, error_body: &str, operation: &str) {
        error!(
            status,
            body = %error_body,
            operation = %operation,
            "OpenSearch request failed"
        );
    }

    async fn read_json(response: Response) -> Result<Value, SearchIndexError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for OpenSearchStore {
    async fn create_index(
        &self,
        index: &str,
        settings: &IndexSettings,
    ) -> Result<bool, SearchIndexError> {
        validate_index_name(index)?;

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings_body(settings))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::response_body(response).await;
            if index_already_exists(status, &error_body) {
                debug!(index = %index, "Index already exists");
                return Ok(false);
            }
            Self::log_failure(status, &error_body, "create_index");
            return Err(SearchIndexError::index_creation(format!(
                "Create index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(
            index = %index,
            shards = settings.number_of_shards,
            replicas = settings.number_of_replicas,
            "Created index"
        );
        Ok(true)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => {
                let (status, error_body) = Self::failure_body(response, "index_exists").await;
                Err(SearchIndexError::unknown(format!(
                    "Index exists check failed with status {}: {}",
                    status, error_body
                )))
            }
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(false);
        }
        if !status.is_success() {
            let (status, error_body) = Self::failure_body(response, "delete_index").await;
            return Err(SearchIndexError::delete(format!(
                "Delete index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Deleted index");
        Ok(true)
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(mapping_body(mapping))
            .send()
            .await
            .map_err(|e| SearchIndexError::mapping(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "put_mapping").await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::mapping(format!(
                "Put mapping on '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        debug!(index = %index, fields = mapping.fields.len(), "Mapping applied");
        Ok(())
    }

    async fn refresh(&self, index: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "refresh").await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::unknown(format!(
                "Refresh of '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchIndexError> {
        validate_index_name(index)?;
        validate_document_id(id)?;

        let mut request = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document.clone());
        if let Some(refresh) = self.config.refresh.as_param() {
            request = request.refresh(refresh);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "index_document").await;
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_id = %id, "Document indexed");
        Ok(())
    }

    async fn bulk_index_documents(
        &self,
        index: &str,
        operations: &[IndexOperation],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        validate_index_name(index)?;
        if operations.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }
        for operation in operations {
            validate_document_id(&operation.id)?;
        }

        let body: Vec<JsonBody<Value>> = bulk_body(operations)
            .into_iter()
            .map(JsonBody::new)
            .collect();

        let mut request = self.client.bulk(BulkParts::Index(index)).body(body);
        if let Some(refresh) = self.config.refresh.as_param() {
            request = request.refresh(refresh);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "bulk_index").await;
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let summary = parse_bulk_response(&Self::read_json(response).await?, operations)?;

        debug!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk index completed"
        );
        Ok(summary)
    }

    async fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<Value>, SearchIndexError> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        // 404 covers both a missing document and a missing index
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let (status, error_body) = Self::failure_body(response, "get_document").await;
            return Err(SearchIndexError::unknown(format!(
                "Get failed with status {}: {}",
                status, error_body
            )));
        }

        let body = Self::read_json(response).await?;
        if body.get("found").and_then(Value::as_bool) == Some(false) {
            return Ok(None);
        }
        Ok(body.get("_source").cloned())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchIndexError> {
        let mut request = self.client.delete(DeleteParts::IndexId(index, id));
        if let Some(refresh) = self.config.refresh.as_param() {
            request = request.refresh(refresh);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if status.as_u16() == 404 {
            return Ok(false);
        }
        if !status.is_success() {
            let (status, error_body) = Self::failure_body(response, "delete_document").await;
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, doc_id = %id, "Document deleted");
        Ok(true)
    }

    async fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError> {
        query.validate().map_err(SearchIndexError::query)?;

        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[index]))
            .body(json!({ "query": query_to_json(query) }))
            .refresh(self.config.refresh.refreshes())
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "delete_by_query").await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::delete(format!(
                "Delete by query failed with status {}: {}",
                status, error_body
            )));
        }

        let body = Self::read_json(response).await?;
        let deleted = body
            .get("deleted")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchIndexError::parse("Delete by query response has no 'deleted'"))?;

        debug!(index = %index, deleted, "Deleted by query");
        Ok(deleted)
    }

    async fn count(&self, index: &str, query: &Query) -> Result<u64, SearchIndexError> {
        query.validate().map_err(SearchIndexError::query)?;

        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(json!({ "query": query_to_json(query) }))
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "count").await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::query(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        Self::read_json(response)
            .await?
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchIndexError::parse("Count response has no 'count'"))
    }

    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchHits, SearchIndexError> {
        request.validate().map_err(SearchIndexError::query)?;

        let body = search_body(request);
        debug!(index = %index, body = %body, "Executing search");

        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::query(e.to_string()))?;

        if !response.status_code().is_success() {
            let (status, error_body) = Self::failure_body(response, "search").await;
            if status == 404 {
                return Err(SearchIndexError::index_not_found(index));
            }
            return Err(SearchIndexError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        parse_search_response(&Self::read_json(response).await?, request)
    }
}

/// Whether a failed create-index response means the index was already there.
fn index_already_exists(status: u16, error_body: &str) -> bool {
    status == 400 && error_body.contains("resource_already_exists_exception")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opensearch::index_config::RefreshPolicy;

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = OpenSearchStore::new(OpenSearchConfig::new("not a url"));
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }

    #[test]
    fn test_new_keeps_config() {
        let config =
            OpenSearchConfig::new("http://localhost:9200").with_refresh(RefreshPolicy::Immediate);
        let store = OpenSearchStore::new(config).unwrap();
        assert_eq!(store.config.refresh, RefreshPolicy::Immediate);
    }

    #[test]
    fn test_index_already_exists_detection() {
        let body = json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": "index [good/abc] already exists"
            },
            "status": 400
        })
        .to_string();
        let body = body.as_str();
        assert!(index_already_exists(400, body));
        assert!(!index_already_exists(500, body));
        assert!(!index_already_exists(
            400,
            r#"{"error":{"type":"illegal_argument_exception"},"status":400}"#
        ));
    }

    #[tokio::test]
    async fn test_writes_validate_before_sending() {
        // Nothing listens on this port; validation must fail before any request.
        let store = OpenSearchStore::new(OpenSearchConfig::new("http://127.0.0.1:1")).unwrap();

        let result = store
            .index_document("Good", "1", &json!({"id": 1}))
            .await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        let result = store
            .bulk_index_documents("good", &[IndexOperation::new("", json!({}))])
            .await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        let summary = store.bulk_index_documents("good", &[]).await.unwrap();
        assert_eq!(summary.total, 0);
    }
}
