//! OpenSearch connection configuration and index request bodies.
//!
//! This module turns the backend-neutral `IndexSettings` and `IndexMapping`
//! into the JSON bodies of the index create and put-mapping APIs.

use opensearch::params::Refresh;
use serde_json::{json, Map, Value};

use crate::mapping::{IndexMapping, IndexSettings};

/// Default OpenSearch URL.
pub const DEFAULT_URL: &str = "http://localhost:9200";

/// When writes become visible to searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Leave refreshing to the cluster's refresh interval.
    None,
    /// Block each write until a refresh makes it visible.
    #[default]
    WaitFor,
    /// Force a refresh after each write.
    Immediate,
}

impl RefreshPolicy {
    /// The `refresh` parameter sent with write requests, if any.
    pub fn as_param(&self) -> Option<Refresh> {
        match self {
            RefreshPolicy::None => None,
            RefreshPolicy::WaitFor => Some(Refresh::WaitFor),
            RefreshPolicy::Immediate => Some(Refresh::True),
        }
    }

    /// Whether a write-by-query should be followed by an explicit refresh.
    pub fn refreshes(&self) -> bool {
        !matches!(self, RefreshPolicy::None)
    }
}

/// Configuration for the OpenSearch store.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// The OpenSearch server URL (e.g., "http://localhost:9200").
    pub url: String,
    /// Refresh behavior of write requests.
    pub refresh: RefreshPolicy,
}

impl OpenSearchConfig {
    /// Create a configuration for `url` with the default refresh policy.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh: RefreshPolicy::default(),
        }
    }

    /// Set the refresh policy.
    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// Body of the create-index request.
pub fn settings_body(settings: &IndexSettings) -> Value {
    json!({
        "settings": {
            "number_of_shards": settings.number_of_shards,
            "number_of_replicas": settings.number_of_replicas
        }
    })
}

/// Body of the put-mapping request.
///
/// Text fields carry their analyzer; other kinds only their type.
pub fn mapping_body(mapping: &IndexMapping) -> Value {
    let properties: Map<String, Value> = mapping
        .fields
        .iter()
        .map(|(name, field)| {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(field.kind.as_str()));
            if let Some(analyzer) = &field.analyzer {
                property.insert("analyzer".to_string(), json!(analyzer));
            }
            (name.clone(), Value::Object(property))
        })
        .collect();

    json!({ "properties": properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldMapping;

    #[test]
    fn test_settings_body() {
        let body = settings_body(&IndexSettings::new(1, 0));

        assert_eq!(body["settings"]["number_of_shards"], 1);
        assert_eq!(body["settings"]["number_of_replicas"], 0);
    }

    #[test]
    fn test_mapping_body() {
        let mapping = IndexMapping::new()
            .field("id", FieldMapping::long())
            .field("title", FieldMapping::text("ik_max_word"))
            .field("price", FieldMapping::double())
            .field("brand", FieldMapping::keyword());

        let body = mapping_body(&mapping);
        let properties = &body["properties"];

        assert_eq!(properties["id"], json!({"type": "long"}));
        assert_eq!(
            properties["title"],
            json!({"type": "text", "analyzer": "ik_max_word"})
        );
        assert_eq!(properties["price"], json!({"type": "double"}));
        assert_eq!(properties["brand"], json!({"type": "keyword"}));
    }

    #[test]
    fn test_refresh_policy() {
        assert_eq!(RefreshPolicy::default(), RefreshPolicy::WaitFor);
        assert!(RefreshPolicy::None.as_param().is_none());
        assert!(matches!(
            RefreshPolicy::Immediate.as_param(),
            Some(Refresh::True)
        ));
        assert!(!RefreshPolicy::None.refreshes());
        assert!(RefreshPolicy::WaitFor.refreshes());
    }

    #[test]
    fn test_default_config() {
        let config = OpenSearchConfig::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.refresh, RefreshPolicy::WaitFor);
    }
}
