//! Dependency initialization and wiring for the catalog demo.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::DemoError;
use catalog_repository::opensearch::DEFAULT_URL;
use catalog_repository::{
    DocumentStore, GoodRepository, MemoryStore, OpenSearchConfig, OpenSearchStore,
};

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default number of connection retries.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Which store backs the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// In-process store, no cluster needed.
    Memory,
    /// OpenSearch cluster over HTTP.
    OpenSearch,
}

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection up to the configured number of times.
    Retry,
}

/// Demo settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub store: StoreKind,
    pub opensearch_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub max_retries: u32,
    /// Drop the index before creating it.
    pub recreate_index: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            opensearch_url: DEFAULT_URL.to_string(),
            connection_mode: ConnectionMode::FailFast,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            recreate_index: false,
        }
    }
}

impl StoreKind {
    fn parse(value: Option<String>) -> Self {
        match value.unwrap_or_default().to_lowercase().as_str() {
            "" | "memory" => Self::Memory,
            "opensearch" => Self::OpenSearch,
            other => {
                warn!(value = %other, "Invalid CATALOG_STORE, defaulting to 'memory'");
                Self::Memory
            }
        }
    }
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "fail-fast" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "fail-fast".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'fail-fast'");
                Self::FailFast
            }
        }
    }
}

impl DemoConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CATALOG_STORE`: "memory" or "opensearch" (default: memory)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: fail-fast)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `OPENSEARCH_MAX_RETRIES`: Retries before giving up (default: 5)
    /// - `CATALOG_RECREATE_INDEX`: "true" drops the index first (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            store: StoreKind::parse(lookup("CATALOG_STORE")),
            opensearch_url: lookup("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url),
            connection_mode: ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE")),
            retry_interval: lookup("OPENSEARCH_RETRY_INTERVAL_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_interval),
            max_retries: lookup("OPENSEARCH_MAX_RETRIES")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(defaults.max_retries),
            recreate_index: lookup("CATALOG_RECREATE_INDEX")
                .map(|s| matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(defaults.recreate_index),
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The repository the demo runs against.
    pub repository: GoodRepository,
    /// The configuration the dependencies were built from.
    pub config: DemoConfig,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(DemoError)` - If the store cannot be reached
    pub async fn new() -> Result<Self, DemoError> {
        Self::from_config(DemoConfig::from_env()).await
    }

    /// Initialize all dependencies from an explicit configuration.
    pub async fn from_config(config: DemoConfig) -> Result<Self, DemoError> {
        info!(
            store = ?config.store,
            opensearch_url = %config.opensearch_url,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            max_retries = config.max_retries,
            recreate_index = config.recreate_index,
            "Initializing dependencies"
        );

        let store: Arc<dyn DocumentStore> = match config.store {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::OpenSearch => Arc::new(Self::connect_to_opensearch(&config).await?),
        };

        info!(store = ?config.store, "Store ready");

        Ok(Self {
            repository: GoodRepository::new(store),
            config,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(config: &DemoConfig) -> Result<OpenSearchStore, DemoError> {
        let mut attempt: u32 = 0;
        loop {
            match Self::try_connect_opensearch(&config.opensearch_url).await {
                Ok(store) => return Ok(store),
                Err(e) => match config.connection_mode {
                    ConnectionMode::Retry if attempt < config.max_retries => {
                        attempt += 1;
                        warn!(
                            opensearch_url = %config.opensearch_url,
                            error = %e,
                            attempt,
                            max_retries = config.max_retries,
                            retry_interval_secs = config.retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(config.retry_interval).await;
                    }
                    _ => {
                        return Err(DemoError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchStore, DemoError> {
        let store = OpenSearchStore::new(OpenSearchConfig::new(url)).map_err(|e| {
            DemoError::config(format!("Failed to create OpenSearch store: {}", e))
        })?;
        store.ping().await?;

        info!(opensearch_url = %url, "OpenSearch connection established");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DemoConfig::from_lookup(lookup(&[]));
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.connection_mode, ConnectionMode::FailFast);
        assert_eq!(config.retry_interval, Duration::from_secs(15));
        assert_eq!(config.max_retries, 5);
        assert!(!config.recreate_index);
    }

    #[test]
    fn test_overrides() {
        let config = DemoConfig::from_lookup(lookup(&[
            ("CATALOG_STORE", "OpenSearch"),
            ("OPENSEARCH_URL", "http://search:9200"),
            ("OPENSEARCH_CONNECTION_MODE", "retry"),
            ("OPENSEARCH_RETRY_INTERVAL_SECS", "2"),
            ("OPENSEARCH_MAX_RETRIES", "3"),
            ("CATALOG_RECREATE_INDEX", "true"),
        ]));

        assert_eq!(config.store, StoreKind::OpenSearch);
        assert_eq!(config.opensearch_url, "http://search:9200");
        assert_eq!(config.connection_mode, ConnectionMode::Retry);
        assert_eq!(config.retry_interval, Duration::from_secs(2));
        assert_eq!(config.max_retries, 3);
        assert!(config.recreate_index);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = DemoConfig::from_lookup(lookup(&[
            ("CATALOG_STORE", "elastic"),
            ("OPENSEARCH_CONNECTION_MODE", "sometimes"),
            ("OPENSEARCH_RETRY_INTERVAL_SECS", "soon"),
        ]));

        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.connection_mode, ConnectionMode::FailFast);
        assert_eq!(config.retry_interval, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_fail_fast_reports_unreachable_cluster() {
        let config = DemoConfig {
            store: StoreKind::OpenSearch,
            opensearch_url: "http://127.0.0.1:1".to_string(),
            ..DemoConfig::default()
        };

        let result = Dependencies::from_config(config).await;
        assert!(matches!(result, Err(DemoError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_memory_store_needs_no_connection() {
        let deps = Dependencies::from_config(DemoConfig::default()).await.unwrap();
        assert_eq!(deps.repository.index_name(), "good");
    }
}
