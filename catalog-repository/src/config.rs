//! Limits applied by `DocumentRepository` before a request reaches the store.

use catalog_shared::MAX_PAGE_SIZE;

/// Default cap on documents per `save_all` call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Repository limits.
///
/// Both limits are checked locally, so an oversized batch or a page past the
/// result window fails with a typed error instead of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Maximum number of entities in one `save_all` call. `None` disables it.
    pub max_batch_size: Option<usize>,
    /// Highest `offset + size` a paged search may reach.
    ///
    /// Mirrors the cluster's `index.max_result_window`, which defaults to
    /// `MAX_PAGE_SIZE`.
    pub max_result_window: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
            max_result_window: MAX_PAGE_SIZE,
        }
    }
}

impl RepositoryConfig {
    /// No batch size limit. The result window keeps its default.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
            ..Self::default()
        }
    }

    /// Default limits with `save_all` capped at `max_batch_size` entities.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
            ..Self::default()
        }
    }

    /// Replace the result window.
    pub fn result_window(mut self, max_result_window: usize) -> Self {
        self.max_result_window = max_result_window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = RepositoryConfig::default();
        assert_eq!(config.max_batch_size, Some(1000));
        assert_eq!(config.max_result_window, 10_000);
    }

    #[test]
    fn test_unlimited_and_custom() {
        assert_eq!(RepositoryConfig::unlimited().max_batch_size, None);

        let config = RepositoryConfig::with_max_batch_size(5).result_window(20);
        assert_eq!(config.max_batch_size, Some(5));
        assert_eq!(config.max_result_window, 20);
    }
}
