//! Read retry over an environment store.

use crate::config::RetryConfig;
use parking_lot::RwLock;
use quizsync_connector::{ConnectorResult, EnvironmentStore};
use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord, WriteOp};
use std::time::Duration;
use tracing::debug;

/// Wraps a store so transient read failures are retried with backoff.
///
/// Reads have the same exposure to network trouble as writes, so the runner
/// routes every connector read through this wrapper. Writes pass through
/// unretried: `apply` retry belongs to the [`BatchExecutor`], which also owns
/// the degrade-to-per-op fallback.
///
/// [`BatchExecutor`]: crate::executor::BatchExecutor
pub struct RetryingStore<'a> {
    inner: &'a dyn EnvironmentStore,
    retry: RetryConfig,
    retries: RwLock<u64>,
}

impl<'a> RetryingStore<'a> {
    /// Wraps a store with the given retry policy.
    pub fn new(inner: &'a dyn EnvironmentStore, retry: RetryConfig) -> Self {
        Self {
            inner,
            retry,
            retries: RwLock::new(0),
        }
    }

    /// Read retries performed so far.
    pub fn retries(&self) -> u64 {
        *self.retries.read()
    }

    fn with_retry<T>(&self, mut read: impl FnMut() -> ConnectorResult<T>) -> ConnectorResult<T> {
        let mut attempt = 0u32;
        loop {
            match read() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    attempt += 1;
                    let delay = self.retry.delay_for_attempt(attempt);
                    debug!(
                        env = self.inner.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient read failure, retrying"
                    );
                    *self.retries.write() += 1;
                    if delay > Duration::ZERO {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl EnvironmentStore for RetryingStore<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn apply(&self, ops: &[WriteOp]) -> ConnectorResult<()> {
        self.inner.apply(ops)
    }

    fn categories(&self) -> ConnectorResult<Vec<CategoryRecord>> {
        self.with_retry(|| self.inner.categories())
    }

    fn category_by_id(&self, id: &str) -> ConnectorResult<Option<CategoryRecord>> {
        self.with_retry(|| self.inner.category_by_id(id))
    }

    fn categories_by_code(&self, code: &str) -> ConnectorResult<Vec<CategoryRecord>> {
        self.with_retry(|| self.inner.categories_by_code(code))
    }

    fn items(&self, category_id: &str) -> ConnectorResult<Vec<ItemRecord>> {
        self.with_retry(|| self.inner.items(category_id))
    }

    fn sub_items(&self, category_id: &str) -> ConnectorResult<Vec<SubItemRecord>> {
        self.with_retry(|| self.inner.sub_items(category_id))
    }

    fn count_items(&self, category_id: &str) -> ConnectorResult<u64> {
        self.with_retry(|| self.inner.count_items(category_id))
    }

    fn count_active_items(&self, category_id: &str) -> ConnectorResult<u64> {
        self.with_retry(|| self.inner.count_active_items(category_id))
    }

    fn count_sub_items(&self, category_id: &str) -> ConnectorResult<u64> {
        self.with_retry(|| self.inner.count_sub_items(category_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizsync_connector::MemoryStore;

    fn category(id: &str, code: &str) -> CategoryRecord {
        CategoryRecord {
            id: id.into(),
            code: code.into(),
            name: code.into(),
            description: None,
            dimensions: None,
            scoring_type: None,
            min_score: 0,
            max_score: 100,
            estimated_time: None,
            is_active: true,
            sort_order: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn immediate_retry() -> RetryConfig {
        RetryConfig::default()
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO)
            .without_jitter()
    }

    #[test]
    fn transient_reads_are_retried() {
        let store = MemoryStore::new("staging");
        store.seed(vec![category("cat_a", "a")], vec![], vec![]);
        store.inject_read_transient(2);

        let retrying = RetryingStore::new(&store, immediate_retry());
        assert_eq!(retrying.categories().unwrap().len(), 1);
        assert_eq!(retrying.retries(), 2);
    }

    #[test]
    fn retries_exhaust_to_the_last_error() {
        let store = MemoryStore::new("staging");
        store.inject_read_transient(5);

        // Default ceiling is 3 attempts.
        let retrying = RetryingStore::new(&store, immediate_retry());
        assert!(retrying.categories().unwrap_err().is_retryable());
        assert_eq!(retrying.retries(), 2);
    }

    #[test]
    fn writes_pass_through_unretried() {
        let store = MemoryStore::new("staging");
        store.inject_transient(1);

        let retrying = RetryingStore::new(&store, immediate_retry());
        let op = WriteOp::UpsertCategory(category("cat_a", "a"));
        assert!(retrying.apply(std::slice::from_ref(&op)).is_err());
        assert_eq!(store.apply_calls(), 1);
    }
}
