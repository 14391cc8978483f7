//! Throttled batch application with retry and per-row fallback.

use crate::config::SyncConfig;
use parking_lot::RwLock;
use quizsync_connector::{ConnectorError, EnvironmentStore};
use quizsync_model::WriteOp;
use std::time::Duration;
use tracing::{debug, warn};

/// One op that could not be applied, with its final error.
#[derive(Debug)]
pub struct FailedOp {
    /// The op that failed.
    pub op: WriteOp,
    /// The error after retries were exhausted.
    pub error: ConnectorError,
}

/// Outcome of applying a run of ops.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Ops applied successfully.
    pub applied: usize,
    /// Ops that failed after retries and fallback.
    pub failed: Vec<FailedOp>,
}

impl BatchReport {
    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.applied += other.applied;
        self.failed.extend(other.failed);
    }

    /// The message of the first fatal (configuration) failure, if any.
    ///
    /// Fatal errors must abort the whole run instead of being contained as
    /// row failures, so callers check this after every execution.
    pub fn fatal_failure(&self) -> Option<String> {
        self.failed
            .iter()
            .find(|f| f.error.is_fatal())
            .map(|f| f.error.to_string())
    }
}

/// Counters for one executor's lifetime (one run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Batches attempted.
    pub batches: u64,
    /// Transient retries performed.
    pub retries: u64,
    /// Batches that degraded to per-op execution.
    pub fallbacks: u64,
}

/// Applies write ops in throttled, fixed-size batches.
///
/// A transient batch failure is retried with exponential backoff up to the
/// configured ceiling; after that (or immediately, for non-transient
/// failures) the batch degrades to per-op execution so the specific failing
/// rows are isolated and the rest of the batch still lands. The inter-batch
/// delay is enforced after every batch, success or failure.
///
/// The executor owns its counters and is constructed per run; there is no
/// process-wide state.
pub struct BatchExecutor {
    config: SyncConfig,
    stats: RwLock<ExecutorStats>,
}

impl BatchExecutor {
    /// Creates an executor for one run.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            stats: RwLock::new(ExecutorStats::default()),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> ExecutorStats {
        *self.stats.read()
    }

    /// Applies all ops against the store.
    pub fn run(&self, store: &dyn EnvironmentStore, ops: &[WriteOp]) -> BatchReport {
        let mut report = BatchReport::default();
        for chunk in ops.chunks(self.config.batch_size) {
            self.stats.write().batches += 1;

            match self.apply_with_retry(store, chunk) {
                Ok(()) => report.applied += chunk.len(),
                Err(err) => {
                    warn!(
                        env = store.name(),
                        size = chunk.len(),
                        error = %err,
                        "batch failed, degrading to per-op execution"
                    );
                    self.stats.write().fallbacks += 1;
                    self.fallback(store, chunk, &mut report);
                }
            }

            // Deliberate backpressure, applied whether or not the batch
            // succeeded.
            self.sleep(self.config.inter_batch_delay);
        }
        report
    }

    /// Applies one batch, retrying transient failures with backoff.
    fn apply_with_retry(
        &self,
        store: &dyn EnvironmentStore,
        ops: &[WriteOp],
    ) -> Result<(), ConnectorError> {
        let mut attempt = 0u32;
        loop {
            match store.apply(ops) {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt + 1 < self.config.retry.max_attempts => {
                    attempt += 1;
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    debug!(
                        env = store.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    self.stats.write().retries += 1;
                    self.sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Re-applies a failed batch one op at a time.
    ///
    /// Ops applied before the batch failed are re-applied here; that is safe
    /// because every op is idempotent.
    fn fallback(&self, store: &dyn EnvironmentStore, ops: &[WriteOp], report: &mut BatchReport) {
        for op in ops {
            match self.apply_with_retry(store, std::slice::from_ref(op)) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(env = store.name(), op = %op.describe(), error = %error, "op failed");
                    report.failed.push(FailedOp {
                        op: op.clone(),
                        error,
                    });
                }
            }
        }
    }

    fn sleep(&self, delay: Duration) {
        if delay > Duration::ZERO {
            std::thread::sleep(delay);
        }
    }
}
