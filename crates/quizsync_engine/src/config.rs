//! Configuration for sync runs.

use std::time::Duration;

/// Configuration for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of statements per batch. Smaller favors resilience on
    /// unreliable remote links, larger favors throughput locally.
    pub batch_size: usize,
    /// Delay enforced after every batch, success or failure, as
    /// backpressure against remote rate limits.
    pub inter_batch_delay: Duration,
    /// Retry behavior for transient failures.
    pub retry: RetryConfig,
    /// Optional cap on questions synced per category.
    pub row_limit: Option<usize>,
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay: Duration::from_millis(500),
            retry: RetryConfig::default(),
            row_limit: None,
        }
    }

    /// A configuration with all delays zeroed, for tests.
    pub fn immediate() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay: Duration::ZERO,
            retry: RetryConfig::default()
                .with_initial_delay(Duration::ZERO)
                .with_max_delay(Duration::ZERO)
                .without_jitter(),
            row_limit: None,
        }
    }

    /// Sets the batch size (minimum 1).
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the inter-batch delay.
    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-category row limit.
    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included).
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a retry configuration with the given attempt ceiling.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Disables jitter, for deterministic tests.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Calculates the delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        if self.add_jitter {
            // Up to 25% jitter
            let jitter = delay_secs * 0.25 * rand_jitter();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Simple deterministic "jitter" (no external RNG dependency).
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_batch_size(5)
            .with_inter_batch_delay(Duration::from_millis(250))
            .with_row_limit(100);

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.inter_batch_delay, Duration::from_millis(250));
        assert_eq!(config.row_limit, Some(100));
    }

    #[test]
    fn batch_size_floor() {
        assert_eq!(SyncConfig::new().with_batch_size(0).batch_size, 1);
    }

    #[test]
    fn retry_delay_backoff_and_cap() {
        let config = RetryConfig::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .without_jitter();

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        // Capped
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(6), Duration::from_millis(300));
    }

    #[test]
    fn immediate_config_has_no_delays() {
        let config = SyncConfig::immediate();
        assert_eq!(config.inter_batch_delay, Duration::ZERO);
        assert_eq!(config.retry.delay_for_attempt(3), Duration::ZERO);
    }
}
