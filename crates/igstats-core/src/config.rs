//! Retry and backoff configuration.
//!
//! The original scripts disagree on every bound (unbounded in the most
//! permissive variant, small constants elsewhere), so all of them are
//! configuration with documented defaults.

use std::time::Duration;

/// Bounds and waits for every retryable step of a run.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum login attempts when the source reports transient connection
    /// errors. Bad credentials are never retried. Default: 3.
    pub max_login_attempts: u32,
    /// Maximum re-authentication + re-fetch cycles after a connection loss
    /// during one list collection. Default: 3.
    pub max_reconnects: u32,
    /// Retry budget for incomplete collections (fewer identifiers than the
    /// profile advertises). Once exhausted the partial result is accepted
    /// with a warning. Default: 5.
    pub max_collect_retries: u32,
    /// Base wait before re-querying an incomplete collection; grows by 10
    /// seconds for every ten attempts. Default: 60 seconds.
    pub base_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 3,
            max_reconnects: 3,
            max_collect_retries: 5,
            base_wait: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Creates a config with custom bounds.
    pub fn new(
        max_login_attempts: u32,
        max_reconnects: u32,
        max_collect_retries: u32,
        base_wait: Duration,
    ) -> Self {
        Self {
            max_login_attempts,
            max_reconnects,
            max_collect_retries,
            base_wait,
        }
    }

    /// Config with all waits zeroed, for tests.
    pub fn without_waits() -> Self {
        Self {
            base_wait: Duration::ZERO,
            ..Self::default()
        }
    }
}
