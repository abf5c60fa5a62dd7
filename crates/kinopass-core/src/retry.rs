// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Retry strategies for transient cache and store failures.
//!
//! All revocation-cache and identity-store I/O goes through a bounded
//! retry: transient connectivity errors back off exponentially, everything
//! else fails immediately. Exhausting the attempts surfaces the last error
//! so call sites can translate it into an unavailability outcome instead of
//! silently succeeding.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Transient;

// =============================================================================
// Retry Configuration
// =============================================================================

/// Tuning knobs for the backoff schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, counting the first (1 = no retries).
    pub max_attempts: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Ceiling on the delay between retries.
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Growth factor applied per attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the attempt budget (floored at one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Overrides the first-retry delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Overrides the delay ceiling.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

// =============================================================================
// Retry Decision
// =============================================================================

/// Outcome of consulting a strategy after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after waiting out the delay.
    Retry(Duration),
    /// Give up and hand the error to the caller.
    DoNotRetry,
}

// =============================================================================
// Retry Strategy Trait
// =============================================================================

/// Policy deciding whether a failed operation gets another attempt.
#[async_trait]
pub trait RetryStrategy: Send + Sync {
    /// Strategy name, carried into log fields.
    fn name(&self) -> &str;

    /// Consulted after each failure.
    ///
    /// `transient` says whether the error class may clear on its own;
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn should_retry(&self, transient: bool, attempt: u32) -> RetryDecision;

    /// Drives an async operation through the policy.
    ///
    /// Resolves with the first success, or with the last error once the
    /// policy declines another attempt.
    async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: Transient + std::fmt::Display + Send,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match self.should_retry(error.is_transient(), attempt) {
                    RetryDecision::Retry(delay) => {
                        tracing::debug!(
                            strategy = %self.name(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "retrying after transient failure"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry => {
                        return Err(error);
                    }
                },
            }
        }
    }
}

// =============================================================================
// Exponential Backoff Strategy
// =============================================================================

/// Doubles (by `multiplier`) the wait between attempts, up to the ceiling:
/// `min(initial_delay * multiplier^(attempt-1), max_delay)`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: RetryConfig,
}

impl ExponentialBackoff {
    /// Creates a strategy over the given schedule.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_delay.as_millis() as f64;
        let grown = initial * self.config.multiplier.powi(attempt.saturating_sub(1) as i32);

        Duration::from_millis(grown.min(self.config.max_delay.as_millis() as f64) as u64)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[async_trait]
impl RetryStrategy for ExponentialBackoff {
    fn name(&self) -> &str {
        "exponential_backoff"
    }

    fn should_retry(&self, transient: bool, attempt: u32) -> RetryDecision {
        if !transient || attempt >= self.config.max_attempts {
            return RetryDecision::DoNotRetry;
        }

        RetryDecision::Retry(self.delay_for(attempt))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_schedule() {
        let config = RetryConfig::default();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay, Duration::from_millis(100));
        assert_eq!(config.multiplier, 2.0);
    }

    #[test]
    fn test_delays_double_up_to_ceiling() {
        let strategy = ExponentialBackoff::new(
            RetryConfig::default()
                .with_max_attempts(10)
                .with_initial_delay(Duration::from_millis(100))
                .with_max_delay(Duration::from_millis(500)),
        );

        assert_eq!(strategy.delay_for(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for(3), Duration::from_millis(400));
        // Capped from the fourth doubling on.
        assert_eq!(strategy.delay_for(4), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(10), Duration::from_millis(500));
    }

    #[test]
    fn test_permanent_errors_are_final() {
        let strategy = ExponentialBackoff::default();
        assert_eq!(strategy.should_retry(false, 1), RetryDecision::DoNotRetry);
    }

    #[test]
    fn test_attempt_budget_is_honored() {
        let strategy = ExponentialBackoff::new(RetryConfig::default().with_max_attempts(3));

        assert!(matches!(
            strategy.should_retry(true, 2),
            RetryDecision::Retry(_)
        ));
        assert_eq!(strategy.should_retry(true, 3), RetryDecision::DoNotRetry);
    }

    fn fast_backoff() -> ExponentialBackoff {
        ExponentialBackoff::new(
            RetryConfig::default()
                .with_max_attempts(3)
                .with_initial_delay(Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let attempts = AtomicU32::new(0);

        let result: Result<i32, CacheError> = fast_backoff()
            .execute(|| {
                let current = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if current < 2 {
                        Err(CacheError::connection("refused"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let attempts = AtomicU32::new(0);

        let result: Result<i32, CacheError> = fast_backoff()
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(CacheError::connection("refused")) }
            })
            .await;

        assert!(matches!(result, Err(CacheError::Connection { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
