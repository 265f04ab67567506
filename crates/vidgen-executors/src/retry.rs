//! Transport-level retry with exponential backoff.

use std::time::Duration;

use tracing::warn;

use crate::error::{ExecutorError, ExecutorResult};

/// Bounded retry policy shared by the executor clients.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds).
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl RetryPolicy {
    /// Execute an async operation, retrying retryable errors only.
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> ExecutorResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ExecutorResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = %operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Executor call failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ExecutorError::request_failed("Unknown error")))
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay_ms.saturating_mul(2u64.pow(attempt));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}
