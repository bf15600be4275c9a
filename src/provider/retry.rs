//! Retry with exponential backoff for backend calls.

use super::error::Result;
use std::future::Future;
use std::time::Duration;

/// Backoff policy for retrying a failed backend call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Additional attempts after the first (the contract permits one).
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

/// Run `operation`, retrying retryable failures up to `config.max_retries`
/// times with exponential backoff. Non-retryable errors return immediately.
pub async fn retry_with_backoff<T, F, Fut>(mut operation: F, config: &RetryConfig) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = config.initial_backoff;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "backend call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff = backoff.mul_f64(config.multiplier);
            }
            Err(e) => return Err(e),
        }
    }
}
