// src/tools/async_support.rs
//! Async helpers shared by the API client, the ledger pollers and the
//! transaction builder.

use crate::core::errors::BridgeError;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::info;

pub type AsyncResult<T> = Result<T, BridgeError>;

/// Upper bound on a single operation.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
    pub operation_name: String,
}

impl TimeoutConfig {
    pub fn new(duration: Duration, operation_name: impl Into<String>) -> Self {
        Self { duration, operation_name: operation_name.into() }
    }

    /// 5 seconds
    pub fn short(operation_name: impl Into<String>) -> Self {
        Self::new(Duration::from_secs(5), operation_name)
    }
}

pub struct AsyncExecutor;

impl AsyncExecutor {
    /// Runs `future`, failing with [`BridgeError::Timeout`] once the deadline passes.
    pub async fn execute_with_timeout<F, T>(future: F, config: TimeoutConfig) -> AsyncResult<T>
    where
        F: Future<Output = AsyncResult<T>>,
    {
        match timeout(config.duration, future).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(format!(
                "Operation '{}' timed out after {:?}",
                config.operation_name, config.duration
            ))),
        }
    }

    /// Retries transient failures with exponential backoff. Non-retryable
    /// errors are returned immediately.
    pub async fn retry<F, Fut, T>(
        mut operation: F,
        max_attempts: usize,
        delay: Duration,
    ) -> AsyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AsyncResult<T>>,
    {
        let mut current_delay = delay;
        let mut last_error: Option<BridgeError> = None;

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = Some(e);
                    if attempt < max_attempts {
                        info!(
                            "Operation failed (attempt {}/{}). Retrying in {:?}...",
                            attempt, max_attempts, current_delay
                        );
                        tokio::time::sleep(current_delay).await;
                        const MAX_DELAY: Duration = Duration::from_secs(30);
                        current_delay = (current_delay * 2).min(MAX_DELAY);
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BridgeError::Network("Retry operation failed".to_string())))
    }
}

/// Measures and logs how long a bridge operation took.
pub struct AsyncPerformanceMonitor {
    start_time: Instant,
    operation_name: String,
}

impl AsyncPerformanceMonitor {
    pub fn start(operation_name: impl Into<String>) -> Self {
        Self { start_time: Instant::now(), operation_name: operation_name.into() }
    }

    pub fn finish(self) {
        let duration = self.start_time.elapsed();
        info!(operation = %self.operation_name, ?duration, "Async operation completed");
    }

    pub fn finish_with_duration(self) -> Duration {
        let duration = self.start_time.elapsed();
        info!(operation = %self.operation_name, ?duration, "Async operation completed");
        duration
    }
}
