//! Retry with exponential backoff for fallible consumer operations, before
//! a message is rejected to the DLQ.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T, E>(operation: F, config: &RetryConfig, context: &str) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + Send,
{
    let mut attempt = 0;
    let mut backoff = config.initial_backoff;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(context, attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= config.max_attempts {
                    warn!(context, attempts = attempt, error = %e, "operation failed after max retries");
                    return Err(e);
                }
                warn!(
                    context,
                    attempt,
                    max_attempts = config.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "operation failed, retrying with backoff"
                );
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, config.max_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn succeeds_after_two_failures() {
        let config = RetryConfig {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        };
        let attempts = Arc::new(Mutex::new(0));
        let a = attempts.clone();
        let result = retry_with_backoff(
            || {
                let a = a.clone();
                async move {
                    let mut n = a.lock().unwrap();
                    *n += 1;
                    if *n < 3 {
                        Err("not yet")
                    } else {
                        Ok(42)
                    }
                }
            },
            &config,
            "test",
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn exhausts_and_returns_err() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        };
        let result: Result<i32, &str> =
            retry_with_backoff(|| async { Err("always fails") }, &config, "test").await;
        assert_eq!(result, Err("always fails"));
    }
}
