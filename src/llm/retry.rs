//! Linear backoff with jitter for retryable LLM failures.

use crate::config::RetryConfig;
use crate::error::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before the attempt following `attempt` (0-based), without jitter.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (attempt + 1)
    }

    /// Delay before the attempt following `attempt`, with 1..=max_jitter whole seconds added.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_secs = self.max_jitter.as_secs();
        let jitter = if jitter_secs == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(rand::thread_rng().gen_range(1..=jitter_secs))
        };
        self.base_delay_for(attempt) + jitter
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or retries run out.
    pub async fn run<F, Fut, T>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{}, {} on attempt {}. Waiting {:?}...",
                        err,
                        label,
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() && self.max_retries > 0 {
                        tracing::error!("max retries exceeded for {}", label);
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.base_delay_secs),
            max_jitter: Duration::from_secs(config.max_jitter_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodegenError;
    use std::cell::Cell;

    fn instant(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            ..RetryPolicy::none()
        }
    }

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_secs(60),
            max_jitter: Duration::from_secs(10),
        };
        assert_eq!(policy.base_delay_for(0), Duration::from_secs(60));
        assert_eq!(policy.base_delay_for(2), Duration::from_secs(180));

        for attempt in 0..5 {
            let delay = policy.delay_for(attempt);
            let base = policy.base_delay_for(attempt);
            assert!(delay >= base + Duration::from_secs(1));
            assert!(delay <= base + Duration::from_secs(10));
        }
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.base_delay, Duration::from_secs(60));
        assert_eq!(policy.max_jitter, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Cell::new(0);
        let result = instant(3)
            .run("task 1", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(CodegenError::RateLimited("429".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let result: Result<()> = instant(2)
            .run("task 1", || {
                calls.set(calls.get() + 1);
                async { Err(CodegenError::NoContentGenerated("blocked".into())) }
            })
            .await;

        assert!(matches!(result, Err(CodegenError::NoContentGenerated(_))));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let calls = Cell::new(0);
        let result: Result<()> = instant(5)
            .run("task 1", || {
                calls.set(calls.get() + 1);
                async { Err(CodegenError::LlmApi("bad request".into())) }
            })
            .await;

        assert!(matches!(result, Err(CodegenError::LlmApi(_))));
        assert_eq!(calls.get(), 1);
    }
}
