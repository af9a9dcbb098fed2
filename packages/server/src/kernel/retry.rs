//! Bounded retry with exponential backoff for activity calls.
//!
//! Every side-effecting activity runs through `run_with_retry`: each
//! attempt gets its own timeout, transient failures back off
//! exponentially, and exhaustion surfaces a single error the caller
//! decides how to treat (only cover-letter generation is fatal to an
//! instance).

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_attempts: u32,
    /// Hard timeout per attempt, independent of the instance's
    /// multi-week logical lifetime.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(100),
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// Run `op` under the retry policy, returning the first success or the
/// last error once attempts are exhausted.
pub async fn run_with_retry<T, F, Fut>(name: &str, policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = policy.initial_backoff;
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                warn!(activity = name, attempt, error = %e, "activity attempt failed");
                last_err = Some(e);
            }
            Err(_) => {
                warn!(activity = name, attempt, "activity attempt timed out");
                last_err = Some(anyhow!(
                    "attempt timed out after {:?}",
                    policy.attempt_timeout
                ));
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(policy.max_backoff);
        }
    }

    Err(last_err
        .unwrap_or_else(|| anyhow!("no attempts were made"))
        .context(format!(
            "activity {} exhausted {} attempts",
            name, policy.max_attempts
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            max_attempts: 3,
            attempt_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = run_with_retry("flaky", &fast_policy(), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(anyhow!("transient"))
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
    async fn test_exhaustion_returns_last_error() {
        let result: Result<()> = run_with_retry("broken", &fast_policy(), || async {
            Err(anyhow!("permanent"))
        })
        .await;

        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("exhausted 3 attempts"));
        assert!(err.contains("permanent"));
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_retried() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempt_timeout: Duration::from_millis(10),
            ..fast_policy()
        };
        let result = run_with_retry("slow", &policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
