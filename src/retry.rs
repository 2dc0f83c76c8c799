//! Retry combinators for browser operations that fail transiently.
//!
//! A guarded operation is any closure producing a future over
//! `Result<T, BrowserError>`. [`retry_when`] re-runs it while the failure
//! satisfies a predicate, sleeping a fixed delay between attempts. Once the
//! attempt budget is spent the last failure is wrapped in
//! [`BrowserError::Exhausted`]; any other failure is returned unchanged on the
//! attempt that produced it.
//!
//! Combinators nest. An operation that must survive both timeouts and stale
//! references is wrapped twice:
//!
//! ```ignore
//! retry::on_timeout(&policy, "title", move || {
//!     retry::on_stale(&policy, "title", move || browser.text(locator))
//! })
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::BrowserError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Worst-case time spent sleeping between attempts.
    pub fn total_delay(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Runs `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy's attempts are used up.
pub async fn retry_when<T, F, Fut, P>(
    policy: &RetryPolicy,
    operation: &str,
    is_retryable: P,
    mut op: F,
) -> Result<T, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrowserError>>,
    P: Fn(&BrowserError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        debug!("Attempt {attempt} of {max_attempts} for {operation}");
        match op().await {
            Ok(value) => {
                debug!("{operation} succeeded on attempt {attempt}");
                return Ok(value);
            }
            Err(err) if is_retryable(&err) => {
                warn!("Attempt {attempt}/{max_attempts} failed for {operation}: {err}");
                if attempt >= max_attempts {
                    error!("Exhausted all {max_attempts} attempts for {operation}");
                    return Err(BrowserError::Exhausted {
                        operation: operation.to_string(),
                        attempts: max_attempts,
                        last: Box::new(err),
                    });
                }
                attempt += 1;
                info!("Waiting {:?} before next attempt", policy.delay);
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

pub async fn on_timeout<T, F, Fut>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrowserError>>,
{
    retry_when(policy, operation, BrowserError::is_timeout, op).await
}

pub async fn on_stale<T, F, Fut>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrowserError>>,
{
    retry_when(policy, operation, BrowserError::is_stale, op).await
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn returns_value_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = on_timeout(&fast_policy(), "price", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(BrowserError::timeout("//p"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_last_failure() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = on_stale(&fast_policy(), "title", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BrowserError::StaleElement("//h1".into()))
        })
        .await;

        match result {
            Err(BrowserError::Exhausted { operation, attempts, last }) => {
                assert_eq!(operation, "title");
                assert_eq!(attempts, 3);
                assert!(last.is_stale());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = on_timeout(&fast_policy(), "title", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BrowserError::NoSuchElement("//h1".into()))
        })
        .await;

        assert!(matches!(result, Err(BrowserError::NoSuchElement(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn nested_wrappers_retry_both_kinds() {
        let policy = fast_policy();
        let policy = &policy;
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = on_timeout(policy, "availability", move || {
            on_stale(policy, "availability", move || async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(BrowserError::StaleElement("//button".into())),
                    1 => Err(BrowserError::timeout("//button")),
                    _ => Ok("У кошик"),
                }
            })
        })
        .await;

        assert_eq!(result.unwrap(), "У кошик");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn policy_reads_milliseconds() {
        let policy: RetryPolicy = toml::from_str("max_attempts = 5\ndelay_ms = 250").unwrap();
        assert_eq!(policy, RetryPolicy::new(5, Duration::from_millis(250)));
        assert_eq!(policy.total_delay(), Duration::from_millis(1000));
    }
}
