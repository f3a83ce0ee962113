//! Bounded retry combinator for asynchronously rendering UI
//!
//! Every poll loop in the harness goes through [`RetryService`]. An attempt
//! that fails with a retryable error is repeated after `poll_interval`; the
//! loop stops when an attempt succeeds, when the attempt or time bound is
//! exceeded (`RetryExhausted`), or immediately when an attempt fails with a
//! non-retryable error.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::TimeoutConfig;
use crate::error::{HarnessError, HarnessResult};

/// How long a transient condition is awaited.
///
/// A policy always has at least one bound, so a retry loop always ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_duration: Option<Duration>,
    max_attempts: Option<NonZeroU32>,
    poll_interval: Duration,
    failure_message: Option<String>,
}

impl RetryPolicy {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Bounded by wall time.
    pub fn duration(max_duration: Duration) -> Self {
        Self {
            max_duration: Some(max_duration),
            max_attempts: None,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            failure_message: None,
        }
    }

    /// Bounded by attempt count; zero is treated as one attempt.
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_duration: None,
            max_attempts: Some(NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN)),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            failure_message: None,
        }
    }

    #[must_use]
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(NonZeroU32::new(max_attempts).unwrap_or(NonZeroU32::MIN));
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts.map(NonZeroU32::get)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        let over_attempts = self.max_attempts.is_some_and(|max| attempts >= max.get());
        let over_time = self.max_duration.is_some_and(|max| elapsed >= max);
        over_attempts || over_time
    }
}

/// The `retry` service handed to page objects and scenarios.
#[derive(Debug, Clone)]
pub struct RetryService {
    try_timeout: Duration,
    wait_for_timeout: Duration,
    poll_interval: Duration,
}

impl RetryService {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            try_timeout: timeouts.try_timeout(),
            wait_for_timeout: timeouts.wait_for_timeout(),
            poll_interval: timeouts.poll_interval(),
        }
    }

    /// Policy for `try` with the configured timeout.
    pub fn default_policy(&self) -> RetryPolicy {
        RetryPolicy::duration(self.try_timeout).with_poll_interval(self.poll_interval)
    }

    /// Retry `op` with the configured default timeout.
    pub async fn try_default<T, F, Fut>(&self, op: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        self.try_with(&self.default_policy(), op).await
    }

    /// Retry `op` until it succeeds or `timeout` passes.
    pub async fn try_for<T, F, Fut>(&self, timeout: Duration, op: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        let policy = RetryPolicy::duration(timeout).with_poll_interval(self.poll_interval);
        self.try_with(&policy, op).await
    }

    /// Like [`try_for`](Self::try_for), but every failure is retried, not
    /// only transient ones. Registry misconfiguration still fails at once.
    pub async fn try_for_time<T, F, Fut>(&self, timeout: Duration, mut op: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        let policy = RetryPolicy::duration(timeout).with_poll_interval(self.poll_interval);
        self.run(&policy, &mut op, |err| !err.is_configuration()).await
    }

    /// Run `op` under `policy`.
    pub async fn try_with<T, F, Fut>(&self, policy: &RetryPolicy, mut op: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        self.run(policy, &mut op, HarnessError::is_retryable).await
    }

    async fn run<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        op: &mut F,
        retryable: impl Fn(&HarnessError) -> bool,
    ) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let err = match op().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!("Succeeded after {} attempts", attempts);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !retryable(&err) {
                return Err(err);
            }

            let elapsed = start.elapsed();
            if policy.exhausted(attempts, elapsed) {
                let message = policy
                    .failure_message
                    .clone()
                    .unwrap_or_else(|| "retry budget exhausted".to_string());
                return Err(HarnessError::RetryExhausted {
                    message,
                    attempts,
                    elapsed,
                    last: Box::new(err),
                });
            }

            warn!("Attempt {} failed, trying again: {}", attempts, err);
            sleep(policy.poll_interval).await;
        }
    }

    /// Poll `predicate` until it returns `true`.
    pub async fn wait_for<F, Fut>(&self, description: &str, predicate: F) -> HarnessResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<bool>>,
    {
        self.wait_for_with_timeout(description, self.wait_for_timeout, predicate)
            .await
    }

    pub async fn wait_for_with_timeout<F, Fut>(
        &self,
        description: &str,
        timeout: Duration,
        mut predicate: F,
    ) -> HarnessResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<bool>>,
    {
        debug!("Waiting up to {:?} for {}", timeout, description);
        let policy = RetryPolicy::duration(timeout)
            .with_poll_interval(self.poll_interval)
            .with_failure_message(format!("timed out waiting for {description}"));
        self.try_with(&policy, move || {
            let check = predicate();
            async move {
                if check.await? {
                    Ok(())
                } else {
                    Err(HarnessError::not_ready(format!("{description} is not true yet")))
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn service() -> RetryService {
        RetryService::new(&TimeoutConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_respects_attempts_and_interval() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::attempts(4).with_poll_interval(Duration::from_millis(250));
        let start = Instant::now();

        let seen = calls.clone();
        let result: HarnessResult<()> = service()
            .try_with(&policy, || {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(HarnessError::not_ready("still loading"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(start.elapsed() >= Duration::from_millis(750));
        match result {
            Err(HarnessError::RetryExhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, HarnessError::NotReady(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::attempts(5).with_poll_interval(Duration::from_millis(10));

        let seen = calls.clone();
        let value = service()
            .try_with(&policy, || {
                let seen = seen.clone();
                async move {
                    let attempt = seen.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 3 {
                        Err(HarnessError::not_ready("not yet"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        let result: HarnessResult<()> = service()
            .try_with(&RetryPolicy::attempts(10), || {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(HarnessError::fatal("definitely wrong"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(HarnessError::Fatal(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_bound_terminates() {
        let policy = RetryPolicy::duration(Duration::from_secs(2))
            .with_poll_interval(Duration::from_millis(300))
            .with_failure_message("New Vis Dialog still not open");
        let start = Instant::now();

        let result: HarnessResult<()> = service()
            .try_with(&policy, || async { Err(HarnessError::not_ready("closed")) })
            .await;

        assert!(start.elapsed() >= Duration::from_secs(2));
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("New Vis Dialog still not open"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_polls_predicate() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        service()
            .wait_for("panel count to be 1", || {
                let seen = seen.clone();
                async move { Ok(seen.fetch_add(1, Ordering::SeqCst) >= 2) }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_for_time_retries_any_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();
        service()
            .try_for_time(Duration::from_secs(5), || {
                let seen = seen.clone();
                async move {
                    if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(HarnessError::fatal("first render is wrong"))
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let result: HarnessResult<()> = service()
            .try_for_time(Duration::from_secs(5), || async {
                Err(HarnessError::CircularDependency {
                    chain: "a -> a".into(),
                })
            })
            .await;
        assert!(matches!(result, Err(HarnessError::CircularDependency { .. })));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::attempts(0).max_attempts(), Some(1));
        assert_eq!(RetryPolicy::attempts(0).max_duration(), None);
    }
}
