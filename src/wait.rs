//! Bounded polling for conditions on a UI that renders asynchronously.
//!
//! Every wait has a hard deadline. A probe is retried only while it fails with
//! a transient error (see [`Error::is_transient`]); anything else ends the wait
//! on the spot.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::{Error, Result};

/// Default time budget for an element wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between two probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timeout and poll interval used by a page for all of its lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs `probe` until it succeeds or the deadline passes.
    ///
    /// On expiry the last transient error is returned with the elapsed time
    /// recorded in it. The pause before the last probe is clamped to the time
    /// left, so a failing wait ends no earlier than `timeout` and no later than
    /// `timeout + poll_interval` plus one probe.
    pub async fn until<T, F, Fut>(&self, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match probe().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    let elapsed = start.elapsed();
                    if elapsed >= self.timeout {
                        tracing::debug!(attempts, ?elapsed, "wait expired: {err}");
                        return Err(err.with_elapsed(elapsed));
                    }
                    let remaining = self.timeout - elapsed;
                    sleep(self.poll_interval.min(remaining)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Polls a boolean predicate until it holds.
    pub async fn until_true<F, Fut>(&self, condition: &str, mut predicate: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.until(|| {
            let check = predicate();
            async move {
                if check.await? {
                    Ok(())
                } else {
                    Err(Error::Timeout {
                        condition: condition.to_string(),
                        elapsed: Duration::ZERO,
                    })
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::locator::Locator;

    const MISSING: Locator = Locator::id("org.wikipedia:id/missing");

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let calls = Cell::new(0);
        let policy = WaitPolicy::default();
        let value = policy
            .until(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(Error::not_found(&MISSING))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_matching_probe_fails_within_one_poll_of_the_deadline() {
        let policy = WaitPolicy::new(Duration::from_secs(10), Duration::from_millis(700));
        let start = Instant::now();
        let err = policy
            .until(|| async { Err::<(), _>(Error::not_found(&MISSING)) })
            .await
            .unwrap_err();
        let waited = start.elapsed();

        assert!(waited >= policy.timeout, "gave up early: {waited:?}");
        assert!(waited <= policy.timeout + policy.poll_interval, "overran: {waited:?}");
        match err {
            Error::ElementNotFound { locator, elapsed, .. } => {
                assert_eq!(locator, MISSING);
                assert!(elapsed >= policy.timeout);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_stop_the_wait_immediately() {
        let start = Instant::now();
        let err = WaitPolicy::default()
            .until(|| async { Err::<(), _>(Error::SessionUnavailable("closed".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionUnavailable(_)));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn until_true_reports_the_condition() {
        let policy = WaitPolicy::default().with_timeout(Duration::from_secs(3));
        let err = policy
            .until_true("package to be org.wikipedia", || async { Ok(false) })
            .await
            .unwrap_err();
        match err {
            Error::Timeout { condition, elapsed } => {
                assert_eq!(condition, "package to be org.wikipedia");
                assert!(elapsed >= Duration::from_secs(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
