//! Timeout, retry and polling primitives.
//!
//! Every adapter workflow step is a composition of [`poll_until`] and
//! [`call_with_timeout`]; the run loop wraps whole operations in
//! [`call_with_retry`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use crate::outcome::Outcome;

/// Timeout and retry budget for one adapter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicy {
    /// Deadline for a single attempt in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,

    /// Delay between attempts in milliseconds.
    #[serde(default)]
    pub wait_ms: u64,
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retries: 0,
            wait_ms: 0,
        }
    }
}

impl CallPolicy {
    pub const fn new(timeout_ms: u64, retries: u32, wait_ms: u64) -> Self {
        Self {
            timeout_ms,
            retries,
            wait_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

/// Await `call`, turning an elapsed deadline into `{ok: false, timeout: true}`.
pub async fn call_with_timeout<T, F>(label: &str, limit: Duration, call: F) -> Outcome<T>
where
    T: Default,
    F: Future<Output = Outcome<T>>,
{
    let started = Instant::now();
    match timeout(limit, call).await {
        Ok(outcome) => {
            debug!(
                "{} settled in {}ms (ok={})",
                label,
                started.elapsed().as_millis(),
                outcome.ok
            );
            outcome
        }
        Err(_) => {
            warn!("{} timed out after {}ms", label, limit.as_millis());
            Outcome::timed_out(label, limit)
        }
    }
}

/// Issue `call` up to `1 + policy.retries` times, each attempt bounded by
/// the policy timeout.
///
/// Returns the first `ok` outcome, or the last failure.
pub async fn call_with_retry<T, F, Fut>(label: &str, policy: &CallPolicy, mut call: F) -> Outcome<T>
where
    T: Default,
    F: FnMut() -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let attempts = policy.retries.saturating_add(1);
    let mut last = None;

    for attempt in 1..=attempts {
        let attempt_label = format!("{} attempt {}/{}", label, attempt, attempts);
        let outcome = call_with_timeout(&attempt_label, policy.timeout(), call()).await;
        if outcome.ok {
            return outcome;
        }
        warn!(
            "{} failed: {}",
            attempt_label,
            outcome.error.as_deref().unwrap_or("no error detail")
        );
        last = Some(outcome);
        if attempt < attempts {
            sleep(policy.wait()).await;
        }
    }

    last.unwrap_or_else(|| Outcome::failed(format!("{}: no response", label)))
}

/// Run `probe` every `interval` until it yields a value or `limit` elapses.
///
/// The probe always runs at least once.
pub async fn poll_until<T, F, Fut>(limit: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + limit;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// [`poll_until`] for boolean probes.
pub async fn poll_until_true<F, Fut>(limit: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(limit, interval, || {
        let next = probe();
        async move { next.await.then_some(()) }
    })
    .await
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ClickDetail;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_structured_failure() {
        let outcome: Outcome<ClickDetail> =
            call_with_timeout("slow", Duration::from_secs(1), async {
                sleep(Duration::from_secs(5)).await;
                Outcome::success(ClickDetail { clicked: true })
            })
            .await;
        assert!(!outcome.ok);
        assert!(outcome.timeout);
        assert!(!outcome.detail.clicked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_passes_through_fast_result() {
        let outcome = call_with_timeout("fast", Duration::from_secs(1), async {
            Outcome::success(ClickDetail { clicked: true })
        })
        .await;
        assert!(outcome.clicked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let policy = CallPolicy::new(1000, 3, 500);
        let outcome = call_with_retry("flaky", &policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Outcome::failed("not yet")
                } else {
                    Outcome::success(ClickDetail { clicked: true })
                }
            }
        })
        .await;
        assert!(outcome.clicked());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_last_failure() {
        let calls = AtomicU32::new(0);
        let policy = CallPolicy::new(1000, 1, 500);
        let started = Instant::now();
        let outcome: Outcome<ClickDetail> = call_with_retry("dead", &policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Outcome::failed(format!("failure {}", n)) }
        })
        .await;
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("failure 1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_times_out_each_attempt() {
        let policy = CallPolicy::new(200, 1, 0);
        let outcome: Outcome<ClickDetail> = call_with_retry("hang", &policy, || async {
            sleep(Duration::from_secs(60)).await;
            Outcome::success(ClickDetail::default())
        })
        .await;
        assert!(outcome.timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_finds_value() {
        let calls = AtomicU32::new(0);
        let found = poll_until(Duration::from_secs(5), Duration::from_millis(250), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { (n == 3).then_some(n) }
        })
        .await;
        assert_eq!(found, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_gives_up() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let found = poll_until_true(Duration::from_secs(1), Duration::from_millis(250), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;
        assert!(!found);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_policy_durations() {
        let policy = CallPolicy::new(15_000, 1, 500);
        assert_eq!(policy.timeout(), Duration::from_secs(15));
        assert_eq!(policy.wait(), Duration::from_millis(500));
        assert_eq!(CallPolicy::default().timeout_ms, 20_000);
    }
}
