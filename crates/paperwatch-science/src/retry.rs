//! Bounded retries with exponential backoff, shared by every flaky remote call.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use paperwatch_core::RetrySettings;
use tokio::time::sleep;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

/// All attempts failed. Carries the error of the last one.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last_error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.initial_backoff())
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Invoke `op` until it succeeds or `max_attempts` calls have failed.
    ///
    /// After failed attempt `n` (except the last) the policy sleeps
    /// `initial_backoff * 2^(n-1)`. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{label}: succeeded on attempt {attempt}/{max_attempts}");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    error!("{label}: could not recover after {attempt} attempts: {e}");
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "{label}: attempt {attempt}/{max_attempts} failed: {e}, retrying in {:.1}s",
                        backoff.as_secs_f64()
                    );
                    sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }

    /// Like [`run`](Self::run), but exhaustion yields `fallback(..)` instead of an error.
    pub async fn run_or_else<T, E, F, Fut, D>(&self, label: &str, op: F, fallback: D) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        D: FnOnce(RetryExhausted<E>) -> T,
    {
        match self.run(label, op).await {
            Ok(value) => value,
            Err(exhausted) => fallback(exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    const BASE: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn first_success_returns_immediately() {
        let policy = RetryPolicy::new(3, BASE);
        let start = Instant::now();
        let value: Result<u32, RetryExhausted<String>> =
            policy.run("ok", |attempt| async move { Ok(attempt) }).await;
        assert_eq!(value.unwrap(), 1);
        assert!(start.elapsed() < BASE);
    }

    #[tokio::test]
    async fn recovers_on_third_attempt() {
        let policy = RetryPolicy::new(3, BASE);
        let value = policy
            .run("flaky", |attempt| async move {
                if attempt < 3 { Err(format!("boom {attempt}")) } else { Ok("done") }
            })
            .await;
        assert_eq!(value.unwrap(), "done");
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts_with_doubling_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, BASE);
        let start = Instant::now();

        let result: Result<(), _> = policy
            .run("always failing", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("unavailable")
                }
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error, "unavailable");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= BASE + BASE * 2);
    }

    #[tokio::test]
    async fn fallback_is_used_on_exhaustion() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let text = policy
            .run_or_else(
                "translate",
                |_| async { Err::<String, _>("quota") },
                |_| "original".to_string(),
            )
            .await;
        assert_eq!(text, "original");
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let policy = RetryPolicy::new(0, BASE);
        let result: Result<(), _> = policy.run("once", |_| async { Err("no") }).await;
        assert_eq!(result.unwrap_err().attempts, 1);
    }

    #[test]
    fn from_settings() {
        let policy = RetryPolicy::from(RetrySettings {
            max_attempts: 5,
            initial_backoff_ms: 250,
        });
        assert_eq!(policy, RetryPolicy::new(5, Duration::from_millis(250)));
    }
}
