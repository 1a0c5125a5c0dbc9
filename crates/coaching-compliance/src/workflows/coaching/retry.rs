use std::fmt::Display;
use std::time::Duration;

use tracing::warn;

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// The last error seen once every attempt has failed.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub last_error: E,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Data-source fetches: three attempts, short pause.
    pub const fn record_fetch() -> Self {
        Self::new(3, Duration::from_millis(500))
    }

    /// Report e-mails: two attempts, two seconds apart.
    pub const fn email_delivery() -> Self {
        Self::new(2, Duration::from_secs(2))
    }

    pub const fn without_delay(self) -> Self {
        Self {
            delay: Duration::ZERO,
            ..self
        }
    }

    /// Runs `op` with the 1-based attempt number until it succeeds or the
    /// attempt budget is spent.
    pub fn run<T, E, F>(&self, label: &str, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        E: std::error::Error + Display + 'static,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        error = %error,
                        "attempt failed"
                    );
                    if attempt >= max_attempts {
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("flaky failure #{0}")]
    struct Flaky(u32);

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::record_fetch().without_delay();
        let mut seen = Vec::new();
        let result = policy.run("fetch", |attempt| {
            seen.push(attempt);
            if attempt < 3 {
                Err(Flaky(attempt))
            } else {
                Ok("records")
            }
        });
        assert_eq!(result.expect("third attempt succeeds"), "records");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn stops_at_the_attempt_bound() {
        let policy = RetryPolicy::email_delivery().without_delay();
        let mut calls = 0;
        let err = policy
            .run("send", |attempt| -> Result<(), Flaky> {
                calls += 1;
                Err(Flaky(attempt))
            })
            .unwrap_err();
        assert_eq!(calls, 2);
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last_error.0, 2);
        assert!(err.to_string().contains("gave up after 2 attempt(s)"));
    }

    #[test]
    fn zero_attempt_budget_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let mut calls = 0;
        let _ = policy.run("noop", |_| -> Result<(), Flaky> {
            calls += 1;
            Err(Flaky(0))
        });
        assert_eq!(calls, 1);
    }
}
