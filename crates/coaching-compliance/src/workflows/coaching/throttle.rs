use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Time source for the gate so window accounting can be driven in tests.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sliding-window admission gate shared by every record-source call in a run.
///
/// At most `max_operations` calls are admitted in any `window`; callers over
/// the limit are delayed, never rejected.
#[derive(Debug)]
pub struct RateGate {
    max_operations: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    pub const DEFAULT_MAX_OPERATIONS: usize = 5;
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

    pub fn new(max_operations: usize, window: Duration) -> Self {
        Self::with_clock(max_operations, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_operations: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_operations: max_operations.max(1),
            window,
            clock,
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    /// Blocks until the call fits in the window, then records it.
    pub fn acquire(&self) {
        loop {
            let wait = {
                let mut admitted = self
                    .admitted
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let now = self.clock.now();
                while let Some(oldest) = admitted.front() {
                    if now.saturating_duration_since(*oldest) >= self.window {
                        admitted.pop_front();
                    } else {
                        break;
                    }
                }

                if admitted.len() < self.max_operations {
                    admitted.push_back(now);
                    return;
                }

                match admitted.front() {
                    Some(oldest) => self.window - now.saturating_duration_since(*oldest),
                    None => Duration::ZERO,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "rate gate full; delaying call");
            self.clock.sleep(wait);
        }
    }

    /// Runs `op` once the gate admits it.
    pub fn throttle<T>(&self, op: impl FnOnce() -> T) -> T {
        self.acquire();
        op()
    }

    pub fn in_window(&self) -> usize {
        let admitted = self
            .admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        admitted
            .iter()
            .filter(|at| now.saturating_duration_since(**at) < self.window)
            .count()
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_OPERATIONS, Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Clock that only advances when something sleeps on it.
    #[derive(Debug)]
    pub(crate) struct ManualClock {
        start: Instant,
        elapsed: Mutex<Duration>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.elapsed.lock().expect("clock mutex poisoned") += by;
        }

        pub(crate) fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().expect("clock mutex poisoned").clone()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.elapsed.lock().expect("clock mutex poisoned")
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps
                .lock()
                .expect("clock mutex poisoned")
                .push(duration);
            self.advance(duration);
        }
    }

    #[test]
    fn admits_up_to_limit_without_waiting() {
        let clock = Arc::new(ManualClock::new());
        let gate = RateGate::with_clock(5, Duration::from_secs(1), clock.clone());
        for _ in 0..5 {
            gate.acquire();
        }
        assert!(clock.sleeps().is_empty());
        assert_eq!(gate.in_window(), 5);
    }

    #[test]
    fn sixth_call_waits_for_oldest_to_expire() {
        let clock = Arc::new(ManualClock::new());
        let gate = RateGate::with_clock(5, Duration::from_secs(1), clock.clone());
        gate.acquire();
        clock.advance(Duration::from_millis(300));
        for _ in 0..4 {
            gate.acquire();
        }

        gate.acquire();
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(700)]);
        assert_eq!(gate.in_window(), 5);
    }

    #[test]
    fn expired_calls_free_the_window() {
        let clock = Arc::new(ManualClock::new());
        let gate = RateGate::with_clock(2, Duration::from_secs(1), clock.clone());
        gate.acquire();
        gate.acquire();
        clock.advance(Duration::from_secs(2));
        assert_eq!(gate.in_window(), 0);
        let value = gate.throttle(|| 7);
        assert_eq!(value, 7);
        assert!(clock.sleeps().is_empty());
    }
}
