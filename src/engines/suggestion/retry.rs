use std::sync::Arc;
use std::time::Duration;

/// Blocking wait between attempts; injectable so tests need not sleep
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

pub fn thread_sleeper() -> Sleeper {
    Arc::new(std::thread::sleep)
}

/// Delay schedule after the k-th failed attempt (k starts at 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    Linear(Duration),
    Exponential { initial: Duration, factor: u32 },
}

impl Backoff {
    pub fn delay(&self, failed_attempts: usize) -> Duration {
        let k = failed_attempts.max(1) as u32;
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Linear(d) => d.saturating_mul(k),
            Backoff::Exponential { initial, factor } => {
                initial.saturating_mul(factor.saturating_pow(k - 1))
            }
        }
    }
}

/// Result of one attempt
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    Retry,
    /// Stop immediately without waiting
    Abort,
}

#[derive(Debug)]
pub struct Retried<T> {
    pub value: Option<T>,
    pub attempts: usize,
}

/// Retry an operation up to `max_attempts` times with a backoff between
/// failures. No wait happens after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Same schedule with a smaller attempt limit
    pub fn limited_to(&self, max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.min(self.max_attempts),
            backoff: self.backoff,
        }
    }

    pub fn run<T, F>(&self, op: F) -> Retried<T>
    where
        F: FnMut(usize) -> Attempt<T>,
    {
        self.run_with_sleeper(op, &|d| std::thread::sleep(d))
    }

    /// `op` receives the 1-based attempt number
    pub fn run_with_sleeper<T, F>(&self, mut op: F, sleep: &dyn Fn(Duration)) -> Retried<T>
    where
        F: FnMut(usize) -> Attempt<T>,
    {
        let mut attempts = 0;
        while attempts < self.max_attempts {
            attempts += 1;
            match op(attempts) {
                Attempt::Success(value) => {
                    return Retried {
                        value: Some(value),
                        attempts,
                    }
                }
                Attempt::Abort => break,
                Attempt::Retry => {
                    if attempts < self.max_attempts {
                        let delay = self.backoff.delay(attempts);
                        log::debug!("Attempt {} failed, retrying in {:?}", attempts, delay);
                        sleep(delay);
                    }
                }
            }
        }
        Retried {
            value: None,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_backoff_schedules() {
        let s = Duration::from_secs(1);
        assert_eq!(Backoff::Fixed(s).delay(3), s);
        assert_eq!(Backoff::Linear(s).delay(3), Duration::from_secs(3));
        let exp = Backoff::Exponential {
            initial: Duration::from_secs(30),
            factor: 2,
        };
        assert_eq!(exp.delay(1), Duration::from_secs(30));
        assert_eq!(exp.delay(2), Duration::from_secs(60));
    }

    #[test]
    fn test_stops_at_limit_and_skips_final_sleep() {
        let slept = RefCell::new(Vec::new());
        let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::from_millis(5)));
        let result: Retried<()> =
            policy.run_with_sleeper(|_| Attempt::Retry, &|d| slept.borrow_mut().push(d));
        assert!(result.value.is_none());
        assert_eq!(result.attempts, 3);
        assert_eq!(slept.borrow().len(), 2);
    }

    #[test]
    fn test_success_short_circuits() {
        let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::ZERO));
        let result = policy.run_with_sleeper(
            |n| if n == 2 { Attempt::Success(n) } else { Attempt::Retry },
            &|_| {},
        );
        assert_eq!(result.value, Some(2));
        assert_eq!(result.attempts, 2);
    }

    #[test]
    fn test_abort_stops_without_sleep() {
        let slept = RefCell::new(0);
        let policy = RetryPolicy::new(3, Backoff::Fixed(Duration::from_secs(1))).limited_to(5);
        assert_eq!(policy.max_attempts, 3);
        let result: Retried<u8> =
            policy.run_with_sleeper(|_| Attempt::Abort, &|_| *slept.borrow_mut() += 1);
        assert_eq!(result.attempts, 1);
        assert_eq!(*slept.borrow(), 0);
    }
}
