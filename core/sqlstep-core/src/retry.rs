//!
//! Bounded busy-retry around the step primitive.
//!
//! A busy or locked result is retried immediately, up to `max_retry_count`
//! extra attempts. There is no backoff or sleep between attempts; callers who
//! need to wait longer raise the bound or configure an engine busy timeout.
//!

use tracing::warn;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry_count: u32,
}

/// The last busy result once every attempt has been used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub error: EngineError,
}

/// Outcome of running an operation under the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    Exhausted(RetryExhausted),
    Failed(EngineError),
}

impl RetryPolicy {
    pub fn new(max_retry_count: u32) -> Self {
        Self { max_retry_count }
    }

    pub fn run<T, F>(&self, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Result<T, EngineError>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(RetryError::Failed(e)),
                Err(e) if attempts > self.max_retry_count => {
                    return Err(RetryError::Exhausted(RetryExhausted { attempts, error: e }));
                }
                Err(e) => {
                    warn!(
                        attempt = attempts,
                        max_retry_count = self.max_retry_count,
                        error = %e,
                        "engine busy, retrying step"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    fn busy() -> EngineError {
        EngineError::new(EngineErrorKind::Busy, 5, "database is locked")
    }

    fn busy_then_ok(busy_count: u32) -> impl FnMut() -> Result<&'static str, EngineError> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= busy_count { Err(busy()) } else { Ok("row") }
        }
    }

    #[test]
    fn test_success_without_contention() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.run(busy_then_ok(0)), Ok("row"));
    }

    #[test]
    fn test_retries_up_to_bound() {
        for k in 0..5 {
            let policy = RetryPolicy::new(k);
            assert_eq!(policy.run(busy_then_ok(k)), Ok("row"), "bound {k}");
        }
    }

    #[test]
    fn test_gives_up_below_bound() {
        let policy = RetryPolicy::new(2);
        let result = policy.run(busy_then_ok(3));
        match result {
            Err(RetryError::Exhausted(exhausted)) => {
                assert_eq!(exhausted.attempts, 3);
                assert_eq!(exhausted.error, busy());
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn test_non_transient_failure_is_not_retried() {
        let mut calls = 0;
        let policy = RetryPolicy::new(10);
        let result: Result<(), _> = policy.run(|| {
            calls += 1;
            Err(EngineError::new(EngineErrorKind::Constraint, 19, "NOT NULL constraint failed"))
        });
        assert!(matches!(result, Err(RetryError::Failed(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_locked_is_retried() {
        let mut calls = 0;
        let policy = RetryPolicy::new(1);
        let result = policy.run(|| {
            calls += 1;
            if calls == 1 {
                Err(EngineError::new(EngineErrorKind::Locked, 6, "database table is locked"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(2));
    }
}
