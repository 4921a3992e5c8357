//! [`poll_until`] – wait for an external resource to show up.
//!
//! The readiness check runs once immediately.  While it keeps returning `None`
//! the task sleeps for a fixed interval (yielding to the runtime) and checks
//! again, until either the check succeeds or the total time waited exceeds
//! the policy's timeout.  There is no backoff: every gap is exactly one
//! interval.
//!
//! A timeout is therefore reported no earlier than `timeout` and no later
//! than `timeout + interval` after the first check.
//!
//! [`try_poll_until`] is the fallible form: a check that fails ends the wait
//! at once with that failure.
//!
//! Dropping the returned future abandons the wait.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use privacy_bridge::poll::{poll_until, PollPolicy};
//!
//! # tokio_test_block_on(async {
//! let policy = PollPolicy::new(Duration::from_millis(1), Duration::from_millis(10));
//! let mut remaining = 3;
//! let value = poll_until(policy, || {
//!     remaining -= 1;
//!     (remaining == 0).then_some("ready")
//! })
//! .await
//! .unwrap();
//! assert_eq!(value, "ready");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
//! # }
//! ```

use std::convert::Infallible;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::trace;

/// Default spacing between readiness checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Default bound on the total wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Interval and bound for a [`poll_until`] wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_TIMEOUT)
    }
}

/// The check never succeeded within the policy's bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("resource not ready after {waited:?} ({attempts} checks)")]
pub struct PollTimeout {
    pub waited: Duration,
    pub attempts: u32,
}

/// Why a [`try_poll_until`] wait ended without a value.
#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    /// The check kept answering `Ok(None)` past the bound.
    Timeout(PollTimeout),
    /// The check itself failed; no further checks were made.
    Failed(E),
}

/// Run `check` on a fixed interval until it yields a value or `policy.timeout`
/// is exceeded.
pub async fn poll_until<T, F>(policy: PollPolicy, mut check: F) -> Result<T, PollTimeout>
where
    F: FnMut() -> Option<T>,
{
    match try_poll_until(policy, || Ok::<_, Infallible>(check())).await {
        Ok(value) => Ok(value),
        Err(PollError::Timeout(timeout)) => Err(timeout),
        Err(PollError::Failed(never)) => match never {},
    }
}

/// Like [`poll_until`], but stops at the first `Err` the check returns.
pub async fn try_poll_until<T, E, F>(policy: PollPolicy, mut check: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        if let Some(value) = check().map_err(PollError::Failed)? {
            return Ok(value);
        }

        let waited = start.elapsed();
        if waited > policy.timeout {
            return Err(PollError::Timeout(PollTimeout { waited, attempts }));
        }

        trace!(attempts, waited_ms = waited.as_millis() as u64, "resource not ready");
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy::default()
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_check_does_not_sleep() {
        let start = Instant::now();
        let value = poll_until(policy(), || Some(42)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn checks_are_spaced_by_the_interval() {
        let start = Instant::now();
        let mut seen = Vec::new();
        let result = poll_until(policy(), || {
            seen.push(start.elapsed());
            (seen.len() == 4).then_some(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(
            seen,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::from_millis(100),
                Duration::from_millis(150),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_between_bound_and_bound_plus_interval() {
        let p = policy();
        let start = Instant::now();
        let err = poll_until(p, || None::<()>).await.unwrap_err();

        assert!(err.waited >= p.timeout);
        assert!(err.waited <= p.timeout + p.interval);
        assert!(start.elapsed() <= p.timeout + p.interval);
        // One check at t=0 plus one per elapsed interval up to the bound.
        assert_eq!(err.attempts, 102);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_is_honoured() {
        let p = PollPolicy::new(Duration::from_millis(10), Duration::from_millis(35));
        let err = poll_until(p, || None::<()>).await.unwrap_err();
        assert_eq!(err.waited, Duration::from_millis(40));
        assert_eq!(err.attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_check_ends_the_wait_immediately() {
        let start = Instant::now();
        let mut checks = 0;
        let err = try_poll_until(policy(), || {
            checks += 1;
            if checks < 3 { Ok(None::<()>) } else { Err("gone") }
        })
        .await
        .unwrap_err();

        assert_eq!(err, PollError::Failed("gone"));
        assert_eq!(checks, 3);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn fallible_check_times_out_like_the_plain_one() {
        let p = PollPolicy::new(Duration::from_millis(10), Duration::from_millis(35));
        let err = try_poll_until(p, || Ok::<Option<()>, ()>(None)).await.unwrap_err();
        assert_eq!(
            err,
            PollError::Timeout(PollTimeout {
                waited: Duration::from_millis(40),
                attempts: 5,
            })
        );
    }

    #[test]
    fn default_policy_values() {
        let p = PollPolicy::default();
        assert_eq!(p.interval, Duration::from_millis(50));
        assert_eq!(p.timeout, Duration::from_millis(5000));
    }
}
