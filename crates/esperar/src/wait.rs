//! Explicit-wait engine.
//!
//! One [`Waiter::wait_until`] call is a single bounded wait: the condition is
//! re-evaluated at the configured interval until it holds or the timeout
//! elapses. The loop evaluates before it sleeps, so an already-true condition
//! succeeds immediately even with a zero timeout.

use std::thread;
use std::time::{Duration, Instant};

use crate::condition::Condition;
use crate::result::{EsperaError, EsperaResult};
use crate::session::DriverSession;

/// Default timeout for explicit waits (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for explicit waits (500ms).
///
/// Every poll crosses the driver boundary, so the interval is coarser than an
/// in-process check would warrant.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for one bounded wait
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    /// Time spent polling before the condition held
    pub elapsed: Duration,
    /// Condition kind that was waited for
    pub condition: String,
}

/// Polls a condition against a driver session until it holds or times out
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a waiter with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The configured options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Block until `condition` holds, polling the session.
    ///
    /// Evaluation faults are treated as "condition still false" and polling
    /// continues; only timeout expiry surfaces, as
    /// [`EsperaError::WaitTimeout`] carrying the condition kind and the
    /// elapsed time.
    pub fn wait_until<S: DriverSession>(
        &self,
        session: &S,
        condition: &Condition,
    ) -> EsperaResult<WaitOutcome> {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let poll_interval = self.options.poll_interval();

        loop {
            match condition.is_met(session) {
                Ok(true) => {
                    let elapsed = start.elapsed();
                    tracing::trace!(condition = condition.kind(), ?elapsed, "condition held");
                    return Ok(WaitOutcome {
                        elapsed,
                        condition: condition.kind().to_string(),
                    });
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(
                        condition = condition.kind(),
                        error = %err,
                        "evaluation failed; treating as not yet met"
                    );
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::warn!(condition = condition.kind(), ?elapsed, "wait timed out");
                return Err(EsperaError::WaitTimeout {
                    condition: condition.kind().to_string(),
                    elapsed,
                });
            }
            thread::sleep(poll_interval.min(timeout - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;
    use crate::session::{MockElement, MockSession};

    fn fast_waiter(timeout_ms: u64) -> Waiter {
        Waiter::with_options(
            WaitOptions::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(10),
        )
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new().with_timeout(5000).with_poll_interval(100);
            assert_eq!(opts.timeout_ms, 5000);
            assert_eq!(opts.poll_interval_ms, 100);
            assert_eq!(opts.timeout(), Duration::from_millis(5000));
            assert_eq!(opts.poll_interval(), Duration::from_millis(100));
        }
    }

    mod waiter_tests {
        use super::*;

        #[test]
        fn test_already_true_condition_succeeds_immediately() {
            let session = MockSession::new();
            let handle = session.add_element(MockElement::new("btn-1", "button"));
            let outcome = fast_waiter(100)
                .wait_until(&session, &Condition::Visible(handle.into()))
                .unwrap();
            assert!(outcome.elapsed < Duration::from_millis(50));
            assert_eq!(outcome.condition, "visible");
        }

        #[test]
        fn test_zero_timeout_still_evaluates_once() {
            let session = MockSession::new();
            let handle = session.add_element(MockElement::new("btn-1", "button"));
            let result =
                fast_waiter(0).wait_until(&session, &Condition::Visible(handle.into()));
            assert!(result.is_ok());
        }

        #[test]
        fn test_empty_all_visible_is_immediate() {
            let session = MockSession::new();
            let outcome = fast_waiter(0)
                .wait_until(&session, &Condition::AllVisible(Vec::new()))
                .unwrap();
            assert!(outcome.elapsed < Duration::from_millis(10));
        }

        #[test]
        fn test_never_true_condition_times_out_near_deadline() {
            let session = MockSession::new();
            let start = Instant::now();
            let err = fast_waiter(100)
                .wait_until(&session, &Condition::Present(Locator::xpath("//a")))
                .unwrap_err();
            let took = start.elapsed();
            match err {
                EsperaError::WaitTimeout { condition, elapsed } => {
                    assert_eq!(condition, "present");
                    assert!(elapsed >= Duration::from_millis(100));
                }
                other => panic!("expected WaitTimeout, got {other:?}"),
            }
            assert!(took >= Duration::from_millis(100));
            assert!(took < Duration::from_millis(500));
        }

        #[test]
        fn test_condition_becoming_true_is_observed() {
            let session = MockSession::new();
            let mutator = session.clone();
            let flipper = std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                mutator.add_element(MockElement::new("late", "div").matching("//div"));
            });

            let outcome = fast_waiter(500)
                .wait_until(&session, &Condition::Present(Locator::xpath("//div")))
                .unwrap();
            flipper.join().unwrap();
            assert!(outcome.elapsed >= Duration::from_millis(40));
            assert!(outcome.elapsed < Duration::from_millis(500));
        }

        #[test]
        fn test_visible_but_disabled_never_clickable() {
            let session = MockSession::new();
            let handle =
                session.add_element(MockElement::new("btn-1", "button").enabled(false));
            let err = fast_waiter(80)
                .wait_until(&session, &Condition::Clickable(handle.into()))
                .unwrap_err();
            assert!(matches!(err, EsperaError::WaitTimeout { .. }));
        }

        #[test]
        fn test_evaluation_fault_keeps_polling_until_timeout() {
            let session = MockSession::new();
            session.fail_next_find("transient find failure");
            session.add_element(MockElement::new("a-1", "a").matching("//a"));
            // First poll hits the injected fault, later polls succeed.
            let outcome = fast_waiter(200)
                .wait_until(&session, &Condition::Present(Locator::xpath("//a")))
                .unwrap();
            assert!(outcome.elapsed < Duration::from_millis(200));
        }

        #[test]
        fn test_wait_invisible_after_removal() {
            let session = MockSession::new();
            let handle = session.add_element(MockElement::new("spinner", "div"));
            let condition = Condition::Invisible(handle.into());
            assert!(fast_waiter(50).wait_until(&session, &condition).is_err());

            session.remove_element("spinner");
            assert!(fast_waiter(50).wait_until(&session, &condition).is_ok());
        }
    }
}
