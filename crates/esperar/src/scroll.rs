//! Bounded scroll-until-present retry loop.
//!
//! Unlike the wait engine, each iteration here has an observable side effect:
//! the scroll itself changes what "exists" means. The loop is therefore a
//! small state machine rather than a pure condition poll: it scrolls, sleeps,
//! re-checks presence through the locator facade, and repeats until the
//! target appears or the round bound is exhausted. Only a not-yet-present
//! check is retryable; any driver fault propagates immediately.

use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::locator::{self, Locator};
use crate::result::{EsperaError, EsperaResult};
use crate::session::DriverSession;

/// Default scroll step in pixels per round (dx, dy)
pub const DEFAULT_SCROLL_STEP: (i64, i64) = (100, 1000);

/// Default delay between scroll rounds (3 seconds)
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 3_000;

/// Default bound on scroll rounds before giving up
pub const DEFAULT_MAX_SCROLL_ROUNDS: u32 = 20;

pub(crate) const SCROLL_BY_SCRIPT: &str = "window.scrollBy(arguments[0], arguments[1]);";

/// Issue one scroll command through script execution.
pub(crate) fn scroll_by<S: DriverSession>(session: &S, dx: i64, dy: i64) -> EsperaResult<()> {
    session.execute_script(SCROLL_BY_SCRIPT, &[json!(dx), json!(dy)])?;
    Ok(())
}

/// Options for one scroll-retry invocation
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// Horizontal pixels per scroll round
    pub step_x: i64,
    /// Vertical pixels per scroll round
    pub step_y: i64,
    /// Delay between rounds in milliseconds
    pub delay_ms: u64,
    /// Maximum rounds before giving up
    pub max_rounds: u32,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            step_x: DEFAULT_SCROLL_STEP.0,
            step_y: DEFAULT_SCROLL_STEP.1,
            delay_ms: DEFAULT_SCROLL_DELAY_MS,
            max_rounds: DEFAULT_MAX_SCROLL_ROUNDS,
        }
    }
}

impl ScrollOptions {
    /// Create scroll options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-round scroll step in pixels
    #[must_use]
    pub const fn with_step(mut self, dx: i64, dy: i64) -> Self {
        self.step_x = dx;
        self.step_y = dy;
        self
    }

    /// Set the delay between rounds in milliseconds
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Set the bound on scroll rounds
    #[must_use]
    pub const fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Get the inter-round delay as Duration
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Outcome of a successful scroll-retry
#[derive(Debug, Clone)]
pub struct ScrollOutcome {
    /// Rounds performed before the target appeared
    pub rounds: u32,
    /// Total time spent scrolling and re-checking
    pub elapsed: Duration,
}

/// Loop states: scrolling until the target is found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrollState {
    Scrolling,
    Found,
}

/// Brings an absent element into the DOM by repeated scrolling
#[derive(Debug, Clone, Default)]
pub struct Scroller {
    options: ScrollOptions,
}

impl Scroller {
    /// Create a scroller with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scroller with custom options
    #[must_use]
    pub const fn with_options(options: ScrollOptions) -> Self {
        Self { options }
    }

    /// The configured options
    #[must_use]
    pub const fn options(&self) -> &ScrollOptions {
        &self.options
    }

    /// Scroll until at least one element matches the locator.
    ///
    /// Do-while semantics: at least one scroll is issued before the first
    /// presence check, even if the target is already in the DOM. Exhausting
    /// the round bound surfaces [`EsperaError::ScrollTimeout`].
    pub fn scroll_until_present<S: DriverSession>(
        &self,
        session: &S,
        locator: &Locator,
    ) -> EsperaResult<ScrollOutcome> {
        let start = Instant::now();
        let delay = self.options.delay();
        let mut state = ScrollState::Scrolling;
        let mut rounds = 0_u32;

        loop {
            match state {
                ScrollState::Found => {
                    let elapsed = start.elapsed();
                    tracing::debug!(%locator, rounds, ?elapsed, "target present after scrolling");
                    return Ok(ScrollOutcome { rounds, elapsed });
                }
                ScrollState::Scrolling if rounds >= self.options.max_rounds => {
                    let elapsed = start.elapsed();
                    tracing::warn!(%locator, rounds, ?elapsed, "scroll retry exhausted");
                    return Err(EsperaError::ScrollTimeout { rounds, elapsed });
                }
                ScrollState::Scrolling => {
                    rounds += 1;
                    scroll_by(session, self.options.step_x, self.options.step_y)?;
                    thread::sleep(delay);
                    if locator::exists(session, locator)? {
                        state = ScrollState::Found;
                    } else {
                        tracing::trace!(%locator, round = rounds, "target not present yet");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockElement, MockSession};

    fn fast_scroller(max_rounds: u32) -> Scroller {
        Scroller::with_options(ScrollOptions::new().with_delay(1).with_max_rounds(max_rounds))
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_scroll_options_default() {
            let opts = ScrollOptions::default();
            assert_eq!((opts.step_x, opts.step_y), DEFAULT_SCROLL_STEP);
            assert_eq!(opts.delay_ms, DEFAULT_SCROLL_DELAY_MS);
            assert_eq!(opts.max_rounds, DEFAULT_MAX_SCROLL_ROUNDS);
        }

        #[test]
        fn test_scroll_options_chained() {
            let opts = ScrollOptions::new()
                .with_step(0, 250)
                .with_delay(100)
                .with_max_rounds(5);
            assert_eq!((opts.step_x, opts.step_y), (0, 250));
            assert_eq!(opts.delay(), Duration::from_millis(100));
            assert_eq!(opts.max_rounds, 5);
        }
    }

    mod loop_tests {
        use super::*;

        #[test]
        fn test_target_after_one_scroll_takes_one_round() {
            let session = MockSession::new();
            session.add_element(
                MockElement::new("late", "button")
                    .matching("//button")
                    .appears_after_scrolls(1),
            );
            let outcome = fast_scroller(10)
                .scroll_until_present(&session, &Locator::xpath("//button"))
                .unwrap();
            assert_eq!(outcome.rounds, 1);
            assert_eq!(session.scroll_count(), 1);
        }

        #[test]
        fn test_scrolls_at_least_once_even_if_already_present() {
            let session = MockSession::new();
            session.add_element(MockElement::new("btn-1", "button").matching("//button"));
            let outcome = fast_scroller(10)
                .scroll_until_present(&session, &Locator::xpath("//button"))
                .unwrap();
            assert_eq!(outcome.rounds, 1);
            assert_eq!(session.scroll_count(), 1);
        }

        #[test]
        fn test_exhausted_bound_is_exactly_n_rounds() {
            let session = MockSession::new();
            let err = fast_scroller(4)
                .scroll_until_present(&session, &Locator::xpath("//missing"))
                .unwrap_err();
            match err {
                EsperaError::ScrollTimeout { rounds, .. } => assert_eq!(rounds, 4),
                other => panic!("expected ScrollTimeout, got {other:?}"),
            }
            assert_eq!(session.scroll_count(), 4);
        }

        #[test]
        fn test_target_deep_in_page_found_on_matching_round() {
            let session = MockSession::new();
            session.add_element(
                MockElement::new("deep", "div")
                    .matching("//div")
                    .appears_after_scrolls(3),
            );
            let outcome = fast_scroller(10)
                .scroll_until_present(&session, &Locator::xpath("//div"))
                .unwrap();
            assert_eq!(outcome.rounds, 3);
        }

        #[test]
        fn test_script_fault_propagates_instead_of_retrying() {
            let session = MockSession::new();
            session.fail_next_script("scroll rejected");
            let err = fast_scroller(10)
                .scroll_until_present(&session, &Locator::xpath("//div"))
                .unwrap_err();
            assert!(matches!(err, EsperaError::ScriptExecution { .. }));
            assert_eq!(session.scroll_count(), 0);
        }

        #[test]
        fn test_find_fault_propagates_instead_of_retrying() {
            let session = MockSession::new();
            session.fail_next_find("connection dropped");
            let err = fast_scroller(10)
                .scroll_until_present(&session, &Locator::xpath("//div"))
                .unwrap_err();
            assert!(matches!(err, EsperaError::Session { .. }));
            // The scroll for round one had already been issued.
            assert_eq!(session.scroll_count(), 1);
        }
    }
}
