//! Driver session boundary.
//!
//! The browser connection is an external collaborator; this module models it
//! as the [`DriverSession`] trait so the wait/retry core can be exercised
//! against a real WebDriver-style backend or against [`MockSession`] in unit
//! tests. The trait is synchronous: every operation here runs on the calling
//! thread, matching the single-threaded cooperative-blocking model of the
//! wait engine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gesture::Gesture;
use crate::locator::Locator;
use crate::result::{EsperaError, EsperaResult};
use crate::wait::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};

/// Opaque reference to a single DOM node as seen by the driver.
///
/// Handles are borrowed from the session for the duration of one operation
/// and are never cached across polling cycles; a handle whose node has been
/// removed or replaced surfaces as [`EsperaError::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

/// Per-session configuration for the wait/interaction layer
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Implicit wait applied to the driver at session setup
    pub implicit_wait: Duration,
    /// Total timeout for explicit waits
    pub wait_timeout: Duration,
    /// Polling interval for explicit waits
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::ZERO,
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl SessionConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the implicit wait applied at session setup
    #[must_use]
    pub const fn with_implicit_wait(mut self, timeout: Duration) -> Self {
        self.implicit_wait = timeout;
        self
    }

    /// Set the total timeout for explicit waits
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the polling interval for explicit waits
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Operations the wait/retry core consumes from the live browser connection.
///
/// Implementations own the wire protocol; the core only assumes exclusive,
/// single-threaded access for the lifetime of a test run.
pub trait DriverSession {
    /// All elements currently matching the locator (possibly none)
    fn find_all(&self, locator: &Locator) -> EsperaResult<Vec<ElementHandle>>;

    /// Whether the element is rendered with non-zero size and not styled
    /// hidden
    fn is_displayed(&self, handle: &ElementHandle) -> EsperaResult<bool>;

    /// Whether the element is enabled for interaction
    fn is_enabled(&self, handle: &ElementHandle) -> EsperaResult<bool>;

    /// Execute JavaScript in the page, returning its result
    fn execute_script(&self, source: &str, args: &[Value]) -> EsperaResult<Value>;

    /// Perform a composed user gesture as one atomic sequence
    fn perform(&self, gesture: &Gesture) -> EsperaResult<()>;

    /// Configure the driver's implicit wait timeout
    fn set_implicit_wait(&mut self, timeout: Duration) -> EsperaResult<()>;
}

// ============================================================================
// Mock session for unit testing
// ============================================================================

/// A scripted element inside a [`MockSession`] page.
#[derive(Debug, Clone)]
pub struct MockElement {
    handle: ElementHandle,
    matches: Vec<String>,
    displayed: bool,
    enabled: bool,
    stale: bool,
    appears_after_scrolls: u32,
}

impl MockElement {
    /// Create a mock element; displayed and enabled by default
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            handle: ElementHandle::new(id, tag_name),
            matches: Vec::new(),
            displayed: true,
            enabled: true,
            stale: false,
            appears_after_scrolls: 0,
        }
    }

    /// Add a locator expression this element matches
    #[must_use]
    pub fn matching(mut self, expression: impl Into<String>) -> Self {
        self.matches.push(expression.into());
        self
    }

    /// Set displayed state
    #[must_use]
    pub const fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    /// Set enabled state
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The element only enters the DOM after this many scroll commands
    #[must_use]
    pub const fn appears_after_scrolls(mut self, scrolls: u32) -> Self {
        self.appears_after_scrolls = scrolls;
        self
    }

    fn in_dom(&self, scroll_count: u32) -> bool {
        !self.stale && scroll_count >= self.appears_after_scrolls
    }
}

#[derive(Debug, Default)]
struct MockState {
    elements: Vec<MockElement>,
    scroll_count: u32,
    call_history: Vec<String>,
    script_results: VecDeque<Value>,
    script_failure: Option<String>,
    find_failure: Option<String>,
    implicit_wait: Option<Duration>,
}

/// In-memory driver session with a scripted page.
///
/// Clones share state, so a test can keep one clone to mutate the page (flip
/// visibility, remove elements) while the robot under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

impl MockSession {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock session state poisoned")
    }

    /// Add an element to the page, returning its handle
    pub fn add_element(&self, element: MockElement) -> ElementHandle {
        let handle = element.handle.clone();
        self.lock().elements.push(element);
        handle
    }

    /// Flip an element's displayed state
    pub fn set_displayed(&self, id: &str, displayed: bool) {
        if let Some(e) = self.lock().elements.iter_mut().find(|e| e.handle.id == id) {
            e.displayed = displayed;
        }
    }

    /// Flip an element's enabled state
    pub fn set_enabled(&self, id: &str, enabled: bool) {
        if let Some(e) = self.lock().elements.iter_mut().find(|e| e.handle.id == id) {
            e.enabled = enabled;
        }
    }

    /// Remove an element from the DOM; outstanding handles become stale
    pub fn remove_element(&self, id: &str) {
        if let Some(e) = self.lock().elements.iter_mut().find(|e| e.handle.id == id) {
            e.stale = true;
        }
    }

    /// Queue a result for the next `execute_script` call
    pub fn push_script_result(&self, result: Value) {
        self.lock().script_results.push_back(result);
    }

    /// Make the next `execute_script` call fail
    pub fn fail_next_script(&self, message: impl Into<String>) {
        self.lock().script_failure = Some(message.into());
    }

    /// Make the next `find_all` call fail
    pub fn fail_next_find(&self, message: impl Into<String>) {
        self.lock().find_failure = Some(message.into());
    }

    /// Recorded calls, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if a call matching the prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock()
            .call_history
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls matching the prefix
    #[must_use]
    pub fn calls(&self, prefix: &str) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Scroll commands observed so far
    #[must_use]
    pub fn scroll_count(&self) -> u32 {
        self.lock().scroll_count
    }

    /// Implicit wait last configured on the session
    #[must_use]
    pub fn implicit_wait(&self) -> Option<Duration> {
        self.lock().implicit_wait
    }

    fn element(state: &MockState, handle: &ElementHandle) -> EsperaResult<MockElement> {
        state
            .elements
            .iter()
            .find(|e| e.handle.id == handle.id && e.in_dom(state.scroll_count))
            .cloned()
            .ok_or_else(|| EsperaError::StaleElement {
                detail: format!("element {}", handle.id),
            })
    }
}

impl DriverSession for MockSession {
    fn find_all(&self, locator: &Locator) -> EsperaResult<Vec<ElementHandle>> {
        let mut state = self.lock();
        state
            .call_history
            .push(format!("find_all:{}", locator.expression()));
        if let Some(message) = state.find_failure.take() {
            return Err(EsperaError::Session { message });
        }
        let scroll_count = state.scroll_count;
        Ok(state
            .elements
            .iter()
            .filter(|e| {
                e.in_dom(scroll_count)
                    && e.matches.iter().any(|m| m.as_str() == locator.expression())
            })
            .map(|e| e.handle.clone())
            .collect())
    }

    fn is_displayed(&self, handle: &ElementHandle) -> EsperaResult<bool> {
        let state = self.lock();
        Ok(Self::element(&state, handle)?.displayed)
    }

    fn is_enabled(&self, handle: &ElementHandle) -> EsperaResult<bool> {
        let state = self.lock();
        Ok(Self::element(&state, handle)?.enabled)
    }

    fn execute_script(&self, source: &str, _args: &[Value]) -> EsperaResult<Value> {
        let mut state = self.lock();
        state.call_history.push(format!("execute_script:{source}"));
        if let Some(message) = state.script_failure.take() {
            return Err(EsperaError::ScriptExecution { message });
        }
        if source.contains("scrollBy") {
            state.scroll_count += 1;
        }
        Ok(state.script_results.pop_front().unwrap_or(Value::Null))
    }

    fn perform(&self, gesture: &Gesture) -> EsperaResult<()> {
        self.lock().call_history.push(format!("perform:{gesture}"));
        Ok(())
    }

    fn set_implicit_wait(&mut self, timeout: Duration) -> EsperaResult<()> {
        let mut state = self.lock();
        state
            .call_history
            .push(format!("set_implicit_wait:{}ms", timeout.as_millis()));
        state.implicit_wait = Some(timeout);
        Ok(())
    }
}
