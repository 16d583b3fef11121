//! Result and error types for Esperar.

use std::time::Duration;
use thiserror::Error;

/// Result type for Esperar operations
pub type EsperaResult<T> = Result<T, EsperaError>;

/// Errors that can occur while waiting on or interacting with a page
#[derive(Debug, Error)]
pub enum EsperaError {
    /// A bounded wait's condition never became true
    #[error("timed out waiting for {condition} after {elapsed:?}")]
    WaitTimeout {
        /// Condition kind that never held (e.g. "visible", "clickable")
        condition: String,
        /// Time spent polling before giving up
        elapsed: Duration,
    },

    /// Bounded scroll-retry never located the target
    #[error("scroll retry exhausted after {rounds} rounds ({elapsed:?})")]
    ScrollTimeout {
        /// Scroll rounds attempted
        rounds: u32,
        /// Total time spent scrolling and re-checking
        elapsed: Duration,
    },

    /// A previously resolved handle no longer refers to a live DOM node
    #[error("stale element reference: {detail}")]
    StaleElement {
        /// What was being referenced when staleness was detected
        detail: String,
    },

    /// JavaScript execution in the page failed
    #[error("script execution failed: {message}")]
    ScriptExecution {
        /// Error message from the driver
        message: String,
    },

    /// Driver/session-level fault (connection, protocol)
    #[error("session error: {message}")]
    Session {
        /// Error message from the driver
        message: String,
    },

    /// The driver rejected a locator expression
    #[error("invalid locator {expression:?}: {message}")]
    InvalidLocator {
        /// The offending expression
        expression: String,
        /// Why the driver rejected it
        message: String,
    },

    /// JSON error while encoding script arguments or decoding results
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
