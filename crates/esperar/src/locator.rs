//! Locator facade: string-addressed element queries.
//!
//! Translates a caller-supplied address (an XPath expression, or the visible
//! text of a link or button) into a query the driver session can resolve.
//! Text-derived queries are built with [`xpath_literal`], never by raw string
//! interpolation, so text containing quote characters cannot break out of the
//! expression.

use crate::result::EsperaResult;
use crate::session::{DriverSession, ElementHandle};

/// An immutable locator expression identifying zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    expression: String,
}

impl Locator {
    /// Create a locator from a raw XPath expression
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Locator for an anchor whose exact text is `text`
    #[must_use]
    pub fn link_text(text: &str) -> Self {
        Self {
            expression: format!("//a[text()={}]", xpath_literal(text)),
        }
    }

    /// Locator for an `<input>` button whose `value` attribute is `text`
    #[must_use]
    pub fn button_value(text: &str) -> Self {
        Self {
            expression: format!("//input[@value={}]", xpath_literal(text)),
        }
    }

    /// The underlying XPath expression
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Quote `text` as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape sequences inside string literals, so text that
/// mixes both quote kinds must be split into a `concat(..)` of single-quoted
/// and double-quoted pieces.
#[must_use]
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    // Mixed quotes: split on apostrophes and stitch them back in
    // double-quoted, e.g. concat('he said ', "'", 'hi"there', "'").
    let mut parts = Vec::new();
    for (i, chunk) in text.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !chunk.is_empty() {
            parts.push(format!("'{chunk}'"));
        }
    }
    format!("concat({})", parts.join(", "))
}

/// Resolve a locator to the elements currently matching it (possibly none).
pub fn resolve<S: DriverSession>(session: &S, locator: &Locator) -> EsperaResult<Vec<ElementHandle>> {
    session.find_all(locator)
}

/// Point-in-time existence check: does at least one element match right now?
///
/// This never polls; it reflects the live page state at the moment of the
/// call.
pub fn exists<S: DriverSession>(session: &S, locator: &Locator) -> EsperaResult<bool> {
    Ok(!resolve(session, locator)?.is_empty())
}

/// Number of elements currently matching the locator (zero included).
pub fn count<S: DriverSession>(session: &S, locator: &Locator) -> EsperaResult<usize> {
    Ok(resolve(session, locator)?.len())
}
