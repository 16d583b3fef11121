//! Rendering-state predicates over elements.
//!
//! A [`Condition`] is a point-in-time check against the live page; the wait
//! engine re-evaluates it each poll. Handle-based variants tolerate
//! staleness: a vanished node simply fails (or, for [`Condition::Invisible`],
//! satisfies) the check, and the next poll re-resolves through the locator
//! facade.

use crate::locator::{self, Locator};
use crate::result::{EsperaError, EsperaResult};
use crate::session::{DriverSession, ElementHandle};

/// What a condition is checked against: a held handle or a fresh query
#[derive(Debug, Clone)]
pub enum Target {
    /// A handle resolved earlier by the caller
    Element(ElementHandle),
    /// A locator re-resolved on every check
    Query(Locator),
}

impl From<ElementHandle> for Target {
    fn from(handle: ElementHandle) -> Self {
        Self::Element(handle)
    }
}

impl From<Locator> for Target {
    fn from(locator: Locator) -> Self {
        Self::Query(locator)
    }
}

/// A predicate the wait engine can poll until it holds
#[derive(Debug, Clone)]
pub enum Condition {
    /// Element is in the DOM, rendered with non-zero size, not styled hidden
    Visible(Target),
    /// Every element in the sequence is independently visible; vacuously true
    /// for an empty sequence
    AllVisible(Vec<ElementHandle>),
    /// Visible and enabled for interaction
    Clickable(Target),
    /// Absent from the DOM, or present but not visible
    Invisible(Target),
    /// At least one element matches the query right now
    Present(Locator),
}

impl Condition {
    /// Short name used in timeout errors and log events
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Visible(_) => "visible",
            Self::AllVisible(_) => "all visible",
            Self::Clickable(_) => "clickable",
            Self::Invisible(_) => "invisible",
            Self::Present(_) => "present",
        }
    }

    /// Evaluate the condition against the current page state.
    ///
    /// Staleness of a held handle is folded into the boolean; any other
    /// driver fault propagates.
    pub fn is_met<S: DriverSession>(&self, session: &S) -> EsperaResult<bool> {
        match self {
            Self::Visible(target) => match target_handle(session, target)? {
                Some(handle) => Ok(displayed(session, &handle)? == Some(true)),
                None => Ok(false),
            },
            Self::AllVisible(handles) => {
                for handle in handles {
                    if displayed(session, handle)? != Some(true) {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Clickable(target) => match target_handle(session, target)? {
                Some(handle) => Ok(displayed(session, &handle)? == Some(true)
                    && enabled(session, &handle)? == Some(true)),
                None => Ok(false),
            },
            Self::Invisible(target) => match target_handle(session, target)? {
                Some(handle) => Ok(displayed(session, &handle)? != Some(true)),
                None => Ok(true),
            },
            Self::Present(query) => locator::exists(session, query),
        }
    }
}

/// Resolve a target to at most one handle; a query takes its first match.
fn target_handle<S: DriverSession>(
    session: &S,
    target: &Target,
) -> EsperaResult<Option<ElementHandle>> {
    match target {
        Target::Element(handle) => Ok(Some(handle.clone())),
        Target::Query(query) => Ok(locator::resolve(session, query)?.into_iter().next()),
    }
}

/// Displayed state with staleness folded to `None`
fn displayed<S: DriverSession>(
    session: &S,
    handle: &ElementHandle,
) -> EsperaResult<Option<bool>> {
    match session.is_displayed(handle) {
        Ok(displayed) => Ok(Some(displayed)),
        Err(EsperaError::StaleElement { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Enabled state with staleness folded to `None`
fn enabled<S: DriverSession>(
    session: &S,
    handle: &ElementHandle,
) -> EsperaResult<Option<bool>> {
    match session.is_enabled(handle) {
        Ok(enabled) => Ok(Some(enabled)),
        Err(EsperaError::StaleElement { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}
