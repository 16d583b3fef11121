//! Public facade for test scripts.
//!
//! A [`Robot`] owns one driver session plus the wait and scroll engines
//! configured for it, and exposes the whole helper surface as thin methods.
//! Interaction ops assume their precondition (usually clickable or visible)
//! already holds, except the by-text click helpers, which embed the wait
//! themselves.

use std::time::Duration;

use crate::condition::Condition;
use crate::gesture::Gesture;
use crate::locator::{self, Locator};
use crate::result::{EsperaError, EsperaResult};
use crate::scroll::{self, ScrollOptions, Scroller};
use crate::session::{DriverSession, ElementHandle, SessionConfig};
use crate::wait::{WaitOptions, Waiter};

const SCRIPT_CLICK: &str = "arguments[0].click();";
const SCRIPT_SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";

/// Wait/interaction helper bound to one driver session.
///
/// The session is held by value: one robot, one exclusive session, no shared
/// global driver state.
#[derive(Debug)]
pub struct Robot<S: DriverSession> {
    session: S,
    waiter: Waiter,
    scroller: Scroller,
}

impl<S: DriverSession> Robot<S> {
    /// Create a robot over the session with default configuration
    #[must_use]
    pub fn new(session: S) -> Self {
        Self {
            session,
            waiter: Waiter::new(),
            scroller: Scroller::new(),
        }
    }

    /// Create a robot with explicit configuration.
    ///
    /// A non-zero implicit wait in the config is applied to the driver here.
    pub fn with_config(mut session: S, config: SessionConfig) -> EsperaResult<Self> {
        if config.implicit_wait > Duration::ZERO {
            session.set_implicit_wait(config.implicit_wait)?;
        }
        let waiter = Waiter::with_options(
            WaitOptions::new()
                .with_timeout(config.wait_timeout.as_millis() as u64)
                .with_poll_interval(config.poll_interval.as_millis() as u64),
        );
        Ok(Self {
            session,
            waiter,
            scroller: Scroller::new(),
        })
    }

    /// Replace the scroll-retry options
    #[must_use]
    pub fn with_scroll_options(mut self, options: ScrollOptions) -> Self {
        self.scroller = Scroller::with_options(options);
        self
    }

    /// Borrow the underlying session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Borrow the underlying session mutably
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Release the underlying session
    pub fn into_session(self) -> S {
        self.session
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    /// Configure the driver's implicit wait timeout
    pub fn implicitly_wait(&mut self, timeout: Duration) -> EsperaResult<()> {
        self.session.set_implicit_wait(timeout)
    }

    /// Block until the element is visible
    pub fn wait_visible(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.wait(&Condition::Visible(handle.clone().into()))
    }

    /// Block until every element in the slice is visible
    pub fn wait_all_visible(&self, handles: &[ElementHandle]) -> EsperaResult<()> {
        self.wait(&Condition::AllVisible(handles.to_vec()))
    }

    /// Block until the element is visible and enabled
    pub fn wait_clickable(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.wait(&Condition::Clickable(handle.clone().into()))
    }

    /// Block until the element is absent or hidden
    pub fn wait_invisible(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.wait(&Condition::Invisible(handle.clone().into()))
    }

    /// Block until no element matching the XPath is visible
    pub fn wait_invisible_by_xpath(&self, xpath: &str) -> EsperaResult<()> {
        self.wait(&Condition::Invisible(Locator::xpath(xpath).into()))
    }

    fn wait(&self, condition: &Condition) -> EsperaResult<()> {
        self.waiter.wait_until(&self.session, condition)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Point-in-time queries
    // ------------------------------------------------------------------

    /// Does at least one element match the XPath right now?
    pub fn exists_by_xpath(&self, xpath: &str) -> EsperaResult<bool> {
        locator::exists(&self.session, &Locator::xpath(xpath))
    }

    /// Number of elements matching the XPath right now
    pub fn count_by_xpath(&self, xpath: &str) -> EsperaResult<usize> {
        locator::count(&self.session, &Locator::xpath(xpath))
    }

    // ------------------------------------------------------------------
    // Interaction ops
    // ------------------------------------------------------------------

    /// Double-click the element
    pub fn double_click(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.session
            .perform(&Gesture::new().move_to(handle).double_click())
    }

    /// Move the pointer over the element
    pub fn move_to(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.session.perform(&Gesture::new().move_to(handle))
    }

    /// Focus the element and type into it, as one composed gesture
    pub fn focus_and_type(&self, handle: &ElementHandle, text: &str) -> EsperaResult<()> {
        self.session
            .perform(&Gesture::new().move_to(handle).click().keys(text))
    }

    /// Click the element through page-level script execution.
    ///
    /// Bypasses native click eligibility; use when an overlay or animation
    /// blocks the pointer.
    pub fn click_via_script(&self, handle: &ElementHandle) -> EsperaResult<()> {
        self.session
            .execute_script(SCRIPT_CLICK, &[serde_json::to_value(handle)?])?;
        Ok(())
    }

    /// Wait for an anchor with this exact text to be clickable, then click it
    pub fn click_link_by_text(&self, text: &str) -> EsperaResult<()> {
        self.click_by_locator(&Locator::link_text(text))
    }

    /// Wait for an `<input>` button with this value text to be clickable,
    /// then click it
    pub fn click_button_by_text(&self, text: &str) -> EsperaResult<()> {
        self.click_by_locator(&Locator::button_value(text))
    }

    fn click_by_locator(&self, locator: &Locator) -> EsperaResult<()> {
        self.waiter
            .wait_until(&self.session, &Condition::Clickable(locator.clone().into()))?;
        // Re-resolve rather than clicking a handle cached during the wait.
        let handle = locator::resolve(&self.session, locator)?
            .into_iter()
            .next()
            .ok_or_else(|| EsperaError::StaleElement {
                detail: format!("element matching {locator}"),
            })?;
        self.session.perform(&Gesture::new().move_to(&handle).click())
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Scroll the page by a pixel delta
    pub fn scroll_by(&self, dx: i64, dy: i64) -> EsperaResult<()> {
        scroll::scroll_by(&self.session, dx, dy)
    }

    /// Scroll back to the page origin
    pub fn scroll_to_top(&self) -> EsperaResult<()> {
        self.session.execute_script(SCRIPT_SCROLL_TO_TOP, &[])?;
        Ok(())
    }

    /// Scroll in bounded rounds until an element matches the XPath
    pub fn scroll_until_visible(&self, xpath: &str) -> EsperaResult<()> {
        self.scroller
            .scroll_until_present(&self.session, &Locator::xpath(xpath))?;
        Ok(())
    }
}
