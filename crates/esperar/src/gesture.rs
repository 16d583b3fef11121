//! Gesture primitives for composed user input.
//!
//! A [`Gesture`] is an ordered sequence of pointer/keyboard steps handed to
//! the driver as one atomic action chain, so e.g. focus-then-type cannot be
//! interleaved with other input.

use serde::{Deserialize, Serialize};

use crate::session::ElementHandle;

/// One step of a composed gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureStep {
    /// Move the pointer over an element
    MoveTo {
        /// Target element id
        element_id: String,
    },
    /// Press and release the primary button at the current position
    Click,
    /// Double-press the primary button at the current position
    DoubleClick,
    /// Send keystrokes to the focused element
    Keys {
        /// Text to type
        text: String,
    },
}

impl GestureStep {
    /// Create a move step targeting an element
    #[must_use]
    pub fn move_to(handle: &ElementHandle) -> Self {
        Self::MoveTo {
            element_id: handle.id.clone(),
        }
    }

    /// Create a click step
    #[must_use]
    pub const fn click() -> Self {
        Self::Click
    }

    /// Create a double-click step
    #[must_use]
    pub const fn double_click() -> Self {
        Self::DoubleClick
    }

    /// Create a keystroke step
    #[must_use]
    pub fn keys(text: impl Into<String>) -> Self {
        Self::Keys { text: text.into() }
    }
}

impl std::fmt::Display for GestureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoveTo { element_id } => write!(f, "move_to({element_id})"),
            Self::Click => write!(f, "click"),
            Self::DoubleClick => write!(f, "double_click"),
            Self::Keys { text } => write!(f, "keys({text})"),
        }
    }
}

/// An ordered gesture sequence, built fluently and performed atomically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gesture {
    steps: Vec<GestureStep>,
}

impl Gesture {
    /// Start an empty gesture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pointer move to the element
    #[must_use]
    pub fn move_to(mut self, handle: &ElementHandle) -> Self {
        self.steps.push(GestureStep::move_to(handle));
        self
    }

    /// Append a click
    #[must_use]
    pub fn click(mut self) -> Self {
        self.steps.push(GestureStep::click());
        self
    }

    /// Append a double-click
    #[must_use]
    pub fn double_click(mut self) -> Self {
        self.steps.push(GestureStep::double_click());
        self
    }

    /// Append keystrokes
    #[must_use]
    pub fn keys(mut self, text: impl Into<String>) -> Self {
        self.steps.push(GestureStep::keys(text));
        self
    }

    /// The steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[GestureStep] {
        &self.steps
    }

    /// Whether the gesture has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{step}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_gesture() {
        let gesture = Gesture::new();
        assert!(gesture.is_empty());
        assert_eq!(gesture.to_string(), "");
    }

    #[test]
    fn test_focus_and_type_composition() {
        let handle = ElementHandle::new("input-1", "input");
        let gesture = Gesture::new().move_to(&handle).click().keys("hello");
        assert_eq!(
            gesture.steps(),
            &[
                GestureStep::move_to(&handle),
                GestureStep::Click,
                GestureStep::Keys {
                    text: "hello".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_display_joins_steps() {
        let handle = ElementHandle::new("btn-1", "button");
        let gesture = Gesture::new().move_to(&handle).double_click();
        assert_eq!(gesture.to_string(), "move_to(btn-1)+double_click");
    }

    #[test]
    fn test_gesture_round_trips_through_serde() {
        let handle = ElementHandle::new("btn-1", "button");
        let gesture = Gesture::new().move_to(&handle).click();
        let json = serde_json::to_string(&gesture).unwrap();
        let back: Gesture = serde_json::from_str(&json).unwrap();
        assert_eq!(back, gesture);
    }
}
