//! Scene lifecycle state machine.
//!
//! [`SceneLifecycle`] tracks the current [`SceneState`] and validates
//! transitions. The owning scene cycles
//! `Undefined -> Loading -> Default -> Unloading -> Undefined`; stepping is
//! only valid in `Default`.

use std::fmt;

/// State of the scene owned by a [`Simulator`](crate::Simulator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SceneState {
    /// No scene loaded.
    #[default]
    Undefined,
    /// Scene bytes are being decoded and parsed.
    Loading,
    /// Scene loaded and steppable.
    Default,
    /// Scene teardown in progress.
    Unloading,
}

impl SceneState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Loading => "loading",
            Self::Default => "default",
            Self::Unloading => "unloading",
        }
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: SceneState,
    pub to: SceneState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scene transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Tracks scene state and enforces valid transitions.
///
/// # Example
///
/// ```
/// use simulate_sim::lifecycle::{SceneLifecycle, SceneState};
///
/// let mut lifecycle = SceneLifecycle::new();
/// lifecycle.begin_loading().unwrap();
/// lifecycle.finish_loading().unwrap();
/// assert!(lifecycle.can_step());
/// ```
#[derive(Debug, Default)]
pub struct SceneLifecycle {
    state: SceneState,
}

impl SceneLifecycle {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SceneState::Undefined,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SceneState {
        self.state
    }

    /// Whether `step()` may run.
    #[must_use]
    pub const fn can_step(&self) -> bool {
        matches!(self.state, SceneState::Default)
    }

    /// `Undefined -> Loading`.
    pub fn begin_loading(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SceneState::Undefined, SceneState::Loading)
    }

    /// `Loading -> Default`.
    pub fn finish_loading(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SceneState::Loading, SceneState::Default)
    }

    /// Abort a load that failed. `Loading -> Undefined`.
    pub fn abort_loading(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SceneState::Loading, SceneState::Undefined)
    }

    /// `Default -> Unloading`.
    pub fn begin_unloading(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SceneState::Default, SceneState::Unloading)
    }

    /// `Unloading -> Undefined`.
    pub fn finish_unloading(&mut self) -> Result<(), InvalidTransition> {
        self.transition(SceneState::Unloading, SceneState::Undefined)
    }

    fn transition(&mut self, from: SceneState, to: SceneState) -> Result<(), InvalidTransition> {
        if self.state != from {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_undefined() {
        let lifecycle = SceneLifecycle::new();
        assert_eq!(lifecycle.state(), SceneState::Undefined);
        assert!(!lifecycle.can_step());
    }

    #[test]
    fn full_cycle() {
        let mut lifecycle = SceneLifecycle::new();
        lifecycle.begin_loading().unwrap();
        assert_eq!(lifecycle.state(), SceneState::Loading);
        assert!(!lifecycle.can_step());
        lifecycle.finish_loading().unwrap();
        assert!(lifecycle.can_step());
        lifecycle.begin_unloading().unwrap();
        assert!(!lifecycle.can_step());
        lifecycle.finish_unloading().unwrap();
        assert_eq!(lifecycle.state(), SceneState::Undefined);
    }

    #[test]
    fn cannot_load_twice() {
        let mut lifecycle = SceneLifecycle::new();
        lifecycle.begin_loading().unwrap();
        let err = lifecycle.begin_loading().unwrap_err();
        assert_eq!(err.from, SceneState::Loading);
        assert_eq!(err.to, SceneState::Loading);
        assert_eq!(err.to_string(), "invalid scene transition loading -> loading");
    }

    #[test]
    fn abort_returns_to_undefined() {
        let mut lifecycle = SceneLifecycle::new();
        lifecycle.begin_loading().unwrap();
        lifecycle.abort_loading().unwrap();
        assert_eq!(lifecycle.state(), SceneState::Undefined);
    }

    #[test]
    fn cannot_unload_when_not_loaded() {
        let mut lifecycle = SceneLifecycle::new();
        assert!(lifecycle.begin_unloading().is_err());
        assert_eq!(lifecycle.state(), SceneState::Undefined);
    }
}
