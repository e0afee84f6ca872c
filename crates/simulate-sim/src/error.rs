use simulate_core::error::{ConfigError, SceneError, SimulateError};
use thiserror::Error;

use crate::lifecycle::{InvalidTransition, SceneState};

/// Errors raised by the [`Simulator`](crate::Simulator).
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Scene is already initialized. Close before opening a new scene.")]
    AlreadyInitialized,

    #[error("Scene is not initialized (state: {0})")]
    NotInitialized(SceneState),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Plugin {plugin} failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: SimulateError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SimError::NotInitialized(SceneState::Loading).to_string(),
            "Scene is not initialized (state: loading)"
        );
        let err = SimError::Plugin {
            plugin: "rl".into(),
            source: SceneError::NodeNotFound("target".into()).into(),
        };
        assert_eq!(
            err.to_string(),
            "Plugin rl failed: Scene error: Node not found: target"
        );
    }

    #[test]
    fn transparent_scene_error() {
        let err: SimError = SceneError::CameraNotFound("cam".into()).into();
        assert_eq!(err.to_string(), "Camera not found: cam");
    }
}
