// simulate-core: shared types, errors, configuration and the scene engine
// interface for the Simulate command bridge.

pub mod config;
pub mod description;
pub mod error;
pub mod scene;
pub mod types;

pub use config::{SimulationConfig, StepOverrides};
pub use description::{
    ActionDistribution, ActionSpec, AgentDescription, CameraDescription, NodeDescription,
    RewardFunctionDescription, RigidBodyDescription, SceneDescription, StateSensorDescription,
};
pub use error::{ActionError, ConfigError, RewardError, SceneError, SimulateError};
pub use scene::SceneEngine;
pub use types::{ForceMode, Frame, NodeData};

pub mod prelude {
    pub use crate::{
        config::{SimulationConfig, StepOverrides},
        description::{AgentDescription, NodeDescription, SceneDescription},
        error::{SceneError, SimulateError},
        scene::SceneEngine,
        types::{ForceMode, Frame, NodeData},
    };
}
