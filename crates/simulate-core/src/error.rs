use thiserror::Error;

/// Top-level error type for simulate-core.
#[derive(Debug, Error)]
pub enum SimulateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Reward function error: {0}")]
    Reward(#[from] RewardError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid time_step: {0} (must be > 0)")]
    InvalidTimeStep(f32),

    #[error("frame_skip must be >= 1")]
    ZeroFrameSkip,

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised by a scene engine or scene loader.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Camera not found: {0}")]
    CameraNotFound(String),

    #[error("Node {0} has no rigid body")]
    NoRigidBody(String),

    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("No scene is loaded")]
    NotLoaded,

    #[error("Invalid scene data: {0}")]
    InvalidData(String),

    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors applying an action to an agent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("Discrete action expects exactly one value, got {got}")]
    DiscreteArity { got: usize },

    #[error("Discrete action out of range: {value} (available: {available})")]
    DiscreteOutOfRange { value: f32, available: usize },

    #[error("Continuous action length mismatch: expected {expected}, got {got}")]
    ContinuousLengthMismatch { expected: usize, got: usize },

    #[error("Unknown {dist} action name: {name}")]
    UnknownActionName { dist: &'static str, name: String },

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Action payload invalid: {0}")]
    InvalidPayload(String),
}

/// Errors building a reward function from scene metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("Unknown reward function type: {0}")]
    UnknownType(String),

    #[error("Unknown distance metric: {0}")]
    UnknownMetric(String),

    #[error("Reward function {kind} expects {expected} children, got {got}")]
    ChildCount {
        kind: String,
        expected: usize,
        got: usize,
    },

    #[error("Reward function {kind} is missing entity {role}")]
    MissingEntity { kind: String, role: &'static str },

    #[error("Reward entity not found in scene: {0}")]
    EntityNotFound(String),
}
