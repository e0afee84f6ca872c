use simulate_core::error::{ActionError, ConfigError, SceneError};
use simulate_sim::SimError;
use thiserror::Error;

/// Transport-level errors on the bridge connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,
}

impl ProtocolError {
    /// Whether the connection must be torn down after this error.
    ///
    /// Every transport error is fatal except a send attempted on a
    /// connection that is already gone.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotConnected)
    }
}

/// Per-request errors. Their display text is the response payload and the
/// connection stays open.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command doesn't contain type")]
    MissingType,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for {command}: {message}")]
    Argument { command: String, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(SimError),
}

impl CommandError {
    pub fn argument(command: &str, message: impl ToString) -> Self {
        Self::Argument {
            command: command.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<SimError> for CommandError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::AlreadyInitialized
            | SimError::NotInitialized(_)
            | SimError::Transition(_) => Self::InvalidState(err.to_string()),
            SimError::Scene(err) => Self::Scene(err),
            SimError::Config(err) => Self::Config(err),
            other @ SimError::Plugin { .. } => Self::Simulation(other),
        }
    }
}
