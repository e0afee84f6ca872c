//! Scene loaders turn the bytes sent with `Initialize` into a
//! [`SceneDescription`].

use simulate_core::description::SceneDescription;
use simulate_core::error::SceneError;

/// Parses raw scene bytes. Runs off the simulation thread.
pub trait SceneLoader: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<SceneDescription, SceneError>;
}

/// Loads scenes encoded as JSON [`SceneDescription`] documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSceneLoader;

impl SceneLoader for JsonSceneLoader {
    fn parse(&self, bytes: &[u8]) -> Result<SceneDescription, SceneError> {
        if bytes.is_empty() {
            return Err(SceneError::InvalidData("empty scene".into()));
        }
        let description: SceneDescription = serde_json::from_slice(bytes)?;
        description.validate()?;
        Ok(description)
    }
}
