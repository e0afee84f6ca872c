//! The scene engine collaborator.
//!
//! A [`SceneEngine`] owns the scene graph, physics and rendering. The
//! simulator drives it exclusively from the simulation thread, so
//! implementations need `Send` but not `Sync`.

use bevy_math::Vec3;
use bevy_transform::components::Transform;

use crate::config::SimulationConfig;
use crate::description::SceneDescription;
use crate::error::SceneError;
use crate::types::{ForceMode, Frame, NodeData};

/// Narrow interface onto a 3D scene: node lookup, transforms, physics
/// stepping and camera rendering.
pub trait SceneEngine: Send {
    /// Build the scene graph from a description, replacing any loaded scene.
    fn load(&mut self, description: &SceneDescription) -> Result<(), SceneError>;

    /// Drop all nodes.
    fn unload(&mut self);

    /// Names of all nodes, in load order.
    fn node_names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.transform(name).is_some()
    }

    /// Current local transform of a node.
    fn transform(&self, name: &str) -> Option<Transform>;

    fn set_transform(&mut self, name: &str, transform: Transform) -> Result<(), SceneError>;

    /// Snapshot of a node for step results.
    fn node_data(&self, name: &str) -> Option<NodeData> {
        self.transform(name).map(|t| {
            NodeData::from_transform(&t).with_active(self.is_active(name).unwrap_or(true))
        })
    }

    fn add_force(&mut self, name: &str, force: Vec3, mode: ForceMode) -> Result<(), SceneError>;

    fn set_active(&mut self, name: &str, active: bool) -> Result<(), SceneError>;

    /// `None` when the node does not exist.
    fn is_active(&self, name: &str) -> Option<bool>;

    /// Advance physics by `dt` seconds.
    fn step_physics(&mut self, dt: f32);

    /// Names of nodes carrying a camera, in load order.
    fn camera_names(&self) -> Vec<String>;

    fn render(&mut self, camera: &str) -> Result<Frame, SceneError>;

    /// Pick up engine-relevant settings (gravity, ambient colour).
    fn apply_config(&mut self, config: &SimulationConfig);

    /// Restore every node to its loaded state.
    fn reset_nodes(&mut self);
}

/// Distance between the origins of two nodes.
pub fn distance(scene: &dyn SceneEngine, a: &str, b: &str) -> Result<f32, SceneError> {
    let ta = scene
        .transform(a)
        .ok_or_else(|| SceneError::NodeNotFound(a.to_string()))?;
    let tb = scene
        .transform(b)
        .ok_or_else(|| SceneError::NodeNotFound(b.to_string()))?;
    Ok(ta.translation.distance(tb.translation))
}
