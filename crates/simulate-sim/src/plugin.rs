//! Simulator extension hooks.
//!
//! A [`Plugin`] is invoked at fixed lifecycle points of the [`Simulator`].
//! Plugins run in registration order on the simulation thread and receive
//! the scene engine by mutable reference for the duration of each hook.
//!
//! [`Simulator`]: crate::Simulator

use std::any::Any;

use serde_json::{Map, Value};
use simulate_core::description::SceneDescription;
use simulate_core::error::SimulateError;
use simulate_core::scene::SceneEngine;

use crate::event::EventData;

/// Extension invoked around scene loading and stepping.
///
/// Every hook has an empty default. Implementors provide `name` and the two
/// `Any` accessors, which let commands reach a concrete plugin through
/// [`Simulator::plugin_mut`](crate::Simulator::plugin_mut).
pub trait Plugin: Any + Send {
    /// Stable identifier, used in logs.
    fn name(&self) -> &str;

    /// Called once when the plugin is registered.
    fn on_created(&mut self) {}

    /// Called once when the simulator is dropped or the plugin removed.
    fn on_released(&mut self) {}

    /// Called after a scene is loaded and configured.
    ///
    /// An error aborts the load.
    fn on_scene_initialized(
        &mut self,
        _scene: &mut dyn SceneEngine,
        _description: &SceneDescription,
        _kwargs: &Map<String, Value>,
    ) -> Result<(), SimulateError> {
        Ok(())
    }

    /// Called once before the frame-skip loop.
    fn on_before_step(&mut self, _scene: &mut dyn SceneEngine, _event: &mut EventData) {}

    /// Called after every physics advance of `dt` seconds.
    fn on_step(&mut self, _scene: &mut dyn SceneEngine, _event: &mut EventData, _dt: f32) {}

    /// Called once after the frame-skip loop, before snapshots are taken.
    fn on_after_step(&mut self, _scene: &mut dyn SceneEngine, _event: &mut EventData) {}

    /// Called after scene nodes are restored on reset.
    fn on_reset(&mut self, _scene: &mut dyn SceneEngine) {}

    /// Called before the scene is torn down.
    fn on_before_scene_unloaded(&mut self, _scene: &mut dyn SceneEngine) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
