//! The simulation stepper.
//!
//! [`Simulator`] owns the scene engine, the registered plugins and the
//! process-wide [`SimulationConfig`]. One call to [`Simulator::step`] is one
//! externally observable step: before-step hooks, `frame_skip` physics
//! advances each followed by the step hooks, after-step hooks, then node
//! snapshots and camera renders.

use std::fmt;

use serde_json::{Map, Value};
use simulate_core::config::{SimulationConfig, StepOverrides};
use simulate_core::description::SceneDescription;
use simulate_core::scene::SceneEngine;
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::event::EventData;
use crate::lifecycle::{SceneLifecycle, SceneState};
use crate::plugin::Plugin;

pub struct Simulator {
    scene: Box<dyn SceneEngine>,
    plugins: Vec<Box<dyn Plugin>>,
    config: SimulationConfig,
    lifecycle: SceneLifecycle,
    scene_name: Option<String>,
    steps: u64,
}

impl Simulator {
    pub fn new(scene: Box<dyn SceneEngine>) -> Self {
        Self::with_config(scene, SimulationConfig::default())
    }

    pub fn with_config(mut scene: Box<dyn SceneEngine>, config: SimulationConfig) -> Self {
        scene.apply_config(&config);
        Self {
            scene,
            plugins: Vec::new(),
            config,
            lifecycle: SceneLifecycle::new(),
            scene_name: None,
            steps: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Plugins
    // -----------------------------------------------------------------------

    /// Register a plugin. Hooks run in registration order.
    pub fn add_plugin(&mut self, mut plugin: Box<dyn Plugin>) {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            warn!(plugin = plugin.name(), "plugin registered twice");
        }
        plugin.on_created();
        debug!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Plugin) -> Self {
        self.add_plugin(Box::new(plugin));
        self
    }

    /// First registered plugin of type `T`.
    pub fn plugin<T: Plugin>(&self) -> Option<&T> {
        self.plugins
            .iter()
            .find_map(|p| p.as_any().downcast_ref::<T>())
    }

    /// First registered plugin of type `T`, mutably.
    pub fn plugin_mut<T: Plugin>(&mut self) -> Option<&mut T> {
        self.plugins
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<T>())
    }

    /// Run `f` with a plugin of type `T` and the scene engine.
    pub fn with_plugin_and_scene<T: Plugin, R>(
        &mut self,
        f: impl FnOnce(&mut T, &mut dyn SceneEngine) -> R,
    ) -> Option<R> {
        let plugin = self
            .plugins
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<T>())?;
        Some(f(plugin, self.scene.as_mut()))
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn scene(&self) -> &dyn SceneEngine {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> &mut dyn SceneEngine {
        self.scene.as_mut()
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> SceneState {
        self.lifecycle.state()
    }

    /// Name of the loaded scene.
    pub fn scene_name(&self) -> Option<&str> {
        self.scene_name.as_deref()
    }

    /// Completed external steps since the scene was loaded.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.steps
    }

    /// Apply configuration keys and push them to the scene engine.
    pub fn configure(&mut self, kwargs: &Map<String, Value>) -> Result<(), SimError> {
        self.config.apply_kwargs(kwargs)?;
        self.scene.apply_config(&self.config);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Enter `Loading` ahead of an asynchronous load.
    pub fn begin_loading(&mut self) -> Result<(), SimError> {
        if self.lifecycle.state() != SceneState::Undefined {
            return Err(SimError::AlreadyInitialized);
        }
        self.lifecycle.begin_loading()?;
        debug!("scene loading");
        Ok(())
    }

    /// Leave `Loading` after a failed asynchronous load. No-op otherwise.
    pub fn abort_loading(&mut self) {
        if self.lifecycle.abort_loading().is_ok() {
            debug!("scene loading aborted");
        }
    }

    /// Load a scene, apply its embedded configuration and `kwargs`, then
    /// run every plugin's `on_scene_initialized`.
    ///
    /// Valid from `Undefined` or `Loading`. On failure the scene is torn
    /// down, the configuration restored and the state returns to
    /// `Undefined`.
    pub fn load(
        &mut self,
        description: &SceneDescription,
        kwargs: &Map<String, Value>,
    ) -> Result<(), SimError> {
        match self.lifecycle.state() {
            SceneState::Undefined => self.lifecycle.begin_loading()?,
            SceneState::Loading => {}
            SceneState::Default | SceneState::Unloading => {
                return Err(SimError::AlreadyInitialized);
            }
        }

        let previous = self.config.clone();
        if let Err(err) = self.try_load(description, kwargs) {
            warn!(scene = %description.name, error = %err, "scene load failed");
            for plugin in &mut self.plugins {
                plugin.on_before_scene_unloaded(self.scene.as_mut());
            }
            self.scene.unload();
            self.config = previous;
            self.scene.apply_config(&self.config);
            self.lifecycle.abort_loading()?;
            return Err(err);
        }

        self.lifecycle.finish_loading()?;
        self.scene_name = Some(description.name.clone());
        self.steps = 0;
        info!(
            scene = %description.name,
            nodes = description.nodes.len(),
            "scene initialized"
        );
        Ok(())
    }

    fn try_load(
        &mut self,
        description: &SceneDescription,
        kwargs: &Map<String, Value>,
    ) -> Result<(), SimError> {
        let mut config = self.config.clone();
        if let Some(scene_config) = &description.config {
            config.apply_kwargs(scene_config)?;
        }
        config.apply_kwargs(kwargs)?;

        self.scene.load(description)?;
        self.config = config;
        self.scene.apply_config(&self.config);

        for plugin in &mut self.plugins {
            plugin
                .on_scene_initialized(self.scene.as_mut(), description, kwargs)
                .map_err(|source| SimError::Plugin {
                    plugin: plugin.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Tear down the loaded scene. No-op when nothing is loaded.
    pub fn unload(&mut self) -> Result<(), SimError> {
        match self.lifecycle.state() {
            SceneState::Undefined => return Ok(()),
            SceneState::Loading => {
                self.lifecycle.abort_loading()?;
                self.scene.unload();
                return Ok(());
            }
            SceneState::Default => self.lifecycle.begin_unloading()?,
            SceneState::Unloading => {}
        }

        for plugin in &mut self.plugins {
            plugin.on_before_scene_unloaded(self.scene.as_mut());
        }
        self.scene.unload();
        self.lifecycle.finish_unloading()?;
        info!(scene = ?self.scene_name.take(), "scene unloaded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Run one external step with per-call overrides from `kwargs`.
    ///
    /// Outside the `Default` state this logs a warning and returns an empty
    /// event. Overrides are validated before anything runs, and the
    /// configuration is restored afterwards.
    pub fn step(&mut self, kwargs: Map<String, Value>) -> Result<EventData, SimError> {
        if !self.lifecycle.can_step() {
            warn!(state = %self.lifecycle.state(), "step ignored: scene not ready");
            return Ok(EventData::new(kwargs));
        }

        let overrides = StepOverrides::from_kwargs(&kwargs)?;
        let cached = overrides.apply(&mut self.config)?;
        let event = self.run_step(kwargs);
        self.config = cached;
        self.steps += 1;
        Ok(event)
    }

    fn run_step(&mut self, kwargs: Map<String, Value>) -> EventData {
        let mut event = EventData::new(kwargs);
        let scene = self.scene.as_mut();
        let dt = self.config.time_step;

        for plugin in &mut self.plugins {
            plugin.on_before_step(scene, &mut event);
        }

        for _ in 0..self.config.frame_skip {
            scene.step_physics(dt);
            for plugin in &mut self.plugins {
                plugin.on_step(scene, &mut event, dt);
            }
        }

        for plugin in &mut self.plugins {
            plugin.on_after_step(scene, &mut event);
        }

        if self.config.return_nodes {
            for name in scene.node_names() {
                if !self.config.wants_node(&name) {
                    continue;
                }
                match scene.node_data(&name) {
                    Some(data) => {
                        event.nodes.insert(name, data);
                    }
                    None => warn!(node = %name, "node vanished before snapshot"),
                }
            }
        }

        if self.config.return_frames {
            for camera in scene.camera_names() {
                if !self.config.wants_camera(&camera) {
                    continue;
                }
                match scene.render(&camera) {
                    Ok(frame) => {
                        event.frames.insert(camera, frame);
                    }
                    Err(err) => warn!(camera = %camera, error = %err, "render failed"),
                }
            }
        }

        event
    }

    /// Restore scene nodes and run every plugin's `on_reset`.
    ///
    /// Outside the `Default` state this logs a warning and does nothing.
    pub fn reset(&mut self) {
        if !self.lifecycle.can_step() {
            warn!(state = %self.lifecycle.state(), "reset ignored: scene not ready");
            return;
        }
        self.scene.reset_nodes();
        for plugin in &mut self.plugins {
            plugin.on_reset(self.scene.as_mut());
        }
        debug!("scene reset");
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_released();
        }
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("state", &self.lifecycle.state())
            .field("scene", &self.scene_name)
            .field("plugins", &self.plugin_names())
            .field("config", &self.config)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::any::Any;

    use serde_json::json;
    use simulate_core::error::{SceneError, SimulateError};
    use simulate_test_utils::{CallLog, RecordingScene, cube_scene};

    use super::*;

    struct Failing;

    impl Plugin for Failing {
        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "failing"
        }

        fn on_scene_initialized(
            &mut self,
            _scene: &mut dyn SceneEngine,
            _description: &SceneDescription,
            _kwargs: &Map<String, Value>,
        ) -> Result<(), SimulateError> {
            Err(SceneError::NodeNotFound("ghost".into()).into())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn kwargs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn loaded(log: &CallLog) -> Simulator {
        let mut sim = Simulator::new(Box::new(RecordingScene::new(log.clone())));
        sim.load(&cube_scene(), &Map::new()).unwrap();
        sim
    }

    #[test]
    fn load_enters_default_state() {
        let log = CallLog::new();
        let sim = loaded(&log);
        assert_eq!(sim.state(), SceneState::Default);
        assert_eq!(sim.scene_name(), Some("cube"));
        assert_eq!(log.count("load"), 1);
    }

    #[test]
    fn load_applies_kwargs_and_ignores_unknown_keys() {
        let mut sim = Simulator::new(Box::new(RecordingScene::new(CallLog::new())));
        sim.load(
            &cube_scene(),
            &kwargs(json!({"frame_skip": 3, "maps": ["a"]})),
        )
        .unwrap();
        assert_eq!(sim.config().frame_skip, 3);
    }

    #[test]
    fn load_twice_is_rejected() {
        let mut sim = loaded(&CallLog::new());
        assert!(matches!(
            sim.load(&cube_scene(), &Map::new()),
            Err(SimError::AlreadyInitialized)
        ));
        assert_eq!(sim.state(), SceneState::Default);
    }

    #[test]
    fn bad_config_aborts_load() {
        let mut sim = Simulator::new(Box::new(RecordingScene::new(CallLog::new())));
        let err = sim
            .load(&cube_scene(), &kwargs(json!({"time_step": -1.0})))
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        assert_eq!(sim.state(), SceneState::Undefined);
        assert_eq!(sim.config(), &SimulationConfig::default());
    }

    #[test]
    fn plugin_failure_rolls_back_load() {
        let log = CallLog::new();
        let mut sim =
            Simulator::new(Box::new(RecordingScene::new(log.clone()))).with_plugin(Failing);
        let err = sim
            .load(&cube_scene(), &kwargs(json!({"frame_skip": 2})))
            .unwrap_err();
        assert!(matches!(err, SimError::Plugin { ref plugin, .. } if plugin == "failing"));
        assert_eq!(sim.state(), SceneState::Undefined);
        assert_eq!(sim.config().frame_skip, 1);
        assert_eq!(log.count("unload"), 1);
        assert!(sim.scene().node_names().is_empty());
    }

    #[test]
    fn step_before_load_is_a_noop() {
        let log = CallLog::new();
        let mut sim = Simulator::new(Box::new(RecordingScene::new(log.clone())));
        let event = sim.step(Map::new()).unwrap();
        assert_eq!(event.to_json().unwrap(), "{}");
        assert_eq!(log.count("step_physics"), 0);
        assert_eq!(sim.step_count(), 0);
    }

    #[test]
    fn step_while_loading_is_a_noop() {
        let log = CallLog::new();
        let mut sim = Simulator::new(Box::new(RecordingScene::new(log.clone())));
        sim.begin_loading().unwrap();
        sim.step(Map::new()).unwrap();
        assert_eq!(log.count("step_physics"), 0);
        sim.abort_loading();
        assert_eq!(sim.state(), SceneState::Undefined);
    }

    #[test]
    fn step_snapshots_nodes_and_frames() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        let event = sim.step(Map::new()).unwrap();
        assert_eq!(log.count("step_physics"), 1);
        assert_eq!(event.nodes.len(), 3);
        assert_eq!(event.nodes["cube"].position, [0.0, 5.0, 0.0]);
        assert_eq!(event.frames["camera"].width(), 4);
        assert_eq!(sim.step_count(), 1);
    }

    #[test]
    fn step_respects_filters_and_flags() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        sim.configure(&kwargs(json!({"node_filter": ["cube"], "return_frames": false})))
            .unwrap();
        let event = sim.step(Map::new()).unwrap();
        assert_eq!(event.nodes.keys().collect::<Vec<_>>(), vec!["cube"]);
        assert!(event.frames.is_empty());
        assert_eq!(log.count("render:camera"), 0);
    }

    #[test]
    fn step_overrides_are_restored() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        let event = sim
            .step(kwargs(json!({"frame_skip": 4, "return_nodes": false})))
            .unwrap();
        assert_eq!(log.count("step_physics"), 4);
        assert!(event.nodes.is_empty());
        assert_eq!(sim.config().frame_skip, 1);
        assert!(sim.config().return_nodes);
    }

    #[test]
    fn invalid_override_leaves_state_untouched() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        let err = sim.step(kwargs(json!({"frame_skip": "many"}))).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        assert_eq!(log.count("step_physics"), 0);
        assert_eq!(sim.step_count(), 0);
    }

    #[test]
    fn reset_restores_nodes() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        sim.reset();
        assert_eq!(log.count("reset_nodes"), 1);
    }

    #[test]
    fn unload_is_idempotent() {
        let log = CallLog::new();
        let mut sim = loaded(&log);
        sim.unload().unwrap();
        sim.unload().unwrap();
        assert_eq!(sim.state(), SceneState::Undefined);
        assert_eq!(log.count("unload"), 1);
        sim.load(&cube_scene(), &Map::new()).unwrap();
        assert_eq!(sim.state(), SceneState::Default);
    }
}
