use std::sync::Arc;

use simulate_core::scene::SceneEngine;
use simulate_rl::{AgentManager, RlPlugin};
use simulate_sim::{HeadlessScene, JsonSceneLoader, SceneLoader, Simulator};

use crate::error::CommandError;

/// Process context handed to every command.
///
/// Owns the simulator and the scene loader. Only the simulation thread
/// touches it.
pub struct SimContext {
    pub simulator: Simulator,
    pub loader: Arc<dyn SceneLoader>,
    /// Set by `Close`; the bridge loop exits after sending the response.
    pub close_requested: bool,
}

impl SimContext {
    pub fn new(simulator: Simulator, loader: Arc<dyn SceneLoader>) -> Self {
        Self {
            simulator,
            loader,
            close_requested: false,
        }
    }

    /// Headless engine with the RL plugin and the JSON scene loader.
    #[must_use]
    pub fn headless() -> Self {
        let simulator =
            Simulator::new(Box::new(HeadlessScene::new())).with_plugin(RlPlugin::new());
        Self::new(simulator, Arc::new(JsonSceneLoader))
    }

    /// Run `f` against the agent manager and the scene.
    ///
    /// Fails when no RL plugin is registered.
    pub fn with_agents<R>(
        &mut self,
        f: impl FnOnce(&mut AgentManager, &mut dyn SceneEngine) -> R,
    ) -> Result<R, CommandError> {
        self.simulator
            .with_plugin_and_scene(|plugin: &mut RlPlugin, scene| f(plugin.manager_mut(), scene))
            .ok_or_else(|| CommandError::InvalidState("RL plugin is not registered".into()))
    }
}

impl std::fmt::Debug for SimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("simulator", &self.simulator)
            .field("close_requested", &self.close_requested)
            .finish_non_exhaustive()
    }
}
