use std::any::Any;

use serde_json::{Map, Value};
use simulate_core::description::SceneDescription;
use simulate_core::error::SimulateError;
use simulate_core::scene::SceneEngine;
use simulate_sim::{EventData, Plugin};

use crate::manager::AgentManager;

/// Simulator plugin that owns the scene's agents.
///
/// Agents move on every physics sub-step and rewards are evaluated once per
/// external step, after the frame-skip loop.
#[derive(Debug, Default)]
pub struct RlPlugin {
    manager: AgentManager,
}

impl RlPlugin {
    pub const NAME: &'static str = "rl";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn manager(&self) -> &AgentManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut AgentManager {
        &mut self.manager
    }
}

impl Plugin for RlPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_scene_initialized(
        &mut self,
        scene: &mut dyn SceneEngine,
        description: &SceneDescription,
        _kwargs: &Map<String, Value>,
    ) -> Result<(), SimulateError> {
        self.manager = AgentManager::build(description, scene)?;
        Ok(())
    }

    fn on_step(&mut self, scene: &mut dyn SceneEngine, _event: &mut EventData, dt: f32) {
        self.manager.apply_movement(scene, dt);
    }

    fn on_after_step(&mut self, scene: &mut dyn SceneEngine, event: &mut EventData) {
        if self.manager.is_empty() {
            return;
        }
        self.manager.update_rewards(scene);
        event.insert_extra("agent_done", self.manager.get_done());
    }

    fn on_reset(&mut self, scene: &mut dyn SceneEngine) {
        self.manager.reset(scene);
    }

    fn on_before_scene_unloaded(&mut self, _scene: &mut dyn SceneEngine) {
        self.manager.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use simulate_sim::Simulator;
    use simulate_test_utils::{CallLog, RecordingScene, cube_scene, single_agent_scene};

    use super::*;

    fn simulator() -> Simulator {
        let mut sim = Simulator::new(Box::new(RecordingScene::new(CallLog::new())))
            .with_plugin(RlPlugin::new());
        sim.load(&single_agent_scene(), &Map::new()).unwrap();
        sim
    }

    fn manager(sim: &mut Simulator) -> &mut AgentManager {
        sim.plugin_mut::<RlPlugin>().unwrap().manager_mut()
    }

    #[test]
    fn load_builds_agents() {
        let mut sim = simulator();
        assert_eq!(manager(&mut sim).ids().collect::<Vec<_>>(), vec!["agent"]);
    }

    #[test]
    fn step_moves_agent_per_substep_and_reports_done() {
        let mut sim = simulator();
        sim.configure(json!({"time_step": 0.5}).as_object().unwrap())
            .unwrap();
        manager(&mut sim).set_action("agent", &[0.0]).unwrap();

        let event = sim.step(Map::new()).unwrap();
        assert_eq!(event.extra["agent_done"], json!([false]));
        let z = sim.scene().transform("agent").unwrap().translation.z;
        assert!((z + 0.5).abs() < 1e-5);

        // frame_skip 5 at 0.5s: 2.5 more units reaches the target.
        let event = sim.step(json!({"frame_skip": 5}).as_object().cloned().unwrap()).unwrap();
        assert_eq!(event.extra["agent_done"], json!([true]));
        let rewards = manager(&mut sim).get_reward();
        assert!((rewards[0] - 13.0).abs() < 1e-4);
    }

    #[test]
    fn reset_and_unload_reach_the_manager() {
        let mut sim = simulator();
        manager(&mut sim).set_action("agent", &[0.0]).unwrap();
        sim.reset();
        assert!(manager(&mut sim).agent("agent").unwrap().pending().is_idle());

        sim.unload().unwrap();
        assert!(manager(&mut sim).is_empty());
    }

    #[test]
    fn scene_without_agents_adds_no_extra() {
        let mut sim = Simulator::new(Box::new(RecordingScene::new(CallLog::new())))
            .with_plugin(RlPlugin::new());
        sim.load(&cube_scene(), &Map::new()).unwrap();
        let event = sim.step(Map::new()).unwrap();
        assert!(!event.extra.contains_key("agent_done"));
    }
}
