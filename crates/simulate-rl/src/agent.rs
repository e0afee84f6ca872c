//! A single RL agent bound to a scene node.

use simulate_core::description::AgentDescription;
use simulate_core::error::{ActionError, SceneError, SimulateError};
use simulate_core::scene::SceneEngine;
use tracing::{debug, warn};

use crate::actions::{ActionMapping, MovementAxes};
use crate::observation::Observation;
use crate::reward::RewardFunction;
use crate::sensor::StateSensor;

#[derive(Debug)]
pub struct Agent {
    id: String,
    mapping: ActionMapping,
    camera: Option<String>,
    move_speed: f32,
    turn_speed: f32,
    rewards: Vec<RewardFunction>,
    sensors: Vec<StateSensor>,
    pending: MovementAxes,
    accumulated: f32,
}

impl Agent {
    /// Build the agent attached to node `id` of the loaded scene.
    ///
    /// Fails on unknown action names, a missing camera, or a reward
    /// function that does not resolve against the scene.
    pub fn build(
        id: &str,
        desc: &AgentDescription,
        scene: &dyn SceneEngine,
    ) -> Result<Self, SimulateError> {
        if !scene.contains(id) {
            return Err(SceneError::NodeNotFound(id.to_string()).into());
        }
        let mapping = ActionMapping::from_spec(&desc.action)?;
        if let Some(camera) = &desc.camera {
            if !scene.camera_names().iter().any(|c| c == camera) {
                return Err(SceneError::CameraNotFound(camera.clone()).into());
            }
        }
        let rewards = desc
            .reward_functions
            .iter()
            .map(|r| RewardFunction::build(r, scene))
            .collect::<Result<Vec<_>, _>>()?;
        let sensors = desc
            .state_sensors
            .iter()
            .map(|s| StateSensor::build(s, scene))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            agent = id,
            rewards = rewards.len(),
            sensors = sensors.len(),
            "agent built"
        );
        Ok(Self {
            id: id.to_string(),
            mapping,
            camera: desc.camera.clone(),
            move_speed: desc.move_speed,
            turn_speed: desc.turn_speed,
            rewards,
            sensors,
            pending: MovementAxes::IDLE,
            accumulated: 0.0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn mapping(&self) -> &ActionMapping {
        &self.mapping
    }

    pub fn camera(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    pub const fn pending(&self) -> MovementAxes {
        self.pending
    }

    pub const fn accumulated_reward(&self) -> f32 {
        self.accumulated
    }

    pub fn rewards(&self) -> &[RewardFunction] {
        &self.rewards
    }

    pub fn sensors(&self) -> &[StateSensor] {
        &self.sensors
    }

    /// Validate `values` against the action space without applying them.
    pub fn resolve(&self, values: &[f32]) -> Result<MovementAxes, ActionError> {
        self.mapping.resolve(values)
    }

    /// Replace the pending action. It persists until replaced or reset.
    pub fn set_action(&mut self, values: &[f32]) -> Result<(), ActionError> {
        self.pending = self.mapping.resolve(values)?;
        Ok(())
    }

    pub(crate) fn set_movement(&mut self, movement: MovementAxes) {
        self.pending = movement;
    }

    /// Move the agent node by its pending action for one sub-step.
    ///
    /// Inactive agents stay put.
    pub fn apply_movement(&self, scene: &mut dyn SceneEngine, dt: f32) {
        if self.pending.is_idle() || scene.is_active(&self.id) != Some(true) {
            return;
        }
        let Some(mut transform) = scene.transform(&self.id) else {
            warn!(agent = %self.id, "agent node missing from scene");
            return;
        };
        self.pending
            .apply(&mut transform, self.move_speed, self.turn_speed, dt);
        if let Err(err) = scene.set_transform(&self.id, transform) {
            warn!(agent = %self.id, %err, "failed to move agent");
        }
    }

    /// Evaluate every reward function and add the sum to the accumulator.
    pub fn update_reward(&mut self, scene: &mut dyn SceneEngine) -> f32 {
        let reward: f32 = self.rewards.iter_mut().map(|r| r.calculate(scene)).sum();
        self.accumulated += reward;
        reward
    }

    /// Return the accumulated reward and zero it.
    pub fn take_reward(&mut self) -> f32 {
        std::mem::take(&mut self.accumulated)
    }

    /// Any terminal reward function has triggered.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.rewards.iter().any(RewardFunction::is_done)
    }

    pub fn reset(&mut self, scene: &mut dyn SceneEngine) {
        self.pending = MovementAxes::IDLE;
        self.accumulated = 0.0;
        for reward in &mut self.rewards {
            reward.reset(scene);
        }
    }

    /// Render the agent camera and read its state sensors.
    ///
    /// Render failures yield an empty image.
    pub fn observe(&self, scene: &mut dyn SceneEngine) -> Observation {
        let image = match &self.camera {
            None => Observation::empty(&self.id),
            Some(camera) => match scene.render(camera) {
                Ok(frame) => Observation::from_frame(&self.id, &frame),
                Err(err) => {
                    warn!(agent = %self.id, camera = %camera, %err, "observation render failed");
                    Observation::empty(&self.id)
                }
            },
        };
        let readings = self.sensors.iter().map(|s| s.read(&*scene)).collect();
        image.with_sensors(readings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use bevy_math::Vec3;
    use simulate_core::description::{
        ActionSpec, RewardFunctionDescription, StateSensorDescription,
    };
    use simulate_test_utils::{CallLog, RecordingScene, single_agent_scene};

    use super::*;

    fn loaded() -> (RecordingScene, AgentDescription) {
        let desc = single_agent_scene();
        let mut scene = RecordingScene::new(CallLog::new());
        scene.load(&desc).unwrap();
        let agent = desc
            .agents()
            .next()
            .map(|(_, a)| a.clone())
            .unwrap();
        (scene, agent)
    }

    #[test]
    fn build_resolves_actions_rewards_and_camera() {
        let (scene, desc) = loaded();
        let agent = Agent::build("agent", &desc, &scene).unwrap();
        assert_eq!(agent.id(), "agent");
        assert_eq!(agent.camera(), Some("agent_cam"));
        assert_eq!(agent.mapping().len(), 5);
        assert_eq!(agent.rewards().len(), 2);
    }

    #[test]
    fn build_rejects_missing_camera() {
        let (scene, desc) = loaded();
        let desc = desc.with_camera("nope");
        assert!(matches!(
            Agent::build("agent", &desc, &scene),
            Err(SimulateError::Scene(SceneError::CameraNotFound(_)))
        ));
    }

    #[test]
    fn build_rejects_unknown_action_and_reward() {
        let (scene, _) = loaded();
        let desc = AgentDescription::new(ActionSpec::discrete(["fly"]));
        assert!(matches!(
            Agent::build("agent", &desc, &scene),
            Err(SimulateError::Action(ActionError::UnknownActionName { .. }))
        ));
        let desc = AgentDescription::new(ActionSpec::discrete(["do_nothing"]))
            .with_reward(RewardFunctionDescription::between("dense", "agent", "ghost"));
        assert!(matches!(
            Agent::build("agent", &desc, &scene),
            Err(SimulateError::Reward(_))
        ));
    }

    #[test]
    fn pending_action_moves_agent_every_substep() {
        let (mut scene, desc) = loaded();
        let mut agent = Agent::build("agent", &desc, &scene).unwrap();
        agent.set_action(&[0.0]).unwrap();
        agent.apply_movement(&mut scene, 0.5);
        agent.apply_movement(&mut scene, 0.5);
        let position = scene.transform("agent").unwrap().translation;
        assert!((position - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn invalid_action_keeps_previous_one() {
        let (scene, desc) = loaded();
        let mut agent = Agent::build("agent", &desc, &scene).unwrap();
        agent.set_action(&[0.0]).unwrap();
        assert!(agent.set_action(&[9.0]).is_err());
        assert_eq!(agent.pending().forward, 1.0);
    }

    #[test]
    fn inactive_agent_does_not_move() {
        let (mut scene, desc) = loaded();
        let mut agent = Agent::build("agent", &desc, &scene).unwrap();
        agent.set_action(&[0.0]).unwrap();
        scene.set_active("agent", false).unwrap();
        agent.apply_movement(&mut scene, 1.0);
        assert_eq!(scene.transform("agent").unwrap().translation, Vec3::ZERO);
    }

    #[test]
    fn reward_accumulates_until_taken() {
        let (mut scene, desc) = loaded();
        let mut agent = Agent::build("agent", &desc, &scene).unwrap();
        agent.reset(&mut scene);
        agent.set_action(&[0.0]).unwrap();

        agent.apply_movement(&mut scene, 1.0);
        agent.update_reward(&mut scene);
        agent.apply_movement(&mut scene, 1.0);
        agent.update_reward(&mut scene);

        // best_euclidean improved by 1 twice; target still 1 unit away.
        assert!((agent.take_reward() - 2.0).abs() < 1e-5);
        assert_eq!(agent.take_reward(), 0.0);
        assert!(!agent.is_done());
    }

    #[test]
    fn terminal_sparse_reward_marks_done_until_reset() {
        let (mut scene, desc) = loaded();
        let mut agent = Agent::build("agent", &desc, &scene).unwrap();
        agent.reset(&mut scene);
        agent.set_action(&[0.0]).unwrap();
        for _ in 0..3 {
            agent.apply_movement(&mut scene, 1.0);
            agent.update_reward(&mut scene);
        }
        assert!(agent.is_done());
        // Three units of progress plus the sparse scalar.
        assert!((agent.take_reward() - 13.0).abs() < 1e-4);

        agent.reset(&mut scene);
        assert!(!agent.is_done());
        assert!(agent.pending().is_idle());
    }

    #[test]
    fn observation_uses_agent_camera() {
        let (mut scene, desc) = loaded();
        let agent = Agent::build("agent", &desc, &scene).unwrap();
        let obs = agent.observe(&mut scene);
        assert_eq!(obs.agent, "agent");
        assert_eq!(obs.shape, [3, 2, 4]);
        assert_eq!(obs.data.len(), 24);
        assert!(obs.sensors.is_empty());
    }

    #[test]
    fn state_sensors_are_read_after_the_image() {
        let (mut scene, desc) = loaded();
        let desc = desc.with_state_sensor(
            StateSensorDescription::new("goal", "target")
                .relative_to("agent")
                .with_properties(["position.z", "distance"]),
        );
        let agent = Agent::build("agent", &desc, &scene).unwrap();
        assert_eq!(agent.sensors().len(), 1);

        let obs = agent.observe(&mut scene);
        assert_eq!(obs.data.len(), 24);
        let goal = &obs.sensors[0];
        assert_eq!(goal.name, "goal");
        assert_eq!(goal.shape, [2]);
        assert!(goal.data[1] > 0.0);
        assert!((goal.data[0].abs() - goal.data[1]).abs() < 1e-5);
    }

    #[test]
    fn build_rejects_sensor_on_missing_node() {
        let (scene, desc) = loaded();
        let desc = desc.with_state_sensor(StateSensorDescription::new("goal", "ghost"));
        assert!(matches!(
            Agent::build("agent", &desc, &scene),
            Err(SimulateError::Scene(SceneError::NodeNotFound(_)))
        ));
    }
}
