//! Scene description fixtures.

use simulate_core::description::{
    ActionSpec, AgentDescription, NodeDescription, RewardFunctionDescription, SceneDescription,
};

/// A floor, a falling cube with a rigid body, and a 4x3 camera.
pub fn cube_scene() -> SceneDescription {
    SceneDescription::new("cube")
        .with_node(NodeDescription::new("floor"))
        .with_node(NodeDescription::new("cube").at(0.0, 5.0, 0.0).with_rigid_body(2.0, true))
        .with_node(NodeDescription::new("camera").at(0.0, 2.0, 5.0).with_camera(4, 3))
}

/// One discrete agent at the origin facing a target 3 units ahead (-Z).
///
/// The agent carries a dense `best_euclidean` reward towards the target and a
/// terminal sparse reward that fires within 1 unit. Its camera renders 4x2.
pub fn single_agent_scene() -> SceneDescription {
    let mut sparse = RewardFunctionDescription::between("sparse", "agent", "target");
    sparse.threshold = 1.0;
    sparse.scalar = 10.0;
    sparse.is_terminal = true;

    let mut dense = RewardFunctionDescription::between("dense", "agent", "target");
    dense.distance_metric = "best_euclidean".into();

    let agent = AgentDescription::new(ActionSpec::discrete([
        "move_forward",
        "move_backward",
        "turn_left",
        "turn_right",
        "do_nothing",
    ]))
    .with_camera("agent_cam")
    .with_reward(dense)
    .with_reward(sparse);

    SceneDescription::new("single_agent")
        .with_node(NodeDescription::new("agent").with_agent(agent))
        .with_node(
            NodeDescription::new("agent_cam")
                .with_parent("agent")
                .with_camera(4, 2),
        )
        .with_node(NodeDescription::new("target").at(0.0, 0.0, -3.0))
}

/// Two continuous agents, `agent_b` declared before `agent_a`.
///
/// Only `agent_a` has a camera. Each carries a timeout reward that fires
/// after two evaluations.
pub fn two_agent_scene() -> SceneDescription {
    let spec = ActionSpec::continuous(["move_forward_backward", "turn_left_right"]);
    let mut timeout = RewardFunctionDescription::of("timeout");
    timeout.threshold = 2.0;
    timeout.is_terminal = true;

    SceneDescription::new("two_agents")
        .with_node(
            NodeDescription::new("agent_b")
                .at(2.0, 0.0, 0.0)
                .with_agent(AgentDescription::new(spec.clone()).with_reward(timeout.clone())),
        )
        .with_node(
            NodeDescription::new("agent_a").with_agent(
                AgentDescription::new(spec)
                    .with_camera("cam_a")
                    .with_reward(timeout),
            ),
        )
        .with_node(
            NodeDescription::new("cam_a")
                .with_parent("agent_a")
                .with_camera(2, 2),
        )
}

/// Serialise a description the way a controller would send it.
pub fn scene_bytes(description: &SceneDescription) -> Vec<u8> {
    serde_json::to_vec(description).unwrap_or_default()
}
