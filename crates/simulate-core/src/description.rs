//! Declarative scene description consumed by scene engines.
//!
//! A [`SceneDescription`] is what a scene loader produces from the bytes sent
//! with `Initialize`. Nodes carry their initial transform plus optional
//! camera, rigid body and RL agent metadata.

use bevy_math::{Quat, Vec3};
use bevy_transform::components::Transform;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SceneError;

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}
const fn default_one() -> f32 {
    1.0
}
const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// SceneDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    /// Configuration keys embedded in the scene, applied before the
    /// `Initialize` keyword arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl SceneDescription {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_node(mut self, node: NodeDescription) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn node(&self, name: &str) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Nodes carrying agent metadata, in declaration order.
    pub fn agents(&self) -> impl Iterator<Item = (&str, &AgentDescription)> {
        self.nodes
            .iter()
            .filter_map(|n| n.agent.as_ref().map(|a| (n.name.as_str(), a)))
    }

    /// Check node names are unique and non-empty, and parents exist.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() {
                return Err(SceneError::InvalidData("node with empty name".into()));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(SceneError::DuplicateNode(node.name.clone()));
            }
            if let Some(camera) = &node.camera {
                camera.validate(&node.name)?;
            }
        }
        for node in &self.nodes {
            if let Some(parent) = &node.parent {
                if !seen.contains(parent.as_str()) {
                    return Err(SceneError::InvalidData(format!(
                        "node {} has unknown parent {parent}",
                        node.name
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NodeDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Quaternion, `[x, y, z, w]`.
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigid_body: Option<RigidBodyDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentDescription>,
}

impl NodeDescription {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            position: [0.0; 3],
            rotation: default_rotation(),
            scale: default_scale(),
            camera: None,
            rigid_body: None,
            agent: None,
        }
    }

    #[must_use]
    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_camera(mut self, width: u32, height: u32) -> Self {
        self.camera = Some(CameraDescription { width, height });
        self
    }

    #[must_use]
    pub fn with_rigid_body(mut self, mass: f32, use_gravity: bool) -> Self {
        self.rigid_body = Some(RigidBodyDescription { mass, use_gravity });
        self
    }

    #[must_use]
    pub fn with_agent(mut self, agent: AgentDescription) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Initial local transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform {
            translation: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation).normalize(),
            scale: Vec3::from_array(self.scale),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDescription {
    pub width: u32,
    pub height: u32,
}

impl CameraDescription {
    /// Largest accepted `width * height`.
    pub const MAX_PIXELS: u64 = 4096 * 4096;

    fn validate(&self, node: &str) -> Result<(), SceneError> {
        let pixels = u64::from(self.width) * u64::from(self.height);
        if pixels == 0 || pixels > Self::MAX_PIXELS {
            return Err(SceneError::InvalidData(format!(
                "camera on {node} is {}x{}, must be non-empty and at most {} pixels",
                self.width,
                self.height,
                Self::MAX_PIXELS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyDescription {
    #[serde(default = "default_one")]
    pub mass: f32,
    #[serde(default = "default_true")]
    pub use_gravity: bool,
}

impl Default for RigidBodyDescription {
    fn default() -> Self {
        Self {
            mass: 1.0,
            use_gravity: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent metadata
// ---------------------------------------------------------------------------

/// RL agent attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescription {
    pub action: ActionSpec,
    /// Name of the camera node used for observations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default = "default_one")]
    pub move_speed: f32,
    /// Degrees per second.
    #[serde(default = "default_one")]
    pub turn_speed: f32,
    #[serde(default)]
    pub reward_functions: Vec<RewardFunctionDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_sensors: Vec<StateSensorDescription>,
}

impl AgentDescription {
    #[must_use]
    pub const fn new(action: ActionSpec) -> Self {
        Self {
            action,
            camera: None,
            move_speed: 1.0,
            turn_speed: 1.0,
            reward_functions: Vec::new(),
            state_sensors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_camera(mut self, camera: impl Into<String>) -> Self {
        self.camera = Some(camera.into());
        self
    }

    #[must_use]
    pub fn with_reward(mut self, reward: RewardFunctionDescription) -> Self {
        self.reward_functions.push(reward);
        self
    }

    #[must_use]
    pub fn with_state_sensor(mut self, sensor: StateSensorDescription) -> Self {
        self.state_sensors.push(sensor);
        self
    }
}

fn default_properties() -> Vec<String> {
    vec!["distance".to_string()]
}

/// Numeric observation of one node, optionally relative to another.
///
/// Properties are `position`, `velocity` and `rotation` (whole vector or a
/// single `.x`/`.y`/`.z` component) and `distance`. Without a reference the
/// world origin is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSensorDescription {
    pub name: String,
    pub target_entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_entity: Option<String>,
    #[serde(default = "default_properties")]
    pub properties: Vec<String>,
}

impl StateSensorDescription {
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity: target.into(),
            reference_entity: None,
            properties: default_properties(),
        }
    }

    #[must_use]
    pub fn relative_to(mut self, reference: impl Into<String>) -> Self {
        self.reference_entity = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionDistribution {
    Discrete,
    Continuous,
}

impl ActionDistribution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discrete => "discrete",
            Self::Continuous => "continuous",
        }
    }
}

/// Declared action space of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub dist: ActionDistribution,
    pub available_actions: Vec<String>,
}

impl ActionSpec {
    pub fn discrete<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dist: ActionDistribution::Discrete,
            available_actions: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn continuous<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dist: ActionDistribution::Continuous,
            available_actions: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Declarative reward function, resolved against the scene at load time.
///
/// Composite types (`and`, `or`, `xor`, `not`) use `children`; the others
/// track `entity_a` relative to `entity_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardFunctionDescription {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_b: Option<String>,
    #[serde(default = "default_metric")]
    pub distance_metric: String,
    #[serde(default = "default_one")]
    pub scalar: f32,
    #[serde(default = "default_one")]
    pub threshold: f32,
    #[serde(default)]
    pub is_terminal: bool,
    #[serde(default)]
    pub is_collectable: bool,
    #[serde(default = "default_true")]
    pub trigger_once: bool,
    #[serde(default = "default_direction")]
    pub direction: [f32; 3],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RewardFunctionDescription>,
}

fn default_metric() -> String {
    "euclidean".into()
}
fn default_direction() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

impl RewardFunctionDescription {
    /// A reward of `kind` between two entities, other fields defaulted.
    #[must_use]
    pub fn between(kind: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            entity_a: Some(a.into()),
            entity_b: Some(b.into()),
            ..Self::of(kind)
        }
    }

    /// A composite reward over `children`.
    #[must_use]
    pub fn composite(kind: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            children,
            ..Self::of(kind)
        }
    }

    /// A reward of `kind` with every other field defaulted.
    #[must_use]
    pub fn of(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            entity_a: None,
            entity_b: None,
            distance_metric: default_metric(),
            scalar: 1.0,
            threshold: 1.0,
            is_terminal: false,
            is_collectable: false,
            trigger_once: true,
            direction: default_direction(),
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
