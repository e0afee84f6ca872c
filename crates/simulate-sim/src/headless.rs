//! Headless scene engine backed by an ECS world.
//!
//! [`HeadlessScene`] spawns one entity per scene node carrying a
//! [`Transform`] plus bookkeeping components. Physics is a semi-implicit
//! Euler integrator over kinematic bodies and rendering fills each camera's
//! frame with the ambient colour. It stands in for a real engine in
//! headless runs and tests.

use std::collections::HashMap;

use bevy_ecs::component::Component;
use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use bevy_math::Vec3;
use bevy_transform::components::Transform;
use simulate_core::config::SimulationConfig;
use simulate_core::description::SceneDescription;
use simulate_core::error::SceneError;
use simulate_core::scene::SceneEngine;
use simulate_core::types::{ForceMode, Frame, NodeData, color_to_rgb8};
use tracing::debug;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Name and parent of a scene node.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<String>,
}

/// Transform captured at load time, restored on reset.
#[derive(Component, Debug, Clone, Copy)]
struct InitialState(Transform);

#[derive(Component, Debug, Clone, Copy)]
struct Active(bool);

/// Kinematic body state.
#[derive(Component, Debug, Clone, Copy)]
struct Kinematics {
    velocity: Vec3,
    /// Acceleration applied over the next step, then cleared.
    pending: Vec3,
    mass: f32,
    use_gravity: bool,
}

#[derive(Component, Debug, Clone, Copy)]
struct CameraSensor {
    width: u32,
    height: u32,
}

// ---------------------------------------------------------------------------
// HeadlessScene
// ---------------------------------------------------------------------------

pub struct HeadlessScene {
    world: World,
    index: HashMap<String, Entity>,
    order: Vec<String>,
    gravity: Vec3,
    ambient: [u8; 3],
    elapsed: f32,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessScene {
    #[must_use]
    pub fn new() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            world: World::new(),
            index: HashMap::new(),
            order: Vec::new(),
            gravity: Vec3::from_array(defaults.gravity),
            ambient: color_to_rgb8(defaults.ambient_color),
            elapsed: 0.0,
        }
    }

    /// Simulated seconds since load.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Current velocity of a node with a body.
    pub fn velocity(&self, name: &str) -> Option<Vec3> {
        let entity = *self.index.get(name)?;
        self.world.get::<Kinematics>(entity).map(|k| k.velocity)
    }

    /// Parent node name, if any.
    pub fn parent(&self, name: &str) -> Option<&str> {
        let entity = *self.index.get(name)?;
        self.world.get::<SceneNode>(entity)?.parent.as_deref()
    }

    fn entity(&self, name: &str) -> Result<Entity, SceneError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))
    }
}

impl SceneEngine for HeadlessScene {
    fn load(&mut self, description: &SceneDescription) -> Result<(), SceneError> {
        description.validate()?;
        for node in &description.nodes {
            if let Some(body) = &node.rigid_body {
                if body.mass.is_nan() || body.mass <= 0.0 {
                    return Err(SceneError::InvalidData(format!(
                        "node {} has non-positive mass {}",
                        node.name, body.mass
                    )));
                }
            }
        }

        self.unload();
        for node in &description.nodes {
            let transform = node.transform();
            let mut entity = self.world.spawn((
                SceneNode {
                    name: node.name.clone(),
                    parent: node.parent.clone(),
                },
                transform,
                InitialState(transform),
                Active(true),
            ));
            if let Some(body) = node.rigid_body {
                entity.insert(Kinematics {
                    velocity: Vec3::ZERO,
                    pending: Vec3::ZERO,
                    mass: body.mass,
                    use_gravity: body.use_gravity,
                });
            }
            if let Some(camera) = node.camera {
                entity.insert(CameraSensor {
                    width: camera.width,
                    height: camera.height,
                });
            }
            let id = entity.id();
            self.index.insert(node.name.clone(), id);
            self.order.push(node.name.clone());
        }
        debug!(scene = %description.name, nodes = self.order.len(), "headless scene loaded");
        Ok(())
    }

    fn unload(&mut self) {
        self.world.clear_entities();
        self.index.clear();
        self.order.clear();
        self.elapsed = 0.0;
    }

    fn node_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn transform(&self, name: &str) -> Option<Transform> {
        let entity = *self.index.get(name)?;
        self.world.get::<Transform>(entity).copied()
    }

    fn set_transform(&mut self, name: &str, transform: Transform) -> Result<(), SceneError> {
        let entity = self.entity(name)?;
        let mut current = self
            .world
            .get_mut::<Transform>(entity)
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))?;
        *current = transform;
        Ok(())
    }

    fn node_data(&self, name: &str) -> Option<NodeData> {
        let entity = *self.index.get(name)?;
        let transform = self.world.get::<Transform>(entity)?;
        let active = self.world.get::<Active>(entity).is_none_or(|a| a.0);
        let mut data = NodeData::from_transform(transform).with_active(active);
        if let Some(kinematics) = self.world.get::<Kinematics>(entity) {
            data = data.with_velocity(kinematics.velocity);
        }
        Some(data)
    }

    fn add_force(&mut self, name: &str, force: Vec3, mode: ForceMode) -> Result<(), SceneError> {
        let entity = self.entity(name)?;
        let mut body = self
            .world
            .get_mut::<Kinematics>(entity)
            .ok_or_else(|| SceneError::NoRigidBody(name.to_string()))?;
        let delta = if mode.uses_mass() {
            force / body.mass
        } else {
            force
        };
        if mode.is_instant() {
            body.velocity += delta;
        } else {
            body.pending += delta;
        }
        Ok(())
    }

    fn set_active(&mut self, name: &str, active: bool) -> Result<(), SceneError> {
        let entity = self.entity(name)?;
        let mut flag = self
            .world
            .get_mut::<Active>(entity)
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))?;
        flag.0 = active;
        Ok(())
    }

    fn is_active(&self, name: &str) -> Option<bool> {
        let entity = *self.index.get(name)?;
        self.world.get::<Active>(entity).map(|a| a.0)
    }

    fn step_physics(&mut self, dt: f32) {
        let gravity = self.gravity;
        let mut bodies = self
            .world
            .query::<(&mut Transform, &mut Kinematics, &Active)>();
        for (mut transform, mut body, active) in bodies.iter_mut(&mut self.world) {
            if !active.0 {
                continue;
            }
            let mut acceleration = body.pending;
            if body.use_gravity {
                acceleration += gravity;
            }
            body.velocity += acceleration * dt;
            transform.translation += body.velocity * dt;
            body.pending = Vec3::ZERO;
        }
        self.elapsed += dt;
    }

    fn camera_names(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| {
                self.index
                    .get(name.as_str())
                    .is_some_and(|e| self.world.get::<CameraSensor>(*e).is_some())
            })
            .cloned()
            .collect()
    }

    fn render(&mut self, camera: &str) -> Result<Frame, SceneError> {
        let sensor = self
            .index
            .get(camera)
            .and_then(|e| self.world.get::<CameraSensor>(*e))
            .ok_or_else(|| SceneError::CameraNotFound(camera.to_string()))?;
        Ok(Frame::filled(sensor.width, sensor.height, self.ambient))
    }

    fn apply_config(&mut self, config: &SimulationConfig) {
        self.gravity = Vec3::from_array(config.gravity);
        self.ambient = color_to_rgb8(config.ambient_color);
    }

    fn reset_nodes(&mut self) {
        let mut nodes = self.world.query::<(
            &mut Transform,
            &InitialState,
            &mut Active,
            Option<&mut Kinematics>,
        )>();
        for (mut transform, initial, mut active, body) in nodes.iter_mut(&mut self.world) {
            *transform = initial.0;
            active.0 = true;
            if let Some(mut body) = body {
                body.velocity = Vec3::ZERO;
                body.pending = Vec3::ZERO;
            }
        }
        self.elapsed = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
