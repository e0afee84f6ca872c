//! State sensors: numeric observations read from node transforms.
//!
//! A sensor reads its target node, subtracts the reference node (or the
//! world origin) and packs the requested properties into one flat `f32`
//! vector in declaration order.

use bevy_math::{EulerRot, Quat, Vec3};
use serde::Serialize;
use simulate_core::description::StateSensorDescription;
use simulate_core::error::SceneError;
use simulate_core::scene::SceneEngine;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Position,
    Velocity,
    /// Euler XYZ, degrees.
    Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateProperty {
    /// The whole vector, or one component when `axis` is set.
    Vector {
        quantity: Quantity,
        axis: Option<usize>,
    },
    Distance,
}

impl StateProperty {
    pub fn parse(name: &str) -> Result<Self, SceneError> {
        if name == "distance" {
            return Ok(Self::Distance);
        }
        let (base, axis) = match name.split_once('.') {
            Some((base, "x")) => (base, Some(0)),
            Some((base, "y")) => (base, Some(1)),
            Some((base, "z")) => (base, Some(2)),
            Some(_) => return Err(unknown_property(name)),
            None => (name, None),
        };
        let quantity = match base {
            "position" => Quantity::Position,
            "velocity" => Quantity::Velocity,
            "rotation" => Quantity::Rotation,
            _ => return Err(unknown_property(name)),
        };
        Ok(Self::Vector { quantity, axis })
    }

    /// Number of values this property contributes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Vector { axis: None, .. } => 3,
            Self::Vector { axis: Some(_), .. } | Self::Distance => 1,
        }
    }
}

fn unknown_property(name: &str) -> SceneError {
    SceneError::InvalidData(format!("unknown state sensor property: {name}"))
}

/// Snapshot of one node used as either end of a sensor.
#[derive(Debug, Clone, Copy)]
struct Pose {
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
}

impl Pose {
    const ORIGIN: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        velocity: Vec3::ZERO,
    };

    fn read(scene: &dyn SceneEngine, name: &str) -> Option<Self> {
        let data = scene.node_data(name)?;
        Some(Self {
            position: Vec3::from_array(data.position),
            rotation: Quat::from_array(data.rotation).normalize(),
            velocity: data.velocity.map_or(Vec3::ZERO, Vec3::from_array),
        })
    }
}

/// One sensor's values for a single observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateReading {
    pub name: String,
    pub shape: [usize; 1],
    pub data: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct StateSensor {
    name: String,
    target: String,
    reference: Option<String>,
    properties: Vec<StateProperty>,
}

impl StateSensor {
    /// Resolve `desc` against the loaded scene.
    pub fn build(
        desc: &StateSensorDescription,
        scene: &dyn SceneEngine,
    ) -> Result<Self, SceneError> {
        for node in std::iter::once(&desc.target_entity).chain(&desc.reference_entity) {
            if !scene.contains(node) {
                return Err(SceneError::NodeNotFound(node.clone()));
            }
        }
        if desc.properties.is_empty() {
            return Err(SceneError::InvalidData(format!(
                "state sensor {} has no properties",
                desc.name
            )));
        }
        let properties = desc
            .properties
            .iter()
            .map(|p| StateProperty::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: desc.name.clone(),
            target: desc.target_entity.clone(),
            reference: desc.reference_entity.clone(),
            properties,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of values per reading.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.iter().map(|p| p.width()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Read the sensor. Nodes removed since build read as zeros.
    pub fn read(&self, scene: &dyn SceneEngine) -> StateReading {
        let target = Pose::read(scene, &self.target);
        let reference = match &self.reference {
            Some(name) => Pose::read(scene, name),
            None => Some(Pose::ORIGIN),
        };
        let data = match target.zip(reference) {
            Some((target, reference)) => self.values(target, reference),
            None => {
                warn!(sensor = %self.name, "sensor node missing; reading zeros");
                vec![0.0; self.len()]
            }
        };
        StateReading {
            name: self.name.clone(),
            shape: [data.len()],
            data,
        }
    }

    fn values(&self, target: Pose, reference: Pose) -> Vec<f32> {
        let offset = target.position - reference.position;
        let mut data = Vec::with_capacity(self.len());
        for property in &self.properties {
            let StateProperty::Vector { quantity, axis } = *property else {
                data.push(offset.length());
                continue;
            };
            let vector = match quantity {
                Quantity::Position => offset,
                Quantity::Velocity => target.velocity - reference.velocity,
                Quantity::Rotation => {
                    let relative = reference.rotation.inverse() * target.rotation;
                    let (x, y, z) = relative.to_euler(EulerRot::XYZ);
                    Vec3::new(x, y, z) * (180.0 / std::f32::consts::PI)
                }
            };
            match axis {
                Some(i) => data.push(vector[i]),
                None => data.extend_from_slice(&vector.to_array()),
            }
        }
        data
    }
}
