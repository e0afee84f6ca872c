use bevy_math::{Mat4, Quat, Vec3};
use bevy_transform::components::Transform;
use serde::Deserialize;
use simulate_core::error::SceneError;
use tracing::debug;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Set a node's transform.
///
/// A non-identity `matrix` (16 floats, column-major) is decomposed and wins
/// over the individual fields. Otherwise `position`, `rotation` (xyzw) and
/// `scale` replace the matching parts of the current transform; omitted
/// fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateAsset {
    name: String,
    #[serde(default)]
    matrix: Option<[f32; 16]>,
    #[serde(default)]
    position: Option<[f32; 3]>,
    #[serde(default)]
    rotation: Option<[f32; 4]>,
    #[serde(default)]
    scale: Option<[f32; 3]>,
}

impl UpdateAsset {
    fn target(&self, current: Transform) -> Result<Transform, CommandError> {
        if let Some(matrix) = self.matrix.map(|m| Mat4::from_cols_array(&m)) {
            if matrix != Mat4::IDENTITY {
                if !matrix.is_finite() {
                    return Err(CommandError::argument("UpdateAsset", "matrix must be finite"));
                }
                return Ok(Transform::from_matrix(matrix));
            }
        }

        let mut transform = current;
        if let Some(position) = self.position {
            transform.translation = finite(Vec3::from_array(position), "position")?;
        }
        if let Some(rotation) = self.rotation {
            let rotation = Quat::from_array(rotation);
            if !rotation.is_finite() || rotation.length_squared() == 0.0 {
                return Err(CommandError::argument(
                    "UpdateAsset",
                    "rotation must be a non-zero finite quaternion",
                ));
            }
            transform.rotation = rotation.normalize();
        }
        if let Some(scale) = self.scale {
            transform.scale = finite(Vec3::from_array(scale), "scale")?;
        }
        Ok(transform)
    }
}

fn finite(value: Vec3, field: &str) -> Result<Vec3, CommandError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CommandError::argument(
            "UpdateAsset",
            format!("{field} must be finite"),
        ))
    }
}

impl Command for UpdateAsset {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let scene = ctx.simulator.scene_mut();
        let current = scene
            .transform(&self.name)
            .ok_or_else(|| SceneError::NodeNotFound(self.name.clone()))?;
        let transform = self.target(current)?;
        scene.set_transform(&self.name, transform)?;
        debug!(node = %self.name, "asset updated");
        Ok(Outcome::ack())
    }
}
