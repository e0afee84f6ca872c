use bevy_math::Vec3;
use serde::Deserialize;
use simulate_core::types::ForceMode;
use tracing::debug;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Apply a force to a node's rigid body.
#[derive(Debug, Deserialize)]
pub struct AddForce {
    name: String,
    force: [f32; 3],
    #[serde(default)]
    force_mode: ForceMode,
}

impl Command for AddForce {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let force = Vec3::from_array(self.force);
        if !force.is_finite() {
            return Err(CommandError::argument("AddForce", "force must be finite"));
        }
        ctx.simulator
            .scene_mut()
            .add_force(&self.name, force, self.force_mode)?;
        debug!(node = %self.name, ?force, mode = ?self.force_mode, "force applied");
        Ok(Outcome::ack())
    }
}
