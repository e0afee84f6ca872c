use serde::Deserialize;
use tracing::{info, warn};

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Unload the scene and end the session after replying.
#[derive(Debug, Deserialize)]
pub struct Close {}

impl Command for Close {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        if let Err(err) = ctx.simulator.unload() {
            warn!(%err, "scene unload failed during close");
        }
        ctx.close_requested = true;
        info!("close requested");
        Ok(Outcome::ack())
    }
}
