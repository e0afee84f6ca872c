use serde::Deserialize;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Restore scene nodes and reset every agent.
///
/// Without a loaded scene this is a logged no-op.
#[derive(Debug, Deserialize)]
pub struct Reset {}

impl Command for Reset {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        ctx.simulator.reset();
        Ok(Outcome::ack())
    }
}
