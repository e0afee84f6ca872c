use serde::Deserialize;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Reply with `message`. The smallest example of a custom command.
#[derive(Debug, Deserialize)]
pub struct Echo {
    #[serde(default)]
    message: String,
}

impl Command for Echo {
    fn execute(self: Box<Self>, _ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        Ok(Outcome::Ready(self.message))
    }
}
