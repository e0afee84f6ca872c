//! Batched RL queries. Each replies with a JSON array holding one entry per
//! agent, in agent-id order.

use serde::Deserialize;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Per-agent camera observations.
#[derive(Debug, Deserialize)]
pub struct GetObservation {}

impl Command for GetObservation {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let observations = ctx.with_agents(|agents, scene| agents.get_observation(scene))?;
        Outcome::json(&observations)
    }
}

/// Per-agent reward accumulated since the last call. Reading zeroes it.
#[derive(Debug, Deserialize)]
pub struct GetReward {}

impl Command for GetReward {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let rewards = ctx.with_agents(|agents, _| agents.get_reward())?;
        Outcome::json(&rewards)
    }
}

/// Per-agent episode-done flags.
#[derive(Debug, Deserialize)]
pub struct GetDone {}

impl Command for GetDone {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let done = ctx.with_agents(|agents, _| agents.get_done())?;
        Outcome::json(&done)
    }
}
