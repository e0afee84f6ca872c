use serde::Deserialize;
use serde_json::{Map, Value};
use simulate_core::config::StepOverrides;
use simulate_sim::SceneState;

use crate::command::{Command, Outcome};
use crate::context::SimContext;
use crate::error::CommandError;

/// Advance one external step, optionally setting agent actions first.
///
/// Remaining keyword arguments are per-step overrides (`frame_skip`,
/// `time_step`, `return_nodes`, `return_frames`). The action payload and
/// overrides are both validated before anything changes. Replies with the
/// step's event as JSON.
#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(default)]
    action: Value,
    #[serde(flatten)]
    kwargs: Map<String, Value>,
}

impl Command for Step {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError> {
        let Self { action, kwargs } = *self;

        if ctx.simulator.state() == SceneState::Default {
            let mut scratch = ctx.simulator.config().clone();
            StepOverrides::from_kwargs(&kwargs)?.apply(&mut scratch)?;
            if !action.is_null() {
                ctx.with_agents(|agents, _| agents.set_actions(&action))??;
            }
        }

        let event = ctx.simulator.step(kwargs)?;
        event
            .to_json()
            .map(Outcome::Ready)
            .map_err(|e| CommandError::InvalidState(format!("event encoding failed: {e}")))
    }
}
