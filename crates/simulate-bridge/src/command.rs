//! The command contract.
//!
//! Commands are deserialised from a request's keyword arguments, executed
//! once on the simulation thread, and produce exactly one response. A
//! command whose work finishes later returns a [`Deferred`] continuation
//! that the bridge loop polls until it is ready.

use std::fmt;
use std::task::Poll;

use crate::context::SimContext;
use crate::error::CommandError;
use crate::protocol::EMPTY_RESPONSE;

pub trait Command: Send {
    fn execute(self: Box<Self>, ctx: &mut SimContext) -> Result<Outcome, CommandError>;
}

/// Result of executing a command.
#[derive(Debug)]
pub enum Outcome {
    Ready(String),
    Deferred(Deferred),
}

impl Outcome {
    /// The `{}` acknowledgement.
    #[must_use]
    pub fn ack() -> Self {
        Self::Ready(EMPTY_RESPONSE.to_string())
    }

    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, CommandError> {
        serde_json::to_string(value)
            .map(Self::Ready)
            .map_err(|e| CommandError::InvalidState(format!("response encoding failed: {e}")))
    }
}

type PollFn = dyn FnMut(&mut SimContext) -> Poll<Result<String, CommandError>> + Send;

/// A continuation polled on the simulation thread until it yields the
/// response.
pub struct Deferred {
    poll: Box<PollFn>,
}

impl Deferred {
    pub fn new(
        poll: impl FnMut(&mut SimContext) -> Poll<Result<String, CommandError>> + Send + 'static,
    ) -> Self {
        Self {
            poll: Box::new(poll),
        }
    }

    pub fn poll(&mut self, ctx: &mut SimContext) -> Poll<Result<String, CommandError>> {
        (self.poll)(ctx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}
