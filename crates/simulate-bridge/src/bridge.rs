//! The simulation-thread loop.
//!
//! Each tick the loop polls the pending deferred command, dispatches queued
//! frames, and waits up to the poll interval for more input. Frames are
//! dispatched strictly in arrival order and a frame is not dispatched while
//! an earlier command is still pending, so responses leave in request
//! order.

use std::collections::VecDeque;
use std::task::Poll;

use tracing::{debug, info, warn};

use crate::command::{Deferred, Outcome};
use crate::connection::{Connection, Inbound};
use crate::context::SimContext;
use crate::dispatcher::Dispatcher;
use crate::error::ProtocolError;
use crate::protocol::{BridgeConfig, MAX_MESSAGE_SIZE};
use crate::registry::CommandRegistry;

/// Why [`Bridge::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A `Close` command was handled.
    CloseRequested,
    /// The controller closed the connection.
    PeerClosed,
}

#[derive(Debug)]
pub struct Bridge {
    dispatcher: Dispatcher,
    config: BridgeConfig,
}

impl Bridge {
    /// Bridge serving the built-in commands.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_registry(config, CommandRegistry::with_builtins())
    }

    pub const fn with_registry(config: BridgeConfig, registry: CommandRegistry) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            config,
        }
    }

    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Connect to the controller at the configured address and serve it.
    pub fn connect_and_run(&self, ctx: &mut SimContext) -> Result<ExitReason, ProtocolError> {
        info!(address = %self.config.address(), "connecting to controller");
        let mut connection =
            Connection::connect(self.config.address(), self.config.max_message_size)?;
        self.run(&mut connection, ctx)
    }

    /// Serve `connection` until `Close`, peer disconnect or a fatal error.
    ///
    /// The connection is closed on return. A pending command's result is
    /// dropped if the peer goes away first.
    pub fn run(
        &self,
        connection: &mut Connection,
        ctx: &mut SimContext,
    ) -> Result<ExitReason, ProtocolError> {
        ctx.close_requested = false;
        let result = self.serve(connection, ctx);
        connection.close();
        match &result {
            Ok(reason) => info!(?reason, "bridge stopped"),
            Err(err) => warn!(%err, "bridge stopped on error"),
        }
        result
    }

    fn serve(
        &self,
        connection: &mut Connection,
        ctx: &mut SimContext,
    ) -> Result<ExitReason, ProtocolError> {
        let mut backlog: VecDeque<Vec<u8>> = VecDeque::new();
        let mut pending: Option<Deferred> = None;

        loop {
            if let Some(deferred) = pending.as_mut() {
                if let Poll::Ready(result) = deferred.poll(ctx) {
                    pending = None;
                    let text = result.unwrap_or_else(|err| {
                        warn!(%err, "deferred command failed");
                        err.to_string()
                    });
                    self.respond(connection, &text)?;
                }
            }

            while pending.is_none() {
                if ctx.close_requested {
                    return Ok(ExitReason::CloseRequested);
                }
                let Some(frame) = backlog.pop_front() else {
                    break;
                };
                match self.dispatcher.handle(&frame, ctx) {
                    Outcome::Ready(text) => self.respond(connection, &text)?,
                    Outcome::Deferred(deferred) => pending = Some(deferred),
                }
            }

            match connection.recv_timeout(self.config.poll_interval) {
                Some(Inbound::Frame(frame)) => {
                    debug!(bytes = frame.len(), "frame received");
                    backlog.push_back(frame);
                }
                Some(Inbound::Closed) => {
                    if pending.is_some() || !backlog.is_empty() {
                        warn!(
                            queued = backlog.len(),
                            "peer closed with requests outstanding; dropping results"
                        );
                    }
                    return Ok(ExitReason::PeerClosed);
                }
                Some(Inbound::Failed(err)) => return Err(err),
                None => {}
            }
        }
    }

    /// Send one response. A response above the frame limit is replaced by
    /// a short error text so the request is still answered.
    fn respond(&self, connection: &mut Connection, text: &str) -> Result<(), ProtocolError> {
        let max = self.config.max_message_size.min(MAX_MESSAGE_SIZE);
        if text.len() <= max {
            return connection.send(text.as_bytes());
        }
        warn!(size = text.len(), max, "response too large; sending error instead");
        let error = format!("Response too large: {} bytes (max {max})", text.len());
        connection.send(error.as_bytes())
    }
}
