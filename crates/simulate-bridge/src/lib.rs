//! Command bridge between a controller process and the simulator.
//!
//! - [`framing`]: 4-byte LE `u32` length prefix + payload
//! - [`protocol`]: request envelope, wire constants and [`BridgeConfig`]
//! - [`registry`] / [`dispatcher`]: command lookup and execution
//! - [`commands`]: the built-in command set
//! - [`connection`]: the TCP connection and its receive thread
//! - [`bridge`]: [`Bridge`], the loop run on the simulation thread
//!
//! Every request gets exactly one response, in request order. Failures are
//! reported as a plain-text response and never stop the loop; only a
//! broken connection does.

pub mod bridge;
pub mod command;
pub mod commands;
pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod registry;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use bridge::{Bridge, ExitReason};
pub use command::{Command, Deferred, Outcome};
pub use connection::{Connection, ConnectionState, Inbound};
pub use context::SimContext;
pub use dispatcher::Dispatcher;
pub use error::{CommandError, ProtocolError};
pub use protocol::{BridgeConfig, DEFAULT_PORT, MAX_MESSAGE_SIZE, Message};
pub use registry::CommandRegistry;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Bridge, BridgeConfig, Command, CommandError, CommandRegistry, Connection, ExitReason,
        Outcome, ProtocolError, SimContext,
    };
}
