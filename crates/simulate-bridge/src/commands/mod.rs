//! Built-in commands.
//!
//! Every command is a plain struct deserialised from the request's keyword
//! arguments. Unknown keyword arguments are ignored so that controllers can
//! send extra configuration alongside a command.

mod add_force;
mod close;
mod echo;
mod initialize;
mod reset;
mod rl;
mod step;
mod update_asset;

pub use add_force::AddForce;
pub use close::Close;
pub use echo::Echo;
pub use initialize::Initialize;
pub use reset::Reset;
pub use rl::{GetDone, GetObservation, GetReward};
pub use step::Step;
pub use update_asset::UpdateAsset;

use crate::registry::{Factory, build_command};

/// Registration table for the built-in commands.
pub const BUILTINS: &[(&str, Factory)] = &[
    ("Initialize", build_command::<Initialize>),
    ("Close", build_command::<Close>),
    ("Reset", build_command::<Reset>),
    ("Step", build_command::<Step>),
    ("AddForce", build_command::<AddForce>),
    ("UpdateAsset", build_command::<UpdateAsset>),
    ("GetObservation", build_command::<GetObservation>),
    ("GetReward", build_command::<GetReward>),
    ("GetDone", build_command::<GetDone>),
    ("Echo", build_command::<Echo>),
];
