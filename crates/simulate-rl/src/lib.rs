//! Reinforcement-learning layer for Simulate scenes.
//!
//! Agents are declared on scene nodes. [`RlPlugin`] builds them when a scene
//! loads, applies their pending actions on every physics sub-step and
//! evaluates their [`RewardFunction`]s once per external step. The
//! [`AgentManager`] answers the batched reward, done and observation
//! queries in agent-id order.

pub mod actions;
pub mod agent;
pub mod manager;
pub mod observation;
pub mod plugin;
pub mod reward;
pub mod sensor;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use actions::{ActionMapping, ContinuousAxis, DiscreteAction, MovementAxes};
pub use agent::Agent;
pub use manager::AgentManager;
pub use observation::Observation;
pub use plugin::RlPlugin;
pub use reward::{DistanceMetric, RewardFunction, Trigger};
pub use sensor::{StateReading, StateSensor};
