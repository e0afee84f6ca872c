//! Scene lifecycle, plugin hooks and the frame-skip stepping loop.
//!
//! [`Simulator`] drives a [`SceneEngine`](simulate_core::SceneEngine) and a
//! list of [`Plugin`]s. [`HeadlessScene`] is an ECS-backed engine for runs
//! without a rendering host, and [`JsonSceneLoader`] parses scene documents.
//!
//! # Example
//!
//! ```
//! use serde_json::Map;
//! use simulate_core::description::{NodeDescription, SceneDescription};
//! use simulate_sim::{HeadlessScene, Simulator};
//!
//! let mut sim = Simulator::new(Box::new(HeadlessScene::new()));
//! let scene = SceneDescription::new("demo")
//!     .with_node(NodeDescription::new("ball").at(0.0, 1.0, 0.0).with_rigid_body(1.0, true));
//! sim.load(&scene, &Map::new()).unwrap();
//! let event = sim.step(Map::new()).unwrap();
//! assert!(event.nodes["ball"].position[1] < 1.0);
//! ```

pub mod error;
pub mod event;
pub mod headless;
pub mod lifecycle;
pub mod loader;
pub mod plugin;
pub mod simulator;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::SimError;
pub use event::EventData;
pub use headless::HeadlessScene;
pub use lifecycle::{SceneLifecycle, SceneState};
pub use loader::{JsonSceneLoader, SceneLoader};
pub use plugin::Plugin;
pub use simulator::Simulator;
