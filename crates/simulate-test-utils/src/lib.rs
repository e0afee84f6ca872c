//! Shared test fixtures and utilities for Simulate crates.
//!
//! Provides a recording scene-engine mock and scene description fixtures
//! used by the simulator, RL and bridge test suites.

pub mod mocks;
pub mod scenes;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{CallLog, RecordingScene};
pub use scenes::{cube_scene, scene_bytes, single_agent_scene, two_agent_scene};
