//! Mock scene engine for testing.
//!
//! [`RecordingScene`] implements [`SceneEngine`] without any physics: it
//! stores transforms, serves scripted frames, and appends every call to a
//! shared [`CallLog`] so tests can assert on call counts and ordering.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use bevy_math::Vec3;
use bevy_transform::components::Transform;
use simulate_core::config::SimulationConfig;
use simulate_core::description::SceneDescription;
use simulate_core::error::SceneError;
use simulate_core::scene::SceneEngine;
use simulate_core::types::{ForceMode, Frame};

// ---------------------------------------------------------------------------
// CallLog
// ---------------------------------------------------------------------------

/// Shared, cloneable log of call labels.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries equal to `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.as_str() == entry)
            .count()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ---------------------------------------------------------------------------
// RecordingScene
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct MockNode {
    initial: Transform,
    transform: Transform,
    active: bool,
    has_body: bool,
}

/// A [`SceneEngine`] that records calls and keeps transforms in a map.
///
/// Logged labels: `load`, `unload`, `step_physics`, `render:<camera>`,
/// `set_transform:<node>`, `add_force:<node>`, `set_active:<node>`,
/// `apply_config`, `reset_nodes`.
#[derive(Debug, Default)]
pub struct RecordingScene {
    log: CallLog,
    order: Vec<String>,
    nodes: BTreeMap<String, MockNode>,
    cameras: BTreeMap<String, Frame>,
    camera_order: Vec<String>,
    elapsed: f32,
}

impl RecordingScene {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    /// Add a node at `transform`.
    #[must_use]
    pub fn with_node(mut self, name: &str, transform: Transform) -> Self {
        self.insert_node(name, transform, false);
        self
    }

    /// Add a node that accepts forces.
    #[must_use]
    pub fn with_body(mut self, name: &str, transform: Transform) -> Self {
        self.insert_node(name, transform, true);
        self
    }

    /// Add a camera node that renders `frame`.
    #[must_use]
    pub fn with_camera(mut self, name: &str, frame: Frame) -> Self {
        self.insert_node(name, Transform::IDENTITY, false);
        self.camera_order.push(name.to_string());
        self.cameras.insert(name.to_string(), frame);
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Sum of all `dt` passed to `step_physics`.
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn insert_node(&mut self, name: &str, transform: Transform, has_body: bool) {
        if !self.nodes.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.nodes.insert(
            name.to_string(),
            MockNode {
                initial: transform,
                transform,
                active: true,
                has_body,
            },
        );
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut MockNode, SceneError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))
    }
}

impl SceneEngine for RecordingScene {
    fn load(&mut self, description: &SceneDescription) -> Result<(), SceneError> {
        self.log.push("load");
        description.validate()?;
        self.unload_quiet();
        for node in &description.nodes {
            self.insert_node(&node.name, node.transform(), node.rigid_body.is_some());
            if let Some(camera) = node.camera {
                self.camera_order.push(node.name.clone());
                self.cameras
                    .insert(node.name.clone(), Frame::new(camera.width, camera.height));
            }
        }
        Ok(())
    }

    fn unload(&mut self) {
        self.log.push("unload");
        self.unload_quiet();
    }

    fn node_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn transform(&self, name: &str) -> Option<Transform> {
        self.nodes.get(name).map(|n| n.transform)
    }

    fn set_transform(&mut self, name: &str, transform: Transform) -> Result<(), SceneError> {
        self.log.push(format!("set_transform:{name}"));
        self.node_mut(name)?.transform = transform;
        Ok(())
    }

    fn add_force(&mut self, name: &str, _force: Vec3, _mode: ForceMode) -> Result<(), SceneError> {
        self.log.push(format!("add_force:{name}"));
        if self.node_mut(name)?.has_body {
            Ok(())
        } else {
            Err(SceneError::NoRigidBody(name.to_string()))
        }
    }

    fn set_active(&mut self, name: &str, active: bool) -> Result<(), SceneError> {
        self.log.push(format!("set_active:{name}"));
        self.node_mut(name)?.active = active;
        Ok(())
    }

    fn is_active(&self, name: &str) -> Option<bool> {
        self.nodes.get(name).map(|n| n.active)
    }

    fn step_physics(&mut self, dt: f32) {
        self.log.push("step_physics");
        self.elapsed += dt;
    }

    fn camera_names(&self) -> Vec<String> {
        self.camera_order.clone()
    }

    fn render(&mut self, camera: &str) -> Result<Frame, SceneError> {
        self.log.push(format!("render:{camera}"));
        self.cameras
            .get(camera)
            .cloned()
            .ok_or_else(|| SceneError::CameraNotFound(camera.to_string()))
    }

    fn apply_config(&mut self, _config: &SimulationConfig) {
        self.log.push("apply_config");
    }

    fn reset_nodes(&mut self) {
        self.log.push("reset_nodes");
        for node in self.nodes.values_mut() {
            node.transform = node.initial;
            node.active = true;
        }
    }
}

impl RecordingScene {
    fn unload_quiet(&mut self) {
        self.order.clear();
        self.nodes.clear();
        self.cameras.clear();
        self.camera_order.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_log_is_shared_between_clones() {
        let log = CallLog::new();
        let clone = log.clone();
        clone.push("a");
        log.push("b");
        assert_eq!(log.entries(), vec!["a", "b"]);
        assert_eq!(clone.count("a"), 1);
        log.clear();
        assert!(clone.entries().is_empty());
    }

    #[test]
    fn records_steps_and_elapsed_time() {
        let mut scene = RecordingScene::new(CallLog::new());
        scene.step_physics(0.5);
        scene.step_physics(0.25);
        assert_eq!(scene.log().count("step_physics"), 2);
        assert!((scene.elapsed() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn forces_require_a_body() {
        let mut scene = RecordingScene::new(CallLog::new())
            .with_node("floor", Transform::IDENTITY)
            .with_body("cube", Transform::IDENTITY);
        scene.add_force("cube", Vec3::Y, ForceMode::Force).unwrap();
        assert!(matches!(
            scene.add_force("floor", Vec3::Y, ForceMode::Force),
            Err(SceneError::NoRigidBody(_))
        ));
        assert!(matches!(
            scene.add_force("ghost", Vec3::Y, ForceMode::Force),
            Err(SceneError::NodeNotFound(_))
        ));
    }

    #[test]
    fn reset_restores_transforms() {
        let mut scene =
            RecordingScene::new(CallLog::new()).with_node("a", Transform::from_xyz(1.0, 0.0, 0.0));
        scene
            .set_transform("a", Transform::from_xyz(5.0, 0.0, 0.0))
            .unwrap();
        scene.set_active("a", false).unwrap();
        scene.reset_nodes();
        assert_eq!(scene.transform("a"), Some(Transform::from_xyz(1.0, 0.0, 0.0)));
        assert_eq!(scene.is_active("a"), Some(true));
    }

    #[test]
    fn render_serves_scripted_frames() {
        let frame = Frame::filled(2, 2, [1, 2, 3]);
        let mut scene = RecordingScene::new(CallLog::new()).with_camera("cam", frame.clone());
        assert_eq!(scene.render("cam").unwrap(), frame);
        assert!(scene.render("other").is_err());
        assert_eq!(scene.camera_names(), vec!["cam"]);
    }
}
