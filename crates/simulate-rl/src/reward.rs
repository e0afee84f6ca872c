//! Reward functions attached to RL agents.
//!
//! [`RewardFunction`] is a sum type over the leaf rewards (`Dense`,
//! `Sparse`, `Timeout`, `See`, `AngleTo`) and the boolean composites
//! (`And`, `Or`, `Xor`, `Not`). Entities are referenced by node name and
//! read from the scene engine on every evaluation.
//!
//! Sparse-family rewards carry a [`Trigger`] latch: once set it stays set
//! until [`RewardFunction::reset`], and a `trigger_once` reward returns 0
//! on every later call.

use bevy_math::Vec3;
use bevy_transform::components::Transform;
use simulate_core::description::RewardFunctionDescription;
use simulate_core::error::RewardError;
use simulate_core::scene::SceneEngine;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// DistanceMetric
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMetric {
    /// Straight-line distance.
    Euclidean,
    /// Improvement over the best distance seen since reset, 0 otherwise.
    BestEuclidean { best: f32 },
    /// Cosine similarity of the two position vectors.
    Cosine,
}

impl DistanceMetric {
    pub fn parse(name: &str) -> Result<Self, RewardError> {
        match name {
            "euclidean" => Ok(Self::Euclidean),
            "best_euclidean" => Ok(Self::BestEuclidean {
                best: f32::INFINITY,
            }),
            "cosine" => Ok(Self::Cosine),
            other => Err(RewardError::UnknownMetric(other.to_string())),
        }
    }

    pub fn measure(&mut self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Euclidean => a.distance(b),
            Self::BestEuclidean { best } => {
                let distance = a.distance(b);
                if distance < *best {
                    let improvement = *best - distance;
                    *best = distance;
                    improvement
                } else {
                    0.0
                }
            }
            Self::Cosine => a.normalize_or_zero().dot(b.normalize_or_zero()),
        }
    }

    pub fn reset(&mut self, a: Vec3, b: Vec3) {
        if let Self::BestEuclidean { best } = self {
            *best = a.distance(b);
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// Latch and firing parameters shared by sparse-family rewards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub scalar: f32,
    pub threshold: f32,
    pub is_terminal: bool,
    pub is_collectable: bool,
    pub trigger_once: bool,
    pub has_triggered: bool,
}

impl Trigger {
    fn from_description(desc: &RewardFunctionDescription) -> Self {
        Self {
            scalar: desc.scalar,
            threshold: desc.threshold,
            is_terminal: desc.is_terminal,
            is_collectable: desc.is_collectable,
            trigger_once: desc.trigger_once,
            has_triggered: false,
        }
    }

    /// Whether the latch still allows firing.
    #[must_use]
    pub const fn armed(&self) -> bool {
        !self.has_triggered || !self.trigger_once
    }

    /// Fire if `condition` holds and the latch allows it.
    fn fire(&mut self, condition: bool) -> f32 {
        if condition && self.armed() {
            self.has_triggered = true;
            self.scalar
        } else {
            0.0
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.has_triggered && self.is_terminal
    }
}

// ---------------------------------------------------------------------------
// RewardFunction
// ---------------------------------------------------------------------------

/// A pair of tracked nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entities {
    pub a: String,
    pub b: String,
}

/// Children and latch of a boolean composite.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub children: Vec<RewardFunction>,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RewardFunction {
    /// `metric(a, b) * scalar` every call.
    Dense {
        entities: Entities,
        metric: DistanceMetric,
        scalar: f32,
    },
    /// Fires when `metric(a, b) < threshold`.
    Sparse {
        entities: Entities,
        metric: DistanceMetric,
        trigger: Trigger,
    },
    /// Fires once when the number of evaluations exceeds `threshold`.
    Timeout { trigger: Trigger, steps: u32 },
    /// Fires when `b` lies within `threshold` degrees of `a`'s forward axis.
    See { entities: Entities, trigger: Trigger },
    /// Fires when `a - b` lies within `threshold` degrees of `direction`.
    AngleTo {
        entities: Entities,
        direction: Vec3,
        trigger: Trigger,
    },
    And(Composite),
    Or(Composite),
    Xor(Composite),
    Not(Composite),
}

impl RewardFunction {
    /// Resolve a description against the loaded scene.
    pub fn build(
        desc: &RewardFunctionDescription,
        scene: &dyn SceneEngine,
    ) -> Result<Self, RewardError> {
        let trigger = Trigger::from_description(desc);
        let reward = match desc.kind.as_str() {
            "dense" => Self::Dense {
                entities: entities(desc, scene)?,
                metric: DistanceMetric::parse(&desc.distance_metric)?,
                scalar: desc.scalar,
            },
            "sparse" => Self::Sparse {
                entities: entities(desc, scene)?,
                metric: DistanceMetric::parse(&desc.distance_metric)?,
                trigger,
            },
            "timeout" => Self::Timeout { trigger, steps: 0 },
            "see" => Self::See {
                entities: entities(desc, scene)?,
                trigger,
            },
            "angle_to" => Self::AngleTo {
                entities: entities(desc, scene)?,
                direction: Vec3::from_array(desc.direction),
                trigger,
            },
            "and" => Self::And(composite(desc, scene, 2)?),
            "or" => Self::Or(composite(desc, scene, 2)?),
            "xor" => Self::Xor(composite(desc, scene, 2)?),
            "not" => Self::Not(composite(desc, scene, 1)?),
            other => return Err(RewardError::UnknownType(other.to_string())),
        };
        debug!(kind = reward.kind(), "reward function built");
        Ok(reward)
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Dense { .. } => "dense",
            Self::Sparse { .. } => "sparse",
            Self::Timeout { .. } => "timeout",
            Self::See { .. } => "see",
            Self::AngleTo { .. } => "angle_to",
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Xor(_) => "xor",
            Self::Not(_) => "not",
        }
    }

    /// Latch of sparse-family and composite rewards. `None` for `Dense`.
    #[must_use]
    pub const fn trigger(&self) -> Option<&Trigger> {
        match self {
            Self::Dense { .. } => None,
            Self::Sparse { trigger, .. }
            | Self::Timeout { trigger, .. }
            | Self::See { trigger, .. }
            | Self::AngleTo { trigger, .. } => Some(trigger),
            Self::And(c) | Self::Or(c) | Self::Xor(c) | Self::Not(c) => Some(&c.trigger),
        }
    }

    #[must_use]
    pub fn has_triggered(&self) -> bool {
        self.trigger().is_some_and(|t| t.has_triggered)
    }

    /// Latched and terminal.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.trigger().is_some_and(Trigger::is_done)
    }

    /// Evaluate against the current scene state, advancing latches.
    pub fn calculate(&mut self, scene: &mut dyn SceneEngine) -> f32 {
        match self {
            Self::Dense {
                entities,
                metric,
                scalar,
            } => positions(scene, entities).map_or(0.0, |(a, b)| {
                metric.measure(a.translation, b.translation) * *scalar
            }),
            Self::Sparse {
                entities,
                metric,
                trigger,
            } => {
                let Some((a, b)) = positions(scene, entities) else {
                    return 0.0;
                };
                let condition = target_visible(scene, entities)
                    && metric.measure(a.translation, b.translation) < trigger.threshold;
                fire_leaf(scene, entities, trigger, condition)
            }
            Self::Timeout { trigger, steps } => {
                *steps = steps.saturating_add(1);
                #[allow(clippy::cast_precision_loss)]
                let condition = !trigger.has_triggered && *steps as f32 > trigger.threshold;
                trigger.fire(condition)
            }
            Self::See { entities, trigger } => {
                let Some((a, b)) = positions(scene, entities) else {
                    return 0.0;
                };
                let forward = a.forward().as_vec3();
                let angle = (b.translation - a.translation)
                    .angle_between(forward)
                    .to_degrees();
                let condition = target_visible(scene, entities) && angle < trigger.threshold;
                fire_leaf(scene, entities, trigger, condition)
            }
            Self::AngleTo {
                entities,
                direction,
                trigger,
            } => {
                let Some((a, b)) = positions(scene, entities) else {
                    return 0.0;
                };
                let angle = (a.translation - b.translation)
                    .angle_between(*direction)
                    .to_degrees();
                let condition = target_visible(scene, entities) && angle < trigger.threshold;
                fire_leaf(scene, entities, trigger, condition)
            }
            Self::And(c) => {
                let truths = evaluate_children(&mut c.children, scene);
                c.trigger.fire(truths.iter().all(|t| *t))
            }
            Self::Or(c) => {
                let truths = evaluate_children(&mut c.children, scene);
                c.trigger.fire(truths.iter().any(|t| *t))
            }
            Self::Xor(c) => {
                let truths = evaluate_children(&mut c.children, scene);
                c.trigger.fire(truths.iter().filter(|t| **t).count() == 1)
            }
            Self::Not(c) => {
                let truths = evaluate_children(&mut c.children, scene);
                c.trigger.fire(!truths.iter().any(|t| *t))
            }
        }
    }

    /// Clear latches and counters, re-show collected entities and re-seed
    /// best-distance metrics from the current positions.
    pub fn reset(&mut self, scene: &mut dyn SceneEngine) {
        match self {
            Self::Dense {
                entities, metric, ..
            } => {
                if let Some((a, b)) = positions(scene, entities) {
                    metric.reset(a.translation, b.translation);
                }
            }
            Self::Sparse {
                entities,
                metric,
                trigger,
            } => {
                reset_leaf(scene, entities, trigger);
                if let Some((a, b)) = positions(scene, entities) {
                    metric.reset(a.translation, b.translation);
                }
            }
            Self::See { entities, trigger } | Self::AngleTo {
                entities, trigger, ..
            } => reset_leaf(scene, entities, trigger),
            Self::Timeout { trigger, steps } => {
                trigger.has_triggered = false;
                *steps = 0;
            }
            Self::And(c) | Self::Or(c) | Self::Xor(c) | Self::Not(c) => {
                c.trigger.has_triggered = false;
                for child in &mut c.children {
                    child.reset(scene);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn entities(
    desc: &RewardFunctionDescription,
    scene: &dyn SceneEngine,
) -> Result<Entities, RewardError> {
    let resolve = |name: Option<&String>, role: &'static str| -> Result<String, RewardError> {
        let name = name.ok_or_else(|| RewardError::MissingEntity {
            kind: desc.kind.clone(),
            role,
        })?;
        if scene.contains(name) {
            Ok(name.clone())
        } else {
            Err(RewardError::EntityNotFound(name.clone()))
        }
    };
    Ok(Entities {
        a: resolve(desc.entity_a.as_ref(), "entity_a")?,
        b: resolve(desc.entity_b.as_ref(), "entity_b")?,
    })
}

fn composite(
    desc: &RewardFunctionDescription,
    scene: &dyn SceneEngine,
    expected: usize,
) -> Result<Composite, RewardError> {
    if desc.children.len() != expected {
        return Err(RewardError::ChildCount {
            kind: desc.kind.clone(),
            expected,
            got: desc.children.len(),
        });
    }
    let children = desc
        .children
        .iter()
        .map(|child| RewardFunction::build(child, scene))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Composite {
        children,
        trigger: Trigger::from_description(desc),
    })
}

fn positions(scene: &dyn SceneEngine, entities: &Entities) -> Option<(Transform, Transform)> {
    match (scene.transform(&entities.a), scene.transform(&entities.b)) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => {
            warn!(a = %entities.a, b = %entities.b, "reward entity missing");
            None
        }
    }
}

// A collected (hidden) target cannot trigger again.
fn target_visible(scene: &dyn SceneEngine, entities: &Entities) -> bool {
    scene.is_active(&entities.b).unwrap_or(false)
}

fn fire_leaf(
    scene: &mut dyn SceneEngine,
    entities: &Entities,
    trigger: &mut Trigger,
    condition: bool,
) -> f32 {
    let reward = trigger.fire(condition);
    if reward != 0.0 && trigger.is_collectable {
        if let Err(err) = scene.set_active(&entities.b, false) {
            warn!(node = %entities.b, error = %err, "could not hide collected entity");
        }
    }
    reward
}

fn reset_leaf(scene: &mut dyn SceneEngine, entities: &Entities, trigger: &mut Trigger) {
    trigger.has_triggered = false;
    if trigger.is_collectable {
        if let Err(err) = scene.set_active(&entities.b, true) {
            warn!(node = %entities.b, error = %err, "could not re-show collected entity");
        }
    }
}

/// Evaluate every child so latches advance, then report truth values:
/// the latch for sparse-family children, `reward > 0` for dense ones.
fn evaluate_children(children: &mut [RewardFunction], scene: &mut dyn SceneEngine) -> Vec<bool> {
    children
        .iter_mut()
        .map(|child| {
            let reward = child.calculate(scene);
            match child.trigger() {
                Some(trigger) => trigger.has_triggered,
                None => reward > 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use simulate_test_utils::{CallLog, RecordingScene};

    use super::*;

    fn scene_with_b(b: [f32; 3]) -> RecordingScene {
        RecordingScene::new(CallLog::new())
            .with_node("a", Transform::IDENTITY)
            .with_node("b", Transform::from_translation(Vec3::from_array(b)))
            .with_node("c", Transform::from_xyz(100.0, 0.0, 0.0))
    }

    fn move_a(scene: &mut RecordingScene, x: f32) {
        scene
            .set_transform("a", Transform::from_xyz(x, 0.0, 0.0))
            .unwrap();
    }

    fn sparse(threshold: f32, scalar: f32) -> RewardFunctionDescription {
        let mut desc = RewardFunctionDescription::between("sparse", "a", "b");
        desc.threshold = threshold;
        desc.scalar = scalar;
        desc
    }

    // -------------------------------------------------------------------
    // Dense
    // -------------------------------------------------------------------

    #[test]
    fn dense_best_euclidean_pays_improvement_once() {
        let mut scene = scene_with_b([1.0, 0.0, 0.0]);
        let mut desc = RewardFunctionDescription::between("dense", "a", "b");
        desc.distance_metric = "best_euclidean".into();
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        reward.reset(&mut scene);

        move_a(&mut scene, 1.0);
        assert!((reward.calculate(&mut scene) - 1.0).abs() < f32::EPSILON);
        assert!(reward.calculate(&mut scene).abs() < f32::EPSILON);
    }

    #[test]
    fn dense_euclidean_scales_distance() {
        let mut scene = scene_with_b([3.0, 4.0, 0.0]);
        let mut desc = RewardFunctionDescription::between("dense", "a", "b");
        desc.scalar = -0.5;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert!((reward.calculate(&mut scene) + 2.5).abs() < 1e-6);
        assert!(!reward.is_done());
        assert!(reward.trigger().is_none());
    }

    #[test]
    fn cosine_metric() {
        let mut metric = DistanceMetric::parse("cosine").unwrap();
        assert!((metric.measure(Vec3::X, Vec3::X * 3.0) - 1.0).abs() < 1e-6);
        assert!(metric.measure(Vec3::X, Vec3::Y).abs() < 1e-6);
        assert!(metric.measure(Vec3::ZERO, Vec3::Y).abs() < 1e-6);
    }

    // -------------------------------------------------------------------
    // Sparse family
    // -------------------------------------------------------------------

    #[test]
    fn sparse_fires_once_inside_threshold() {
        let mut scene = scene_with_b([10.0, 0.0, 0.0]);
        let mut reward = RewardFunction::build(&sparse(4.9, 2.0), &scene).unwrap();

        let mut rewards = Vec::new();
        for x in 1..=8_u8 {
            move_a(&mut scene, f32::from(x));
            rewards.push(reward.calculate(&mut scene));
        }
        // Distances 9, 8, 7, 6, 5, 4, 3, 2.
        assert_eq!(rewards, vec![0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert!(reward.has_triggered());
    }

    #[test]
    fn sparse_without_trigger_once_fires_repeatedly() {
        let mut scene = scene_with_b([0.5, 0.0, 0.0]);
        let mut desc = sparse(1.0, 1.0);
        desc.trigger_once = false;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 1.0);
        assert_eq!(reward.calculate(&mut scene), 1.0);
    }

    #[test]
    fn sparse_terminal_reports_done_until_reset() {
        let mut scene = scene_with_b([0.5, 0.0, 0.0]);
        let mut desc = sparse(1.0, 1.0);
        desc.is_terminal = true;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert!(!reward.is_done());
        reward.calculate(&mut scene);
        assert!(reward.is_done());
        reward.reset(&mut scene);
        assert!(!reward.is_done());
    }

    #[test]
    fn collectable_hides_target_and_reset_restores_it() {
        let mut scene = scene_with_b([0.5, 0.0, 0.0]);
        let mut desc = sparse(1.0, 1.0);
        desc.is_collectable = true;
        desc.trigger_once = false;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();

        assert_eq!(reward.calculate(&mut scene), 1.0);
        assert_eq!(scene.is_active("b"), Some(false));
        // Collected targets cannot be collected again.
        assert_eq!(reward.calculate(&mut scene), 0.0);

        reward.reset(&mut scene);
        assert_eq!(scene.is_active("b"), Some(true));
        assert_eq!(reward.calculate(&mut scene), 1.0);
    }

    #[test]
    fn timeout_fires_scalar_once_after_threshold() {
        let mut scene = scene_with_b([0.0; 3]);
        let mut desc = RewardFunctionDescription::of("timeout");
        desc.threshold = 2.0;
        desc.scalar = 3.0;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        let rewards: Vec<f32> = (0..5).map(|_| reward.calculate(&mut scene)).collect();
        assert_eq!(rewards, vec![0.0, 0.0, 3.0, 0.0, 0.0]);

        reward.reset(&mut scene);
        assert_eq!(reward.calculate(&mut scene), 0.0);
    }

    #[test]
    fn see_fires_when_target_ahead() {
        // Forward is -Z.
        let mut scene = scene_with_b([0.0, 0.0, -5.0]);
        let mut desc = RewardFunctionDescription::between("see", "a", "b");
        desc.threshold = 10.0;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 1.0);

        let mut behind = scene_with_b([0.0, 0.0, 5.0]);
        let mut reward = RewardFunction::build(&desc, &behind).unwrap();
        assert_eq!(reward.calculate(&mut behind), 0.0);
    }

    #[test]
    fn angle_to_uses_declared_direction() {
        let mut scene = scene_with_b([0.0, -2.0, 0.0]);
        let mut desc = RewardFunctionDescription::between("angle_to", "a", "b");
        desc.direction = [0.0, 1.0, 0.0];
        desc.threshold = 5.0;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        // a - b points up.
        assert_eq!(reward.calculate(&mut scene), 1.0);

        desc.direction = [1.0, 0.0, 0.0];
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 0.0);
    }

    // -------------------------------------------------------------------
    // Composites
    // -------------------------------------------------------------------

    /// Sparse child on a-b (distance 1) and one on a-c (distance 100).
    fn composite_desc(kind: &str) -> RewardFunctionDescription {
        let near = sparse(2.0, 1.0);
        let mut far = RewardFunctionDescription::between("sparse", "a", "c");
        far.threshold = 2.0;
        let mut desc = RewardFunctionDescription::composite(kind, vec![near, far]);
        desc.scalar = 5.0;
        desc
    }

    #[test]
    fn and_requires_both_children() {
        let mut scene = scene_with_b([1.0, 0.0, 0.0]);
        let mut reward = RewardFunction::build(&composite_desc("and"), &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 0.0);

        // The near child stays latched while the far one triggers.
        move_a(&mut scene, 99.0);
        assert_eq!(reward.calculate(&mut scene), 5.0);
        assert_eq!(reward.calculate(&mut scene), 0.0);
    }

    #[test]
    fn or_requires_either_child() {
        let mut scene = scene_with_b([1.0, 0.0, 0.0]);
        let mut reward = RewardFunction::build(&composite_desc("or"), &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 5.0);
        assert!(reward.has_triggered());
    }

    #[test]
    fn xor_requires_exactly_one_child() {
        let mut scene = scene_with_b([1.0, 0.0, 0.0]);
        let mut reward = RewardFunction::build(&composite_desc("xor"), &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 5.0);

        let mut both = scene_with_b([1.0, 0.0, 0.0]);
        let mut desc = composite_desc("xor");
        desc.trigger_once = false;
        let mut reward = RewardFunction::build(&desc, &both).unwrap();
        assert_eq!(reward.calculate(&mut both), 5.0);
        move_a(&mut both, 99.0);
        assert_eq!(reward.calculate(&mut both), 0.0);
    }

    #[test]
    fn not_complements_child_latch() {
        let mut scene = scene_with_b([10.0, 0.0, 0.0]);
        let mut desc = RewardFunctionDescription::composite("not", vec![sparse(1.0, 1.0)]);
        desc.trigger_once = false;
        desc.is_terminal = true;
        let mut reward = RewardFunction::build(&desc, &scene).unwrap();
        assert_eq!(reward.calculate(&mut scene), 1.0);
        assert!(reward.is_done());

        move_a(&mut scene, 9.5);
        assert_eq!(reward.calculate(&mut scene), 0.0);

        reward.reset(&mut scene);
        assert!(!reward.is_done());
        move_a(&mut scene, 0.0);
        assert_eq!(reward.calculate(&mut scene), 1.0);
    }

    #[test]
    fn composite_reset_resets_children() {
        let mut scene = scene_with_b([1.0, 0.0, 0.0]);
        let mut reward = RewardFunction::build(&composite_desc("or"), &scene).unwrap();
        reward.calculate(&mut scene);
        reward.reset(&mut scene);
        let RewardFunction::Or(composite) = &reward else {
            panic!("expected or");
        };
        assert!(!composite.trigger.has_triggered);
        assert!(composite.children.iter().all(|c| !c.has_triggered()));
    }

    // -------------------------------------------------------------------
    // Builder errors
    // -------------------------------------------------------------------

    #[test]
    fn build_rejects_bad_descriptions() {
        let scene = scene_with_b([1.0, 0.0, 0.0]);

        let desc = RewardFunctionDescription::between("bogus", "a", "b");
        assert_eq!(
            RewardFunction::build(&desc, &scene),
            Err(RewardError::UnknownType("bogus".into()))
        );

        let mut desc = RewardFunctionDescription::between("dense", "a", "b");
        desc.distance_metric = "manhattan".into();
        assert_eq!(
            RewardFunction::build(&desc, &scene),
            Err(RewardError::UnknownMetric("manhattan".into()))
        );

        let desc = RewardFunctionDescription::between("sparse", "a", "ghost");
        assert_eq!(
            RewardFunction::build(&desc, &scene),
            Err(RewardError::EntityNotFound("ghost".into()))
        );

        let desc = RewardFunctionDescription::of("see");
        assert_eq!(
            RewardFunction::build(&desc, &scene),
            Err(RewardError::MissingEntity {
                kind: "see".into(),
                role: "entity_a"
            })
        );

        let desc = RewardFunctionDescription::composite("not", vec![sparse(1.0, 1.0); 2]);
        assert_eq!(
            RewardFunction::build(&desc, &scene),
            Err(RewardError::ChildCount {
                kind: "not".into(),
                expected: 1,
                got: 2
            })
        );
    }
}
