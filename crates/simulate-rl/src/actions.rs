//! Action spaces and their mapping onto agent movement.
//!
//! An [`ActionMapping`] is resolved once from an agent's declared
//! [`ActionSpec`]. Discrete spaces take one index selecting a named action;
//! continuous spaces take one value per declared axis.

use bevy_math::{Quat, Vec3};
use bevy_transform::components::Transform;
use simulate_core::description::{ActionDistribution, ActionSpec};
use simulate_core::error::ActionError;

// ---------------------------------------------------------------------------
// MovementAxes
// ---------------------------------------------------------------------------

/// Movement intent produced by an action, applied on every physics sub-step.
///
/// Positive `forward` moves along the agent's forward axis, positive `right`
/// strafes right and positive `turn` yaws right (clockwise seen from above).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementAxes {
    pub forward: f32,
    pub right: f32,
    pub turn: f32,
}

impl MovementAxes {
    pub const IDLE: Self = Self {
        forward: 0.0,
        right: 0.0,
        turn: 0.0,
    };

    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }

    /// Move and turn `transform` for one sub-step of `dt` seconds.
    ///
    /// `turn_speed` is in degrees per second.
    pub fn apply(&self, transform: &mut Transform, move_speed: f32, turn_speed: f32, dt: f32) {
        let forward = transform.forward().as_vec3();
        let right = transform.right().as_vec3();
        let step: Vec3 = (forward * self.forward + right * self.right) * move_speed * dt;
        transform.translation += step;
        let yaw = -(self.turn * turn_speed * dt).to_radians();
        transform.rotate(Quat::from_rotation_y(yaw));
    }
}

// ---------------------------------------------------------------------------
// Named actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscreteAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    TurnLeft,
    TurnRight,
    DoNothing,
}

impl DiscreteAction {
    pub fn parse(name: &str) -> Result<Self, ActionError> {
        match name {
            "move_forward" => Ok(Self::MoveForward),
            "move_backward" => Ok(Self::MoveBackward),
            "move_left" => Ok(Self::MoveLeft),
            "move_right" => Ok(Self::MoveRight),
            "turn_left" => Ok(Self::TurnLeft),
            "turn_right" => Ok(Self::TurnRight),
            "do_nothing" => Ok(Self::DoNothing),
            other => Err(ActionError::UnknownActionName {
                dist: ActionDistribution::Discrete.as_str(),
                name: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn axes(self) -> MovementAxes {
        let (forward, right, turn) = match self {
            Self::MoveForward => (1.0, 0.0, 0.0),
            Self::MoveBackward => (-1.0, 0.0, 0.0),
            Self::MoveLeft => (0.0, -1.0, 0.0),
            Self::MoveRight => (0.0, 1.0, 0.0),
            Self::TurnLeft => (0.0, 0.0, -1.0),
            Self::TurnRight => (0.0, 0.0, 1.0),
            Self::DoNothing => (0.0, 0.0, 0.0),
        };
        MovementAxes {
            forward,
            right,
            turn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousAxis {
    MoveForwardBackward,
    MoveLeftRight,
    TurnLeftRight,
}

impl ContinuousAxis {
    pub fn parse(name: &str) -> Result<Self, ActionError> {
        match name {
            "move_forward_backward" => Ok(Self::MoveForwardBackward),
            "move_left_right" => Ok(Self::MoveLeftRight),
            "turn_left_right" => Ok(Self::TurnLeftRight),
            other => Err(ActionError::UnknownActionName {
                dist: ActionDistribution::Continuous.as_str(),
                name: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionMapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionMapping {
    Discrete(Vec<DiscreteAction>),
    Continuous(Vec<ContinuousAxis>),
}

impl ActionMapping {
    /// Resolve declared action names. Unknown names are an error.
    pub fn from_spec(spec: &ActionSpec) -> Result<Self, ActionError> {
        match spec.dist {
            ActionDistribution::Discrete => spec
                .available_actions
                .iter()
                .map(|name| DiscreteAction::parse(name))
                .collect::<Result<_, _>>()
                .map(Self::Discrete),
            ActionDistribution::Continuous => spec
                .available_actions
                .iter()
                .map(|name| ContinuousAxis::parse(name))
                .collect::<Result<_, _>>()
                .map(Self::Continuous),
        }
    }

    /// Number of declared actions (discrete) or axes (continuous).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Discrete(actions) => actions.len(),
            Self::Continuous(axes) => axes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Map raw action values onto movement axes.
    pub fn resolve(&self, values: &[f32]) -> Result<MovementAxes, ActionError> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ActionError::InvalidPayload(format!(
                "non-finite action value {bad}"
            )));
        }
        match self {
            Self::Discrete(actions) => {
                let [value] = values else {
                    return Err(ActionError::DiscreteArity { got: values.len() });
                };
                let out_of_range = ActionError::DiscreteOutOfRange {
                    value: *value,
                    available: actions.len(),
                };
                if *value < 0.0 || value.fract() != 0.0 {
                    return Err(out_of_range);
                }
                // Non-negative whole number, checked above.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let index = *value as usize;
                actions
                    .get(index)
                    .map(|action| action.axes())
                    .ok_or(out_of_range)
            }
            Self::Continuous(axes) => {
                if values.len() != axes.len() {
                    return Err(ActionError::ContinuousLengthMismatch {
                        expected: axes.len(),
                        got: values.len(),
                    });
                }
                let mut movement = MovementAxes::IDLE;
                for (axis, value) in axes.iter().zip(values) {
                    match axis {
                        ContinuousAxis::MoveForwardBackward => movement.forward = *value,
                        ContinuousAxis::MoveLeftRight => movement.right = *value,
                        ContinuousAxis::TurnLeftRight => movement.turn = *value,
                    }
                }
                Ok(movement)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete() -> ActionMapping {
        ActionMapping::from_spec(&ActionSpec::discrete([
            "move_forward",
            "turn_left",
            "do_nothing",
        ]))
        .unwrap()
    }

    #[test]
    fn discrete_selects_named_action() {
        let mapping = discrete();
        assert_eq!(mapping.len(), 3);
        assert_eq!(
            mapping.resolve(&[0.0]).unwrap(),
            DiscreteAction::MoveForward.axes()
        );
        assert_eq!(mapping.resolve(&[1.0]).unwrap().turn, -1.0);
        assert!(mapping.resolve(&[2.0]).unwrap().is_idle());
    }

    #[test]
    fn discrete_rejects_wrong_arity() {
        let mapping = discrete();
        assert_eq!(
            mapping.resolve(&[0.0, 1.0]),
            Err(ActionError::DiscreteArity { got: 2 })
        );
        assert_eq!(
            mapping.resolve(&[]),
            Err(ActionError::DiscreteArity { got: 0 })
        );
    }

    #[test]
    fn discrete_rejects_out_of_range() {
        let mapping = discrete();
        for value in [3.0, -1.0, 0.5] {
            assert_eq!(
                mapping.resolve(&[value]),
                Err(ActionError::DiscreteOutOfRange {
                    value,
                    available: 3
                })
            );
        }
    }

    #[test]
    fn continuous_maps_positional_axes() {
        let mapping = ActionMapping::from_spec(&ActionSpec::continuous([
            "turn_left_right",
            "move_forward_backward",
        ]))
        .unwrap();
        let axes = mapping.resolve(&[0.25, -0.5]).unwrap();
        assert_eq!(
            axes,
            MovementAxes {
                forward: -0.5,
                right: 0.0,
                turn: 0.25
            }
        );
    }

    #[test]
    fn continuous_rejects_length_mismatch() {
        let mapping =
            ActionMapping::from_spec(&ActionSpec::continuous(["move_left_right"])).unwrap();
        assert_eq!(
            mapping.resolve(&[1.0, 2.0]),
            Err(ActionError::ContinuousLengthMismatch {
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mapping =
            ActionMapping::from_spec(&ActionSpec::continuous(["move_left_right"])).unwrap();
        assert!(matches!(
            mapping.resolve(&[f32::NAN]),
            Err(ActionError::InvalidPayload(_))
        ));
    }

    #[test]
    fn unknown_names_fail_construction() {
        assert_eq!(
            ActionMapping::from_spec(&ActionSpec::discrete(["jump"])),
            Err(ActionError::UnknownActionName {
                dist: "discrete",
                name: "jump".into()
            })
        );
        // Continuous names are not valid discrete names and vice versa.
        assert!(ActionMapping::from_spec(&ActionSpec::continuous(["move_forward"])).is_err());
    }

    #[test]
    fn movement_moves_along_forward_axis() {
        let mut transform = Transform::IDENTITY;
        DiscreteAction::MoveForward
            .axes()
            .apply(&mut transform, 2.0, 90.0, 0.5);
        assert!((transform.translation - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn turning_right_yaws_clockwise() {
        let mut transform = Transform::IDENTITY;
        DiscreteAction::TurnRight
            .axes()
            .apply(&mut transform, 1.0, 90.0, 1.0);
        // Forward (-Z) rotated 90 degrees clockwise from above points +X.
        assert!((transform.forward().as_vec3() - Vec3::X).length() < 1e-5);
        assert_eq!(transform.translation, Vec3::ZERO);
    }
}
