extern crate nalgebra as na;

use na::{Matrix2, Vector2};
use sxd_document::dom::Element;

use crate::description;
use crate::hardware::Actuator;
use crate::joint::JointState;
use crate::robot::Robot;
use crate::transmission::Transmission;
use crate::Error;

#[cfg(test)]
#[path = "wrist_tests.rs"]
mod wrist_tests;

/// Builds a [WristTransmission] from its description element.
///
/// This is the factory registered under the `WristTransmission` type name
/// by [crate::registry::TransmissionRegistry::with_standard_types].
pub fn factory(config: Element<'_>, robot: &Robot) -> Result<Box<dyn Transmission>, Error> {
    Ok(Box::new(WristTransmission::from_description(config, robot)?))
}

/// A differential transmission driving a two-axis wrist.
///
/// Two motors drive the flex and roll joints together: turning the motors
/// in the same direction flexes the wrist, turning them against each other
/// rolls it. The mapping is a 2x2 coupling matrix applied after the
/// per-motor reductions:
///
/// ```text
/// flex = (right/r0 + left/r1) / 2
/// roll = (right/r0 - left/r1) / 2
/// ```
///
/// The effort paths use the transpose relationship, so power is conserved
/// between actuator space and joint space.
#[derive(Clone, Debug, PartialEq)]
pub struct WristTransmission {
    /// The name the description gave this transmission.
    name: String,

    /// The index of the right motor in the hardware arena.
    right_actuator_index: usize,

    /// The index of the left motor in the hardware arena.
    left_actuator_index: usize,

    /// The index of the flex joint in the model and state arenas.
    flex_joint_index: usize,

    /// The index of the roll joint in the model and state arenas.
    roll_joint_index: usize,

    /// The mechanical reductions for the right and left motor.
    reductions: Vector2<f64>,
}

impl WristTransmission {
    /// Returns the right and left motor index in the hardware arena.
    pub fn actuator_indices(&self) -> [usize; 2] {
        [self.right_actuator_index, self.left_actuator_index]
    }

    /// Creates a [WristTransmission] from a `<transmission>` description
    /// element.
    ///
    /// The element carries a `name` attribute, `<rightActuator name=...>`
    /// and `<leftActuator name=...>` children naming the motors, and
    /// `<flexJoint name=... mechanicalReduction=...>` and
    /// `<rollJoint name=... mechanicalReduction=...>` children naming the
    /// joints. The flex and roll reductions apply to the right and left
    /// motor respectively.
    ///
    /// ## Parameters
    ///
    /// * 'config' - The `<transmission>` element.
    /// * 'robot' - The model the joint and actuator names resolve against.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingAttribute] / [Error::MissingChild] /
    ///   [Error::InvalidScalar] - Returned when the element is incomplete or
    ///   malformed.
    /// * [Error::UnknownJoint] / [Error::UnknownActuator] - Returned when a
    ///   referenced name is not in the model.
    pub fn from_description(config: Element<'_>, robot: &Robot) -> Result<Self, Error> {
        let name = description::required_attribute(config, "name")?;

        let right_actuator_index = resolve_actuator(config, robot, "rightActuator")?;
        let left_actuator_index = resolve_actuator(config, robot, "leftActuator")?;

        let (flex_joint_index, right_reduction) = resolve_joint(config, robot, "flexJoint")?;
        let (roll_joint_index, left_reduction) = resolve_joint(config, robot, "rollJoint")?;

        Ok(Self {
            name: name.to_string(),
            right_actuator_index,
            left_actuator_index,
            flex_joint_index,
            roll_joint_index,
            reductions: Vector2::new(right_reduction, left_reduction),
        })
    }

    /// Returns the flex and roll joint index in the model.
    pub fn joint_indices(&self) -> [usize; 2] {
        [self.flex_joint_index, self.roll_joint_index]
    }

    /// Creates a new [WristTransmission].
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the transmission.
    /// * 'actuator_indices' - The right and left motor index in the
    ///   hardware arena.
    /// * 'joint_indices' - The flex and roll joint index in the model.
    /// * 'reductions' - The mechanical reductions for the right and left
    ///   motor. Neither may be zero.
    pub fn new(
        name: &str,
        actuator_indices: [usize; 2],
        joint_indices: [usize; 2],
        reductions: [f64; 2],
    ) -> Self {
        assert!(
            reductions[0] != 0.0 && reductions[1] != 0.0,
            "transmission '{}' cannot have a zero mechanical reduction",
            name
        );

        Self {
            name: name.to_string(),
            right_actuator_index: actuator_indices[0],
            left_actuator_index: actuator_indices[1],
            flex_joint_index: joint_indices[0],
            roll_joint_index: joint_indices[1],
            reductions: Vector2::new(reductions[0], reductions[1]),
        }
    }

    /// Returns the mechanical reductions for the right and left motor.
    pub fn reductions(&self) -> [f64; 2] {
        [self.reductions[0], self.reductions[1]]
    }

    /// The matrix carrying reduced actuator values into (flex, roll) joint
    /// space.
    fn coupling() -> Matrix2<f64> {
        Matrix2::new(0.5, 0.5, 0.5, -0.5)
    }

    /// The inverse of [WristTransmission::coupling], carrying (flex, roll)
    /// values back into per-motor space.
    fn decoupling() -> Matrix2<f64> {
        Matrix2::new(1.0, 1.0, 1.0, -1.0)
    }

    fn assert_coverage(&self, actuator_count: usize, joint_count: usize) {
        let max_actuator = self.right_actuator_index.max(self.left_actuator_index);
        let max_joint = self.flex_joint_index.max(self.roll_joint_index);
        assert!(
            max_actuator < actuator_count,
            "transmission '{}' resolved actuator index {} but the hardware supplied {} actuators",
            self.name,
            max_actuator,
            actuator_count
        );
        assert!(
            max_joint < joint_count,
            "transmission '{}' resolved joint index {} but the robot state supplied {} joints",
            self.name,
            max_joint,
            joint_count
        );
    }
}

fn resolve_actuator(config: Element<'_>, robot: &Robot, child: &str) -> Result<usize, Error> {
    let element = description::child_element(config, child).ok_or_else(|| Error::MissingChild {
        element: "transmission".to_string(),
        child: child.to_string(),
    })?;
    let name = description::required_attribute(element, "name")?;
    robot
        .actuator_index(name)
        .ok_or_else(|| Error::UnknownActuator {
            name: name.to_string(),
        })
}

fn resolve_joint(config: Element<'_>, robot: &Robot, child: &str) -> Result<(usize, f64), Error> {
    let element = description::child_element(config, child).ok_or_else(|| Error::MissingChild {
        element: "transmission".to_string(),
        child: child.to_string(),
    })?;
    let name = description::required_attribute(element, "name")?;
    let index = robot.joint_index(name).ok_or_else(|| Error::UnknownJoint {
        name: name.to_string(),
    })?;
    let reduction = description::attribute_scalar(element, "mechanicalReduction")?;
    if reduction == 0.0 {
        return Err(Error::InvalidScalar {
            element: format!("{}@mechanicalReduction", child),
            value: "0".to_string(),
        });
    }
    Ok((index, reduction))
}

impl Transmission for WristTransmission {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate_position(&self, actuators: &[Actuator], joint_states: &mut [JointState]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let right = &actuators[self.right_actuator_index].state;
        let left = &actuators[self.left_actuator_index].state;

        let position = Self::coupling()
            * Vector2::new(right.position, left.position).component_div(&self.reductions);
        let velocity = Self::coupling()
            * Vector2::new(right.velocity, left.velocity).component_div(&self.reductions);
        let applied = Self::decoupling()
            * Vector2::new(right.last_measured_effort, left.last_measured_effort)
                .component_mul(&self.reductions);

        let flex = &mut joint_states[self.flex_joint_index];
        flex.position = position[0];
        flex.velocity = velocity[0];
        flex.applied_effort = applied[0];

        let roll = &mut joint_states[self.roll_joint_index];
        roll.position = position[1];
        roll.velocity = velocity[1];
        roll.applied_effort = applied[1];
    }

    fn propagate_position_backwards(
        &self,
        joint_states: &[JointState],
        actuators: &mut [Actuator],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let flex = &joint_states[self.flex_joint_index];
        let roll = &joint_states[self.roll_joint_index];

        let position = (Self::decoupling() * Vector2::new(flex.position, roll.position))
            .component_mul(&self.reductions);
        let velocity = (Self::decoupling() * Vector2::new(flex.velocity, roll.velocity))
            .component_mul(&self.reductions);
        let measured = (Self::coupling() * Vector2::new(flex.applied_effort, roll.applied_effort))
            .component_div(&self.reductions);

        let right = &mut actuators[self.right_actuator_index].state;
        right.position = position[0];
        right.velocity = velocity[0];
        right.last_measured_effort = measured[0];

        let left = &mut actuators[self.left_actuator_index].state;
        left.position = position[1];
        left.velocity = velocity[1];
        left.last_measured_effort = measured[1];
    }

    fn propagate_effort(&self, joint_states: &[JointState], actuators: &mut [Actuator]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let flex = &joint_states[self.flex_joint_index];
        let roll = &joint_states[self.roll_joint_index];

        let motor = (Self::coupling() * Vector2::new(flex.commanded_effort, roll.commanded_effort))
            .component_div(&self.reductions);

        let right = &mut actuators[self.right_actuator_index].command;
        right.effort = motor[0];
        right.enable = true;

        let left = &mut actuators[self.left_actuator_index].command;
        left.effort = motor[1];
        left.enable = true;
    }

    fn propagate_effort_backwards(
        &mut self,
        actuators: &[Actuator],
        joint_states: &mut [JointState],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let right = &actuators[self.right_actuator_index].command;
        let left = &actuators[self.left_actuator_index].command;

        let commanded = Self::decoupling()
            * Vector2::new(right.effort, left.effort).component_mul(&self.reductions);

        joint_states[self.flex_joint_index].commanded_effort = commanded[0];
        joint_states[self.roll_joint_index].commanded_effort = commanded[1];
    }
}
