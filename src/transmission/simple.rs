use sxd_document::dom::Element;

use crate::description;
use crate::hardware::Actuator;
use crate::joint::JointState;
use crate::robot::Robot;
use crate::transmission::Transmission;
use crate::Error;

#[cfg(test)]
#[path = "simple_tests.rs"]
mod simple_tests;

/// Builds a [SimpleTransmission] from its description element.
///
/// This is the factory registered under the `SimpleTransmission` type name
/// by [crate::registry::TransmissionRegistry::with_standard_types].
pub fn factory(config: Element<'_>, robot: &Robot) -> Result<Box<dyn Transmission>, Error> {
    Ok(Box::new(SimpleTransmission::from_description(config, robot)?))
}

/// A transmission connecting one actuator to one joint through a scalar
/// mechanical reduction.
///
/// Joint position and velocity are the actuator values divided by the
/// reduction; efforts are multiplied by it going into joint space and
/// divided going back out, so a larger reduction trades speed for torque.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleTransmission {
    /// The name the description gave this transmission.
    name: String,

    /// The index of the driven actuator in the hardware arena.
    actuator_index: usize,

    /// The index of the driven joint in the model and state arenas.
    joint_index: usize,

    /// The ratio between actuator travel and joint travel.
    mechanical_reduction: f64,

    /// The motor's torque constant, carried for drivers that convert
    /// between current and effort. Not used by the propagate math.
    motor_torque_constant: f64,

    /// The encoder's pulse count per revolution, carried for drivers that
    /// convert between ticks and radians. Not used by the propagate math.
    pulses_per_revolution: f64,
}

impl SimpleTransmission {
    /// Returns the index of the driven actuator.
    pub fn actuator_index(&self) -> usize {
        self.actuator_index
    }

    /// Creates a [SimpleTransmission] from a `<transmission>` description
    /// element.
    ///
    /// The element carries a `name` attribute, `<joint name=...>` and
    /// `<actuator name=...>` children naming the driven pair, and
    /// `<mechanicalReduction>`, `<motorTorqueConstant>` and
    /// `<pulsesPerRevolution>` scalar children.
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

        let joint_element = description::child_element(config, "joint").ok_or_else(|| {
            Error::MissingChild {
                element: "transmission".to_string(),
                child: "joint".to_string(),
            }
        })?;
        let joint_name = description::required_attribute(joint_element, "name")?;
        let joint_index = robot
            .joint_index(joint_name)
            .ok_or_else(|| Error::UnknownJoint {
                name: joint_name.to_string(),
            })?;

        let actuator_element = description::child_element(config, "actuator").ok_or_else(|| {
            Error::MissingChild {
                element: "transmission".to_string(),
                child: "actuator".to_string(),
            }
        })?;
        let actuator_name = description::required_attribute(actuator_element, "name")?;
        let actuator_index =
            robot
                .actuator_index(actuator_name)
                .ok_or_else(|| Error::UnknownActuator {
                    name: actuator_name.to_string(),
                })?;

        let mechanical_reduction = description::required_child_scalar(config, "mechanicalReduction")?;
        if mechanical_reduction == 0.0 {
            return Err(Error::InvalidScalar {
                element: "mechanicalReduction".to_string(),
                value: "0".to_string(),
            });
        }

        let motor_torque_constant = description::required_child_scalar(config, "motorTorqueConstant")?;
        let pulses_per_revolution = description::required_child_scalar(config, "pulsesPerRevolution")?;

        Ok(Self {
            name: name.to_string(),
            actuator_index,
            joint_index,
            mechanical_reduction,
            motor_torque_constant,
            pulses_per_revolution,
        })
    }

    /// Returns the index of the driven joint.
    pub fn joint_index(&self) -> usize {
        self.joint_index
    }

    /// Returns the ratio between actuator travel and joint travel.
    pub fn mechanical_reduction(&self) -> f64 {
        self.mechanical_reduction
    }

    /// Returns the motor torque constant carried by the description.
    pub fn motor_torque_constant(&self) -> f64 {
        self.motor_torque_constant
    }

    /// Creates a new [SimpleTransmission] with unit motor constants.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the transmission.
    /// * 'actuator_index' - The index of the driven actuator in the
    ///   hardware arena.
    /// * 'joint_index' - The index of the driven joint in the model.
    /// * 'mechanical_reduction' - The ratio between actuator travel and
    ///   joint travel. Must not be zero.
    pub fn new(
        name: &str,
        actuator_index: usize,
        joint_index: usize,
        mechanical_reduction: f64,
    ) -> Self {
        assert!(
            mechanical_reduction != 0.0,
            "transmission '{}' cannot have a zero mechanical reduction",
            name
        );

        Self {
            name: name.to_string(),
            actuator_index,
            joint_index,
            mechanical_reduction,
            motor_torque_constant: 1.0,
            pulses_per_revolution: 1.0,
        }
    }

    /// Returns the encoder pulse count carried by the description.
    pub fn pulses_per_revolution(&self) -> f64 {
        self.pulses_per_revolution
    }

    /// Stores the motor constants carried by the hardware configuration.
    ///
    /// ## Parameters
    ///
    /// * 'motor_torque_constant' - The motor's torque constant.
    /// * 'pulses_per_revolution' - The encoder's pulse count per revolution.
    pub fn with_motor_constants(
        mut self,
        motor_torque_constant: f64,
        pulses_per_revolution: f64,
    ) -> Self {
        self.motor_torque_constant = motor_torque_constant;
        self.pulses_per_revolution = pulses_per_revolution;
        self
    }

    fn assert_coverage(&self, actuator_count: usize, joint_count: usize) {
        assert!(
            self.actuator_index < actuator_count,
            "transmission '{}' resolved actuator index {} but the hardware supplied {} actuators",
            self.name,
            self.actuator_index,
            actuator_count
        );
        assert!(
            self.joint_index < joint_count,
            "transmission '{}' resolved joint index {} but the robot state supplied {} joints",
            self.name,
            self.joint_index,
            joint_count
        );
    }
}

impl Transmission for SimpleTransmission {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate_position(&self, actuators: &[Actuator], joint_states: &mut [JointState]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let actuator = &actuators[self.actuator_index];
        let joint_state = &mut joint_states[self.joint_index];

        joint_state.position = actuator.state.position / self.mechanical_reduction;
        joint_state.velocity = actuator.state.velocity / self.mechanical_reduction;
        joint_state.applied_effort =
            actuator.state.last_measured_effort * self.mechanical_reduction;
    }

    fn propagate_position_backwards(
        &self,
        joint_states: &[JointState],
        actuators: &mut [Actuator],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let joint_state = &joint_states[self.joint_index];
        let actuator = &mut actuators[self.actuator_index];

        actuator.state.position = joint_state.position * self.mechanical_reduction;
        actuator.state.velocity = joint_state.velocity * self.mechanical_reduction;
        actuator.state.last_measured_effort =
            joint_state.applied_effort / self.mechanical_reduction;
    }

    fn propagate_effort(&self, joint_states: &[JointState], actuators: &mut [Actuator]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let joint_state = &joint_states[self.joint_index];
        let actuator = &mut actuators[self.actuator_index];

        actuator.command.effort = joint_state.commanded_effort / self.mechanical_reduction;
        actuator.command.enable = true;
    }

    fn propagate_effort_backwards(
        &mut self,
        actuators: &[Actuator],
        joint_states: &mut [JointState],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let actuator = &actuators[self.actuator_index];
        let joint_state = &mut joint_states[self.joint_index];

        joint_state.commanded_effort = actuator.command.effort * self.mechanical_reduction;
    }
}
