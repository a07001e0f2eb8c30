use pid::Pid;
use sxd_document::dom::Element;

use crate::description;
use crate::hardware::Actuator;
use crate::joint::JointState;
use crate::robot::Robot;
use crate::transmission::Transmission;
use crate::Error;

#[cfg(test)]
#[path = "gripper_tests.rs"]
mod gripper_tests;

/// Builds a [GripperTransmission] from its description element.
///
/// This is the factory registered under the `GripperTransmission` type name
/// by [crate::registry::TransmissionRegistry::with_standard_types].
pub fn factory(config: Element<'_>, robot: &Robot) -> Result<Box<dyn Transmission>, Error> {
    Ok(Box::new(GripperTransmission::from_description(
        config, robot,
    )?))
}

/// The gains for one of the gripper's simulation alignment loops.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PidGains {
    /// The proportional gain.
    pub p: f64,

    /// The integral gain.
    pub i: f64,

    /// The derivative gain.
    pub d: f64,

    /// The bound on the integral term's contribution.
    pub i_clamp: f64,
}

/// A transmission connecting one actuator to the linked joints of a gripper.
///
/// One motor drives every finger joint through its own reduction. The
/// position path fans the actuator state out to each joint; the command
/// path averages the per-joint reduced efforts back into one motor command.
///
/// The backwards effort path adds a per-joint PID correction that pulls
/// each simulated joint towards the angle the actuator position implies,
/// keeping the fingers aligned when the physics engine lets them drift.
/// Hardware never runs the backwards path, so the loops only act in
/// simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct GripperTransmission {
    /// The name the description gave this transmission.
    name: String,

    /// The index of the gripper motor in the hardware arena.
    actuator_index: usize,

    /// The indices of the driven joints in the model and state arenas.
    joint_indices: Vec<usize>,

    /// The per-joint mechanical reductions, index-parallel with
    /// `joint_indices`.
    reductions: Vec<f64>,

    /// The gains shared by the alignment loops.
    gains: PidGains,

    /// The alignment loop state, one per driven joint.
    pids: Vec<Pid<f64>>,

    /// The motor's torque constant, carried for drivers that convert
    /// between current and effort. Not used by the propagate math.
    motor_torque_constant: f64,

    /// The encoder's pulse count per revolution, carried for drivers that
    /// convert between ticks and radians. Not used by the propagate math.
    pulses_per_revolution: f64,
}

impl GripperTransmission {
    /// Returns the index of the gripper motor.
    pub fn actuator_index(&self) -> usize {
        self.actuator_index
    }

    /// Creates a [GripperTransmission] from a `<transmission>` description
    /// element.
    ///
    /// The element carries a `name` attribute, an `<actuator name=...>`
    /// child naming the motor, and one `<joint name=... reduction=...>`
    /// child per driven joint. An optional `<pid p=... i=... d=...
    /// iClamp=...>` child sets the alignment gains (all default to zero)
    /// and optional `<motorTorqueConstant>` and `<pulsesPerRevolution>`
    /// scalar children override the unit motor constants.
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

        let mut joints = Vec::new();
        for joint_element in description::child_elements(config, "joint") {
            let joint_name = description::required_attribute(joint_element, "name")?;
            let joint_index = robot
                .joint_index(joint_name)
                .ok_or_else(|| Error::UnknownJoint {
                    name: joint_name.to_string(),
                })?;

            let reduction = description::attribute_scalar(joint_element, "reduction")?;
            if reduction == 0.0 {
                return Err(Error::InvalidScalar {
                    element: "joint@reduction".to_string(),
                    value: "0".to_string(),
                });
            }

            joints.push((joint_index, reduction));
        }
        if joints.is_empty() {
            return Err(Error::MissingChild {
                element: "transmission".to_string(),
                child: "joint".to_string(),
            });
        }

        let gains = match description::child_element(config, "pid") {
            Some(element) => PidGains {
                p: description::optional_attribute_scalar(element, "p")?.unwrap_or(0.0),
                i: description::optional_attribute_scalar(element, "i")?.unwrap_or(0.0),
                d: description::optional_attribute_scalar(element, "d")?.unwrap_or(0.0),
                i_clamp: description::optional_attribute_scalar(element, "iClamp")?.unwrap_or(0.0),
            },
            None => PidGains::default(),
        };

        let motor_torque_constant =
            description::optional_child_scalar(config, "motorTorqueConstant")?.unwrap_or(1.0);
        let pulses_per_revolution =
            description::optional_child_scalar(config, "pulsesPerRevolution")?.unwrap_or(1.0);

        Ok(Self::new(name, actuator_index, &joints, gains)
            .with_motor_constants(motor_torque_constant, pulses_per_revolution))
    }

    /// Returns the gains shared by the alignment loops.
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Returns the indices of the driven joints.
    pub fn joint_indices(&self) -> &[usize] {
        &self.joint_indices
    }

    /// Returns the motor torque constant carried by the description.
    pub fn motor_torque_constant(&self) -> f64 {
        self.motor_torque_constant
    }

    /// Creates a new [GripperTransmission] with unit motor constants.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the transmission.
    /// * 'actuator_index' - The index of the gripper motor in the hardware
    ///   arena.
    /// * 'joints' - The driven joints as (model index, mechanical
    ///   reduction) pairs. At least one joint is required and no reduction
    ///   may be zero.
    /// * 'gains' - The gains for the simulation alignment loops.
    pub fn new(
        name: &str,
        actuator_index: usize,
        joints: &[(usize, f64)],
        gains: PidGains,
    ) -> Self {
        assert!(
            !joints.is_empty(),
            "transmission '{}' must drive at least one joint",
            name
        );
        assert!(
            joints.iter().all(|(_, reduction)| *reduction != 0.0),
            "transmission '{}' cannot have a zero mechanical reduction",
            name
        );

        let pids = joints.iter().map(|_| alignment_pid(gains)).collect();

        Self {
            name: name.to_string(),
            actuator_index,
            joint_indices: joints.iter().map(|(index, _)| *index).collect(),
            reductions: joints.iter().map(|(_, reduction)| *reduction).collect(),
            gains,
            pids,
            motor_torque_constant: 1.0,
            pulses_per_revolution: 1.0,
        }
    }

    /// Returns the encoder pulse count carried by the description.
    pub fn pulses_per_revolution(&self) -> f64 {
        self.pulses_per_revolution
    }

    /// Returns the per-joint mechanical reductions.
    pub fn reductions(&self) -> &[f64] {
        &self.reductions
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
        let max_joint = self.joint_indices.iter().copied().max().unwrap_or(0);
        assert!(
            self.actuator_index < actuator_count,
            "transmission '{}' resolved actuator index {} but the hardware supplied {} actuators",
            self.name,
            self.actuator_index,
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

fn alignment_pid(gains: PidGains) -> Pid<f64> {
    let mut pid = Pid::new(0.0, f64::MAX);
    pid.p(gains.p, f64::MAX)
        .i(gains.i, gains.i_clamp)
        .d(gains.d, f64::MAX);
    pid
}

impl Transmission for GripperTransmission {
    fn name(&self) -> &str {
        &self.name
    }

    fn propagate_position(&self, actuators: &[Actuator], joint_states: &mut [JointState]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let actuator = &actuators[self.actuator_index];
        for (joint_index, reduction) in self.joint_indices.iter().zip(&self.reductions) {
            let joint_state = &mut joint_states[*joint_index];
            joint_state.position = actuator.state.position / reduction;
            joint_state.velocity = actuator.state.velocity / reduction;
            joint_state.applied_effort = actuator.state.last_measured_effort * reduction;
        }
    }

    fn propagate_position_backwards(
        &self,
        joint_states: &[JointState],
        actuators: &mut [Actuator],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        // The joints move in lockstep, so the first one stands in for all
        // of them on the way back to the motor.
        let joint_state = &joint_states[self.joint_indices[0]];
        let reduction = self.reductions[0];
        let actuator = &mut actuators[self.actuator_index];

        actuator.state.position = joint_state.position * reduction;
        actuator.state.velocity = joint_state.velocity * reduction;
        actuator.state.last_measured_effort = joint_state.applied_effort / reduction;
    }

    fn propagate_effort(&self, joint_states: &[JointState], actuators: &mut [Actuator]) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let mut effort = 0.0;
        for (joint_index, reduction) in self.joint_indices.iter().zip(&self.reductions) {
            effort += joint_states[*joint_index].commanded_effort / reduction;
        }

        let actuator = &mut actuators[self.actuator_index];
        actuator.command.effort = effort / self.joint_indices.len() as f64;
        actuator.command.enable = true;
    }

    fn propagate_effort_backwards(
        &mut self,
        actuators: &[Actuator],
        joint_states: &mut [JointState],
    ) {
        self.assert_coverage(actuators.len(), joint_states.len());

        let actuator = &actuators[self.actuator_index];
        for ((joint_index, reduction), pid) in self
            .joint_indices
            .iter()
            .zip(&self.reductions)
            .zip(&mut self.pids)
        {
            let joint_state = &mut joint_states[*joint_index];

            pid.setpoint(actuator.state.position / reduction);
            let correction = pid.next_control_output(joint_state.position).output;

            joint_state.commanded_effort = actuator.command.effort * reduction + correction;
        }
    }
}
