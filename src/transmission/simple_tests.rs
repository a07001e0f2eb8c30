use float_cmp::{ApproxEq, F64Margin};

use super::*;
use crate::hardware::HardwareInterface;
use crate::joint::{Joint, JointLimits, JointType};

fn margin() -> F64Margin {
    F64Margin {
        ulps: 2,
        epsilon: 1e-9,
    }
}

fn single_joint_robot() -> Robot {
    let mut robot = Robot::new();
    robot
        .add_joint(Joint::new(
            "j1",
            JointType::Rotary,
            JointLimits::new(-1.0, 1.0, 100.0, 10.0),
        ))
        .unwrap();
    robot.register_actuator("a1", 0).unwrap();
    robot
}

#[test]
fn test_new() {
    let transmission = SimpleTransmission::new("t1", 3, 5, 2.0);

    assert_eq!(transmission.name(), "t1");
    assert_eq!(transmission.actuator_index(), 3);
    assert_eq!(transmission.joint_index(), 5);
    assert_eq!(transmission.mechanical_reduction(), 2.0);
    assert_eq!(transmission.motor_torque_constant(), 1.0);
    assert_eq!(transmission.pulses_per_revolution(), 1.0);
}

#[test]
#[should_panic(expected = "zero mechanical reduction")]
fn when_the_reduction_is_zero_new_should_panic() {
    let _ = SimpleTransmission::new("t1", 0, 0, 0.0);
}

#[test]
fn test_with_motor_constants() {
    let transmission = SimpleTransmission::new("t1", 0, 0, 2.0).with_motor_constants(0.06, 90000.0);

    assert_eq!(transmission.motor_torque_constant(), 0.06);
    assert_eq!(transmission.pulses_per_revolution(), 90000.0);
}

#[test]
fn when_position_propagates_it_should_divide_by_the_reduction() {
    let transmission = SimpleTransmission::new("t1", 0, 0, 2.0);
    let mut hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];

    hardware.actuators_mut()[0].state.position = 4.0;
    hardware.actuators_mut()[0].state.velocity = 1.0;
    hardware.actuators_mut()[0].state.last_measured_effort = 3.0;

    transmission.propagate_position(hardware.actuators(), &mut joint_states);

    assert_eq!(joint_states[0].position, 2.0);
    assert_eq!(joint_states[0].velocity, 0.5);
    assert_eq!(joint_states[0].applied_effort, 6.0);
}

#[test]
fn when_position_propagates_backwards_it_should_recover_the_actuator_state() {
    let transmission = SimpleTransmission::new("t1", 0, 0, 2.5);
    let mut hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];

    hardware.actuators_mut()[0].state.position = 4.0;
    hardware.actuators_mut()[0].state.velocity = -1.5;
    hardware.actuators_mut()[0].state.last_measured_effort = 0.75;

    transmission.propagate_position(hardware.actuators(), &mut joint_states);

    let mut recovered = HardwareInterface::with_actuator_names(&["a1"]);
    transmission.propagate_position_backwards(&joint_states, recovered.actuators_mut());

    let state = recovered.actuators()[0].state;
    assert!(state.position.approx_eq(4.0, margin()));
    assert!(state.velocity.approx_eq(-1.5, margin()));
    assert!(state.last_measured_effort.approx_eq(0.75, margin()));
}

#[test]
fn when_effort_propagates_it_should_divide_and_enable() {
    let transmission = SimpleTransmission::new("t1", 0, 0, 2.0);
    let mut hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];
    joint_states[0].commanded_effort = 6.0;

    transmission.propagate_effort(&joint_states, hardware.actuators_mut());

    assert_eq!(hardware.actuators()[0].command.effort, 3.0);
    assert!(hardware.actuators()[0].command.enable);
}

#[test]
fn when_effort_propagates_backwards_it_should_recover_the_command() {
    let mut transmission = SimpleTransmission::new("t1", 0, 0, 3.0);
    let mut hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];
    joint_states[0].commanded_effort = 6.0;

    transmission.propagate_effort(&joint_states, hardware.actuators_mut());

    let mut recovered = vec![JointState::new()];
    transmission.propagate_effort_backwards(hardware.actuators(), &mut recovered);

    assert!(recovered[0].commanded_effort.approx_eq(6.0, margin()));
}

#[test]
fn when_the_reduction_is_negative_it_should_flip_direction() {
    let transmission = SimpleTransmission::new("t1", 0, 0, -2.0);
    let mut hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];

    hardware.actuators_mut()[0].state.position = 4.0;
    transmission.propagate_position(hardware.actuators(), &mut joint_states);

    assert_eq!(joint_states[0].position, -2.0);
}

#[test]
#[should_panic(expected = "resolved actuator index")]
fn when_the_actuator_arena_is_too_small_it_should_panic() {
    let transmission = SimpleTransmission::new("t1", 1, 0, 2.0);
    let hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];

    transmission.propagate_position(hardware.actuators(), &mut joint_states);
}

#[test]
#[should_panic(expected = "resolved joint index")]
fn when_the_joint_arena_is_too_small_it_should_panic() {
    let transmission = SimpleTransmission::new("t1", 0, 1, 2.0);
    let hardware = HardwareInterface::with_actuator_names(&["a1"]);
    let mut joint_states = vec![JointState::new()];

    transmission.propagate_position(hardware.actuators(), &mut joint_states);
}

#[test]
fn test_from_description() {
    let robot = single_joint_robot();
    let package = description::parse(
        "<transmission type='SimpleTransmission' name='t1'>\
           <actuator name='a1'/>\
           <joint name='j1'/>\
           <mechanicalReduction>2.0</mechanicalReduction>\
           <motorTorqueConstant>0.06</motorTorqueConstant>\
           <pulsesPerRevolution>90000</pulsesPerRevolution>\
         </transmission>",
    )
    .unwrap();
    let document = package.as_document();
    let element = description::root_element(&document).unwrap();

    let transmission = SimpleTransmission::from_description(element, &robot).unwrap();

    assert_eq!(transmission.name(), "t1");
    assert_eq!(transmission.actuator_index(), 0);
    assert_eq!(transmission.joint_index(), 0);
    assert_eq!(transmission.mechanical_reduction(), 2.0);
    assert_eq!(transmission.motor_torque_constant(), 0.06);
    assert_eq!(transmission.pulses_per_revolution(), 90000.0);
}

#[test]
fn when_the_description_references_an_unknown_joint_it_should_fail() {
    let robot = single_joint_robot();
    let package = description::parse(
        "<transmission type='SimpleTransmission' name='t1'>\
           <actuator name='a1'/>\
           <joint name='j9'/>\
           <mechanicalReduction>2.0</mechanicalReduction>\
           <motorTorqueConstant>1</motorTorqueConstant>\
           <pulsesPerRevolution>1</pulsesPerRevolution>\
         </transmission>",
    )
    .unwrap();
    let document = package.as_document();
    let element = description::root_element(&document).unwrap();

    let result = SimpleTransmission::from_description(element, &robot);

    assert_eq!(
        result.unwrap_err(),
        Error::UnknownJoint {
            name: "j9".to_string()
        }
    );
}

#[test]
fn when_the_description_references_an_unknown_actuator_it_should_fail() {
    let robot = single_joint_robot();
    let package = description::parse(
        "<transmission type='SimpleTransmission' name='t1'>\
           <actuator name='a9'/>\
           <joint name='j1'/>\
           <mechanicalReduction>2.0</mechanicalReduction>\
           <motorTorqueConstant>1</motorTorqueConstant>\
           <pulsesPerRevolution>1</pulsesPerRevolution>\
         </transmission>",
    )
    .unwrap();
    let document = package.as_document();
    let element = description::root_element(&document).unwrap();

    let result = SimpleTransmission::from_description(element, &robot);

    assert_eq!(
        result.unwrap_err(),
        Error::UnknownActuator {
            name: "a9".to_string()
        }
    );
}

#[test]
fn when_the_description_lacks_a_reduction_it_should_fail() {
    let robot = single_joint_robot();
    let package = description::parse(
        "<transmission type='SimpleTransmission' name='t1'>\
           <actuator name='a1'/>\
           <joint name='j1'/>\
           <motorTorqueConstant>1</motorTorqueConstant>\
           <pulsesPerRevolution>1</pulsesPerRevolution>\
         </transmission>",
    )
    .unwrap();
    let document = package.as_document();
    let element = description::root_element(&document).unwrap();

    let result = SimpleTransmission::from_description(element, &robot);

    assert_eq!(
        result.unwrap_err(),
        Error::MissingChild {
            element: "transmission".to_string(),
            child: "mechanicalReduction".to_string(),
        }
    );
}

#[test]
fn when_the_description_has_a_zero_reduction_it_should_fail() {
    let robot = single_joint_robot();
    let package = description::parse(
        "<transmission type='SimpleTransmission' name='t1'>\
           <actuator name='a1'/>\
           <joint name='j1'/>\
           <mechanicalReduction>0.0</mechanicalReduction>\
           <motorTorqueConstant>1</motorTorqueConstant>\
           <pulsesPerRevolution>1</pulsesPerRevolution>\
         </transmission>",
    )
    .unwrap();
    let document = package.as_document();
    let element = description::root_element(&document).unwrap();

    let result = SimpleTransmission::from_description(element, &robot);

    assert!(matches!(result, Err(Error::InvalidScalar { .. })));
}
