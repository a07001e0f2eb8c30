use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sxd_document::dom::Element;

use mechanism_control::controller::Controller;
use mechanism_control::hardware::{Actuator, HardwareInterface};
use mechanism_control::joint::{Joint, JointLimits, JointState, JointType};
use mechanism_control::mechanism_control::MechanismControl;
use mechanism_control::realtime_publisher::{MechanismSnapshot, RealtimePublisher};
use mechanism_control::registry::ControllerRegistry;
use mechanism_control::robot::{Robot, RobotState};
use mechanism_control::transmission::gripper::{GripperTransmission, PidGains};
use mechanism_control::transmission::simple::SimpleTransmission;
use mechanism_control::transmission::wrist::WristTransmission;
use mechanism_control::transmission::Transmission;
use mechanism_control::Error;

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        simple_propagate_position,
        wrist_propagate_position,
        gripper_propagate_effort_backwards,
        enforce_safety_limits,
        snapshot_record,
        publisher_publish,
        full_update_cycle,
}

criterion_main!(benches);

struct HoldEffortController {
    joint_index: usize,
    effort: f64,
}

impl Controller for HoldEffortController {
    fn init(&mut self, _model: &Robot, _config: Element<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn update(&mut self, state: &mut RobotState, _hardware: &HardwareInterface) {
        state.joint_states_mut()[self.joint_index].commanded_effort = self.effort;
    }
}

fn bounded_joint(name: &str) -> Joint {
    Joint::new(name, JointType::Rotary, JointLimits::new(-1.5, 1.5, 20.0, 4.0))
}

pub fn simple_propagate_position(c: &mut Criterion) {
    let transmission = SimpleTransmission::new("elbow_trans", 0, 0, 42.0);
    let mut actuators = vec![Actuator::new("elbow_motor")];
    actuators[0].state.position = 4.2;
    let mut joint_states = vec![JointState::new()];

    c.bench_function("SimpleTransmission::propagate_position", |b| {
        b.iter(|| transmission.propagate_position(black_box(&actuators), &mut joint_states))
    });
}

pub fn wrist_propagate_position(c: &mut Criterion) {
    let transmission = WristTransmission::new("wrist_trans", [0, 1], [0, 1], [60.17, 60.17]);
    let mut actuators = vec![Actuator::new("right_motor"), Actuator::new("left_motor")];
    actuators[0].state.position = 4.0;
    actuators[1].state.position = -4.0;
    let mut joint_states = vec![JointState::new(), JointState::new()];

    c.bench_function("WristTransmission::propagate_position", |b| {
        b.iter(|| transmission.propagate_position(black_box(&actuators), &mut joint_states))
    });
}

pub fn gripper_propagate_effort_backwards(c: &mut Criterion) {
    let mut transmission = GripperTransmission::new(
        "gripper_trans",
        0,
        &[(0, 2.0), (1, 2.0)],
        PidGains {
            p: 10.0,
            i: 0.5,
            d: 0.1,
            i_clamp: 1.0,
        },
    );
    let mut actuators = vec![Actuator::new("gripper_motor")];
    actuators[0].state.position = 4.0;
    actuators[0].command.effort = 1.0;
    let mut joint_states = vec![JointState::new(), JointState::new()];
    joint_states[0].position = 1.9;
    joint_states[1].position = 2.1;

    c.bench_function("GripperTransmission::propagate_effort_backwards", |b| {
        b.iter(|| {
            transmission.propagate_effort_backwards(black_box(&actuators), &mut joint_states)
        })
    });
}

pub fn enforce_safety_limits(c: &mut Criterion) {
    let mut robot = Robot::new();
    for index in 0..8 {
        robot.add_joint(bounded_joint(&format!("joint_{}", index))).unwrap();
    }
    let mut state = RobotState::new(Arc::new(robot));
    for joint_state in state.joint_states_mut() {
        joint_state.commanded_effort = 55.0;
        joint_state.velocity = 6.0;
    }

    c.bench_function("RobotState::enforce_safety_limits", |b| {
        b.iter(|| black_box(&mut state).enforce_safety_limits())
    });
}

pub fn snapshot_record(c: &mut Criterion) {
    let states = vec![JointState::new(); 16];
    let mut snapshot = MechanismSnapshot::default();
    snapshot.record(0.0, &states);

    c.bench_function("MechanismSnapshot::record", |b| {
        b.iter(|| snapshot.record(black_box(1.25), black_box(&states)))
    });
}

pub fn publisher_publish(c: &mut Criterion) {
    let states = vec![JointState::new(); 16];
    let mut snapshot = MechanismSnapshot::default();
    snapshot.record(1.25, &states);
    let publisher = RealtimePublisher::new(snapshot.clone());

    c.bench_function("RealtimePublisher::publish", |b| {
        b.iter(|| publisher.publish(black_box(&snapshot)))
    });
}

pub fn full_update_cycle(c: &mut Criterion) {
    let mut robot = Robot::new();
    robot.add_joint(bounded_joint("elbow_joint")).unwrap();
    robot.add_joint(bounded_joint("wrist_flex_joint")).unwrap();
    robot.add_joint(bounded_joint("wrist_roll_joint")).unwrap();
    robot.register_actuator("elbow_motor", 0).unwrap();
    robot.register_actuator("right_motor", 1).unwrap();
    robot.register_actuator("left_motor", 2).unwrap();
    robot
        .add_transmission(Box::new(SimpleTransmission::new("elbow_trans", 0, 0, 42.0)))
        .unwrap();
    robot
        .add_transmission(Box::new(WristTransmission::new(
            "wrist_trans",
            [1, 2],
            [1, 2],
            [60.17, 60.17],
        )))
        .unwrap();

    let (mut control, manager) = MechanismControl::new(robot, ControllerRegistry::new());
    manager
        .add_controller(
            "elbow_holder",
            Box::new(HoldEffortController {
                joint_index: 0,
                effort: 5.0,
            }),
        )
        .unwrap();
    manager
        .add_controller(
            "flex_holder",
            Box::new(HoldEffortController {
                joint_index: 1,
                effort: 2.0,
            }),
        )
        .unwrap();

    let mut hardware =
        HardwareInterface::with_actuator_names(&["elbow_motor", "right_motor", "left_motor"]);
    hardware.actuators_mut()[0].state.position = 4.2;
    control.update(&mut hardware);

    c.bench_function("MechanismControl::update", |b| {
        b.iter(|| control.update(black_box(&mut hardware)))
    });
}
