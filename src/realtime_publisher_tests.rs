use std::thread;
use std::time::{Duration, Instant};

use float_cmp::{ApproxEq, F64Margin};

use super::*;
use crate::joint::{Joint, JointLimits, JointType};

fn margin() -> F64Margin {
    F64Margin {
        ulps: 2,
        epsilon: 1e-9,
    }
}

fn arm_robot() -> Robot {
    let mut robot = Robot::new();
    robot
        .add_joint(Joint::new(
            "shoulder_joint",
            JointType::Rotary,
            JointLimits::new(-1.0, 1.0, 50.0, 5.0),
        ))
        .unwrap();
    robot
        .add_joint(Joint::new(
            "elbow_joint",
            JointType::Rotary,
            JointLimits::new(-2.0, 2.0, 40.0, 4.0),
        ))
        .unwrap();
    robot
}

#[test]
fn test_new() {
    let publisher = RealtimePublisher::new(5.0_f64);

    assert!(publisher.latest().approx_eq(5.0, margin()));
}

#[test]
fn when_a_value_is_published_latest_should_return_it() {
    let publisher = RealtimePublisher::new(0.0_f64);

    assert!(publisher.publish(&2.5));

    assert!(publisher.latest().approx_eq(2.5, margin()));
}

#[test]
fn when_a_publisher_is_cloned_both_handles_should_share_the_slot() {
    let publisher = RealtimePublisher::new(String::from("idle"));
    let reader = publisher.clone();

    assert!(publisher.publish(&String::from("running")));

    assert_eq!(reader.latest(), "running");
}

#[test]
fn when_a_reader_polls_it_should_observe_the_published_values() {
    let publisher = RealtimePublisher::new(0_u64);
    let reader = publisher.clone();

    let writer = thread::spawn(move || {
        let mut published = 0_u64;
        while published < 100 {
            // A contended cycle is skipped, so keep going until the write
            // lands.
            if publisher.publish(&(published + 1)) {
                published += 1;
            }
            thread::yield_now();
        }
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while reader.latest() < 100 && Instant::now() < deadline {
        thread::yield_now();
    }
    writer.join().unwrap();

    assert_eq!(reader.latest(), 100);
}

#[test]
fn test_for_robot() {
    let snapshot = MechanismSnapshot::for_robot(&arm_robot());

    assert!(snapshot.time.approx_eq(0.0, margin()));
    assert_eq!(snapshot.joints.len(), 2);
}

#[test]
fn when_a_snapshot_records_it_should_copy_every_joint() {
    let mut snapshot = MechanismSnapshot::for_robot(&arm_robot());
    let mut states = vec![JointState::new(); 2];
    states[0].position = 0.5;
    states[1].velocity = -1.5;

    snapshot.record(2.5, &states);

    assert!(snapshot.time.approx_eq(2.5, margin()));
    assert!(snapshot.joints[0].position.approx_eq(0.5, margin()));
    assert!(snapshot.joints[1].velocity.approx_eq(-1.5, margin()));
}

#[test]
fn when_a_snapshot_is_undersized_recording_should_grow_it() {
    let mut snapshot = MechanismSnapshot::default();
    let states = vec![JointState::new(); 3];

    snapshot.record(1.0, &states);

    assert_eq!(snapshot.joints.len(), 3);
}

#[test]
fn when_a_snapshot_is_published_the_reader_should_see_the_joints() {
    let publisher = RealtimePublisher::new(MechanismSnapshot::for_robot(&arm_robot()));
    let mut snapshot = MechanismSnapshot::for_robot(&arm_robot());
    let mut states = vec![JointState::new(); 2];
    states[0].position = 0.75;
    snapshot.record(3.0, &states);

    assert!(publisher.publish(&snapshot));

    let observed = publisher.latest();
    assert!(observed.time.approx_eq(3.0, margin()));
    assert!(observed.joints[0].position.approx_eq(0.75, margin()));
}
