use super::*;

#[test]
fn test_new_actuator() {
    let actuator = Actuator::new("left_wheel_motor");

    assert_eq!(actuator.name(), "left_wheel_motor");
    assert_eq!(actuator.state.position, 0.0);
    assert_eq!(actuator.state.velocity, 0.0);
    assert_eq!(actuator.state.last_measured_effort, 0.0);
    assert_eq!(actuator.command.effort, 0.0);
    assert!(!actuator.command.enable);
}

#[test]
fn test_new_hardware_interface() {
    let interface = HardwareInterface::new(vec![Actuator::new("a1"), Actuator::new("a2")]);

    assert_eq!(interface.actuators().len(), 2);
    assert_eq!(interface.actuators()[0].name(), "a1");
    assert_eq!(interface.actuators()[1].name(), "a2");
    assert_eq!(interface.current_time, 0.0);
}

#[test]
fn test_with_actuator_names() {
    let interface = HardwareInterface::with_actuator_names(&["a1", "a2", "a3"]);

    assert_eq!(interface.actuators().len(), 3);
    assert_eq!(interface.actuators()[2].name(), "a3");
}

#[test]
fn test_actuator_index() {
    let interface = HardwareInterface::with_actuator_names(&["a1", "a2"]);

    assert_eq!(interface.actuator_index("a1"), Some(0));
    assert_eq!(interface.actuator_index("a2"), Some(1));
    assert_eq!(interface.actuator_index("a3"), None);
}

#[test]
fn when_state_is_written_it_should_be_visible_through_the_interface() {
    let mut interface = HardwareInterface::with_actuator_names(&["a1"]);

    interface.actuators_mut()[0].state.position = 1.5;
    interface.actuators_mut()[0].state.velocity = -0.25;
    interface.actuators_mut()[0].state.last_measured_effort = 3.0;
    interface.current_time = 0.001;

    let actuator = &interface.actuators()[0];
    assert_eq!(actuator.state.position, 1.5);
    assert_eq!(actuator.state.velocity, -0.25);
    assert_eq!(actuator.state.last_measured_effort, 3.0);
    assert_eq!(interface.current_time, 0.001);
}
