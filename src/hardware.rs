#[cfg(test)]
#[path = "hardware_tests.rs"]
mod hardware_tests;

/// The measurements the hardware driver reports for a single actuator.
///
/// The driver is the only writer of this record; it refreshes the fields once
/// per control cycle, immediately before the realtime update runs. Everything
/// downstream of the driver only reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActuatorState {
    /// The position of the actuator, in actuator space.
    pub position: f64,

    /// The velocity of the actuator, in actuator space.
    pub velocity: f64,

    /// The effort the actuator last reported applying.
    pub last_measured_effort: f64,
}

/// The command the control side hands to the hardware driver for a single
/// actuator.
///
/// Transmissions are the only writers of this record; the driver reads it
/// once per control cycle, immediately after the realtime update runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActuatorCommand {
    /// The effort the actuator should apply.
    pub effort: f64,

    /// Whether the actuator should be powered. Transmissions assert this for
    /// every actuator they drive.
    pub enable: bool,
}

/// A single motor as seen from the control side: the state the driver
/// measured and the command the control side wants executed.
#[derive(Clone, Debug, PartialEq)]
pub struct Actuator {
    /// The name under which the actuator is registered with the robot model.
    name: String,

    /// The most recent measurements for this actuator.
    pub state: ActuatorState,

    /// The command for the driver to execute.
    pub command: ActuatorCommand,
}

impl Actuator {
    /// Returns the name of the actuator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new [Actuator] with zeroed state and a disabled command.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name the hardware layer registers the actuator under.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ActuatorState::default(),
            command: ActuatorCommand::default(),
        }
    }
}

/// The boundary between the hardware driver and the control side: the arena
/// of actuators plus the hardware clock.
///
/// Each field of each actuator has exactly one writer. The driver writes
/// [Actuator::state] and [HardwareInterface::current_time]; transmissions
/// write [Actuator::command]. Actuators are created once at hardware init
/// time and the arena never changes size afterwards, so indices handed out
/// during model construction stay valid for the life of the interface.
#[derive(Debug)]
pub struct HardwareInterface {
    /// The actuators, in registration order.
    actuators: Vec<Actuator>,

    /// The driver's clock, in seconds. Written by the driver each cycle.
    pub current_time: f64,
}

impl HardwareInterface {
    /// Returns the index the named actuator lives at, if it exists.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The actuator name to look up.
    pub fn actuator_index(&self, name: &str) -> Option<usize> {
        self.actuators.iter().position(|a| a.name() == name)
    }

    /// Returns the actuators, in registration order.
    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// Returns the actuators mutably, in registration order.
    pub fn actuators_mut(&mut self) -> &mut [Actuator] {
        &mut self.actuators
    }

    /// Creates a new [HardwareInterface] owning the given actuators.
    ///
    /// ## Parameters
    ///
    /// * 'actuators' - The actuators, in the order the driver indexes them.
    pub fn new(actuators: Vec<Actuator>) -> Self {
        Self {
            actuators,
            current_time: 0.0,
        }
    }

    /// Creates a new [HardwareInterface] with one zeroed actuator per name.
    ///
    /// ## Parameters
    ///
    /// * 'names' - The actuator names, in the order the driver indexes them.
    pub fn with_actuator_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| Actuator::new(n)).collect())
    }
}
