use crate::hardware::Actuator;
use crate::joint::JointState;

/// Provides the one-actuator-to-many-joints gripper transmission.
pub mod gripper;

/// Provides the one-to-one transmission with a scalar reduction.
pub mod simple;

/// Provides the two-actuator differential wrist transmission.
pub mod wrist;

/// The mechanical mapping between one or more actuators and one or more
/// joints.
///
/// A transmission resolves the joint and actuator names it is configured
/// with to arena indices once, at load time. Every propagate call then
/// receives the whole actuator arena and the whole joint-state arena and the
/// transmission touches only its own indices. Passing arenas that do not
/// cover the resolved indices is a wiring bug, not an operating condition,
/// and panics.
///
/// The forward pair runs on the realtime thread every cycle and completes in
/// bounded time without allocating:
///
/// * [Transmission::propagate_position] carries measured actuator state into
///   joint space.
/// * [Transmission::propagate_effort] carries commanded joint efforts back
///   into actuator commands.
///
/// The backwards pair is the simulation side of the same mapping, used by
/// simulators that own the model outright to derive actuator readings from
/// simulated joints and joint commands from actuator commands.
pub trait Transmission: Send + Sync {
    /// Returns the name the description gave this transmission.
    fn name(&self) -> &str;

    /// Reads actuator position, velocity and measured effort and writes the
    /// corresponding joint-space values into the joint states this
    /// transmission drives.
    fn propagate_position(&self, actuators: &[Actuator], joint_states: &mut [JointState]);

    /// The inverse of [Transmission::propagate_position]: derives actuator
    /// state from joint state, for simulators.
    fn propagate_position_backwards(&self, joint_states: &[JointState], actuators: &mut [Actuator]);

    /// Reads the commanded joint efforts and writes actuator effort
    /// commands, enabling every actuator this transmission drives.
    fn propagate_effort(&self, joint_states: &[JointState], actuators: &mut [Actuator]);

    /// The inverse of [Transmission::propagate_effort]: derives commanded
    /// joint efforts from actuator commands, for simulators. Takes `&mut
    /// self` because variants may run internal state (such as alignment
    /// controllers) on this path.
    fn propagate_effort_backwards(&mut self, actuators: &[Actuator], joint_states: &mut [JointState]);
}
