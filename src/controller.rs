use sxd_document::dom::Element;

use crate::hardware::HardwareInterface;
use crate::robot::{Robot, RobotState};
use crate::Error;

/// A control algorithm scheduled by the realtime loop.
///
/// Controllers are built by a factory from the
/// [crate::registry::ControllerRegistry], configured once through
/// [Controller::init], and only then handed to the realtime loop. The loop
/// calls [Controller::update] every cycle after the measured joint state is
/// in and before the limits clamp, so whatever a controller writes into
/// `commanded_effort` this cycle reaches the actuators this cycle, bounded
/// by the joint limits.
///
/// `init` runs on a non-realtime thread and may allocate, log and fail.
/// `update` runs on the realtime thread: it must complete in bounded time
/// and must not allocate, block or touch the filesystem or network. It has
/// no error return; a controller that loses its footing should command
/// something safe and keep going.
pub trait Controller: Send {
    /// Configures the controller against the model it will control.
    ///
    /// Joint names from the configuration resolve to arena indices here,
    /// once; [Controller::update] then indexes directly.
    ///
    /// ## Parameters
    ///
    /// * 'model' - The robot model the controller will run against.
    /// * 'config' - The controller's configuration element.
    ///
    /// ## Errors
    ///
    /// Implementations return whatever load-time error stopped them from
    /// configuring; the spawn path wraps it and never schedules the
    /// controller.
    fn init(&mut self, model: &Robot, config: Element<'_>) -> Result<(), Error>;

    /// Runs one control cycle.
    ///
    /// ## Parameters
    ///
    /// * 'state' - The measured joint state; the controller writes its
    ///   commanded efforts into it.
    /// * 'hardware' - The hardware interface, for the cycle clock and raw
    ///   actuator readings.
    fn update(&mut self, state: &mut RobotState, hardware: &HardwareInterface);
}
