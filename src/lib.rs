#![warn(missing_docs)]

//! Realtime mechanism control for robot actuation.
//!
//! Ties hardware actuators to robot joints through pluggable transmissions,
//! runs a bounded set of controllers every control cycle, enforces joint
//! safety limits and lets controllers be spawned and killed from non-realtime
//! threads without disturbing the realtime update loop.
//!
//! The expected wiring is:
//!
//! 1. The hardware driver creates a [hardware::HardwareInterface] with one
//!    [hardware::Actuator] per motor.
//! 2. A [robot::Robot] is created, the hardware actuators are registered on
//!    it, and the robot description XML is loaded through
//!    [robot::Robot::init_from_description] using a
//!    [registry::TransmissionRegistry].
//! 3. [mechanism_control::MechanismControl::new] consumes the robot model and
//!    a [registry::ControllerRegistry], returning the realtime half and the
//!    non-realtime [mechanism_control::ControllerManager].
//! 4. The realtime thread calls
//!    [mechanism_control::MechanismControl::update] once per cycle between
//!    the driver's read and write of the hardware; any other thread uses the
//!    manager to spawn, kill and list controllers.

use thiserror::Error;

/// Defines the interface that controllers implement to take part in the
/// realtime update cycle.
pub mod controller;

/// Provides helpers for walking robot description XML element trees.
pub mod description;

/// Defines the actuator state and command records that form the hardware
/// boundary.
pub mod hardware;

/// Defines joints, their physical limits and their per-cycle state.
pub mod joint;

/// Provides the realtime update scheduler and the non-realtime controller
/// lifecycle manager.
pub mod mechanism_control;

/// Provides a try-lock mailbox for exporting state out of the realtime
/// thread.
pub mod realtime_publisher;

/// Defines the explicit name-to-factory registries for transmissions and
/// controllers.
pub mod registry;

/// Defines the robot model and its runtime state.
pub mod robot;

/// Defines the transmissions that map between actuator space and joint
/// space.
pub mod transmission;

/// Defines the different errors for the mechanism control crate.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The robot description document could not be parsed at all.
    #[error("failed to parse the robot description: {details}")]
    DescriptionParse {
        /// The parser's description of the failure.
        details: String,
    },

    /// A description element is missing a required attribute.
    #[error("element <{element}> is missing the required attribute '{attribute}'")]
    MissingAttribute {
        /// The name of the element that was being read.
        element: String,
        /// The name of the attribute that was not found.
        attribute: String,
    },

    /// A description element is missing a required child element.
    #[error("element <{element}> is missing the required child <{child}>")]
    MissingChild {
        /// The name of the element that was being read.
        element: String,
        /// The name of the child element that was not found.
        child: String,
    },

    /// A description value could not be read as a floating point number.
    #[error("'{element}' holds '{value}' where a number was expected")]
    InvalidScalar {
        /// The element, or `element@attribute` path, that was being read.
        element: String,
        /// The text that failed to parse.
        value: String,
    },

    /// A joint description used a type name that is not known.
    #[error("'{value}' is not a known joint type")]
    UnknownJointType {
        /// The type text found in the description.
        value: String,
    },

    /// A joint description has a lower position limit above its upper limit.
    #[error("joint '{joint}' has inverted position limits: {min} > {max}")]
    InvalidLimits {
        /// The name of the joint.
        joint: String,
        /// The lower position limit found in the description.
        min: f64,
        /// The upper position limit found in the description.
        max: f64,
    },

    /// Two joints in the description share a name.
    #[error("the robot description contains joint '{name}' more than once")]
    DuplicateJointName {
        /// The duplicated joint name.
        name: String,
    },

    /// A transmission or controller referenced a joint that the model does
    /// not contain.
    #[error("no joint named '{name}' exists in the robot model")]
    UnknownJoint {
        /// The joint name that failed to resolve.
        name: String,
    },

    /// A transmission referenced an actuator that was never registered.
    #[error("no actuator named '{name}' is registered with the robot model")]
    UnknownActuator {
        /// The actuator name that failed to resolve.
        name: String,
    },

    /// A transmission element used a type with no registered factory.
    #[error("no transmission type '{type_name}' is registered")]
    UnknownTransmissionType {
        /// The type attribute found in the description.
        type_name: String,
    },

    /// Some elements of the robot description failed to load. The elements
    /// that did load are kept.
    #[error("{failed} element(s) of the robot description could not be loaded")]
    DescriptionIncomplete {
        /// The number of elements that were skipped.
        failed: usize,
    },

    /// The robot model no longer accepts additions because it has been
    /// initialized.
    #[error("cannot add '{name}' after the robot model is initialized")]
    ModelLocked {
        /// The name of the joint, actuator or transmission that was being
        /// added.
        name: String,
    },

    /// A factory or actuator was registered under a name that is already
    /// taken.
    #[error("'{name}' is already registered")]
    DuplicateRegistration {
        /// The name that was registered twice.
        name: String,
    },

    /// A spawn request used a controller type with no registered factory.
    #[error("no controller type '{type_name}' is registered")]
    UnknownControllerType {
        /// The requested controller type.
        type_name: String,
    },

    /// A spawn request reused a controller name that is still live.
    #[error("a controller named '{name}' is already running")]
    DuplicateControllerName {
        /// The requested controller name.
        name: String,
    },

    /// A kill request named a controller that is not in the table.
    #[error("no controller named '{name}' is running")]
    UnknownController {
        /// The requested controller name.
        name: String,
    },

    /// The controller table has no free slots left.
    #[error("the controller table is full ({capacity} slots)")]
    ControllerCapacityExhausted {
        /// The fixed capacity of the controller table.
        capacity: usize,
    },

    /// A controller's init rejected its configuration.
    #[error("controller '{name}' failed to initialize: {details}")]
    ControllerInitFailed {
        /// The name the controller was going to run under.
        name: String,
        /// The error reported by the controller.
        details: String,
    },

    /// The realtime half of the mechanism is gone or has stopped draining
    /// its request mailbox, so lifecycle requests cannot be serviced.
    #[error("the realtime update loop is no longer running")]
    RealtimeLoopStopped,
}
