use std::fmt::Display;
use std::str::FromStr;

use crate::Error;

#[cfg(test)]
#[path = "joint_tests.rs"]
mod joint_tests;

/// The kind of motion a joint allows.
///
/// The kind decides whether position limits are meaningful: a continuous
/// joint rotates without bound and a fixed or planar joint has no single
/// scalar position to bound, so only rotary and prismatic joints take part
/// in position limiting.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JointType {
    /// A rotating joint with bounded travel.
    Rotary,

    /// A rotating joint without travel bounds.
    Continuous,

    /// A sliding joint with bounded travel.
    Prismatic,

    /// A rigid connection. Carried in the model so descriptions can name it,
    /// but it never moves.
    Fixed,

    /// A joint moving freely in a plane.
    Planar,
}

impl JointType {
    /// Returns true when the joint kind has a bounded scalar position that
    /// [Joint::enforce_limits] should clamp.
    pub fn has_position_limits(&self) -> bool {
        matches!(self, JointType::Rotary | JointType::Prismatic)
    }
}

impl Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JointType::Rotary => "rotary",
            JointType::Continuous => "continuous",
            JointType::Prismatic => "prismatic",
            JointType::Fixed => "fixed",
            JointType::Planar => "planar",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for JointType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // Older descriptions write "revolute" where newer ones write
            // "rotary". Both name the same joint kind.
            "revolute" | "rotary" => Ok(JointType::Rotary),
            "continuous" => Ok(JointType::Continuous),
            "prismatic" => Ok(JointType::Prismatic),
            "fixed" => Ok(JointType::Fixed),
            "planar" => Ok(JointType::Planar),
            _ => Err(Error::UnknownJointType {
                value: s.to_string(),
            }),
        }
    }
}

/// The static physical limits of a joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointLimits {
    /// The smallest position the joint may reach.
    pub min_position: f64,

    /// The largest position the joint may reach.
    pub max_position: f64,

    /// The largest effort magnitude the joint may be commanded with.
    pub max_effort: f64,

    /// The largest velocity magnitude the joint may move at.
    pub max_velocity: f64,
}

impl JointLimits {
    /// Creates a new [JointLimits].
    ///
    /// ## Parameters
    ///
    /// * 'min_position' - The smallest position the joint may reach.
    /// * 'max_position' - The largest position the joint may reach.
    /// * 'max_effort' - The largest effort magnitude for the joint.
    /// * 'max_velocity' - The largest velocity magnitude for the joint.
    pub fn new(min_position: f64, max_position: f64, max_effort: f64, max_velocity: f64) -> Self {
        Self {
            min_position,
            max_position,
            max_effort,
            max_velocity,
        }
    }
}

/// Spring and damper constants for the region near a joint's travel bounds.
///
/// These are parsed and stored so descriptions that carry them keep loading,
/// but the limit enforcement in this crate is a hard clamp and does not act
/// on them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SafetyLimits {
    /// The spring constant near the lower travel bound.
    pub spring_constant_min: f64,

    /// The spring constant near the upper travel bound.
    pub spring_constant_max: f64,

    /// The damping constant near the lower travel bound.
    pub damping_constant_min: f64,

    /// The damping constant near the upper travel bound.
    pub damping_constant_max: f64,

    /// The length of the protected region at the lower travel bound.
    pub length_min: f64,

    /// The length of the protected region at the upper travel bound.
    pub length_max: f64,
}

/// A single degree of freedom of the robot: its name, motion kind, limits
/// and calibration datum. Immutable once the robot model is initialized.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// The name of the joint. Unique within a robot model.
    name: String,

    /// The kind of motion the joint allows.
    joint_type: JointType,

    /// The physical limits of the joint.
    limits: JointLimits,

    /// Optional spring/damper constants for the travel bounds.
    safety_limits: Option<SafetyLimits>,

    /// The position of the joint's calibration marker, used by calibration
    /// routines outside this crate.
    reference_position: f64,
}

impl Joint {
    /// Clamps the commanded effort, and when the joint is calibrated also
    /// the stored position, against the joint's limits.
    ///
    /// This runs once per cycle, after all controllers have written their
    /// commands and before those commands are propagated to the actuators,
    /// so nothing beyond the configured limits ever leaves the process.
    ///
    /// The enforcement policy:
    ///
    /// * Commanded effort is always kept inside the effort limit.
    /// * A velocity beyond the velocity limit blocks commanded effort that
    ///   would push further in the offending direction.
    /// * Position limits apply only when the state is calibrated and the
    ///   joint kind has a bounded position. An uncalibrated joint has no
    ///   trustworthy absolute position, so clamping on it would act on
    ///   unverified data; this is a deliberate policy, not an oversight.
    ///   When they apply, the stored position is clamped into the limit
    ///   range and effort pushing out of range is blocked.
    ///
    /// ## Parameters
    ///
    /// * 'state' - The joint state to clamp.
    pub fn enforce_limits(&self, state: &mut JointState) {
        let mut min_effort = -self.limits.max_effort;
        let mut max_effort = self.limits.max_effort;

        if state.velocity > self.limits.max_velocity {
            max_effort = max_effort.min(0.0);
        }
        if state.velocity < -self.limits.max_velocity {
            min_effort = min_effort.max(0.0);
        }

        if state.calibrated && self.joint_type.has_position_limits() {
            if state.position > self.limits.max_position {
                state.position = self.limits.max_position;
                max_effort = max_effort.min(0.0);
            } else if state.position < self.limits.min_position {
                state.position = self.limits.min_position;
                min_effort = min_effort.max(0.0);
            }
        }

        if state.commanded_effort > max_effort {
            state.commanded_effort = max_effort;
        }
        if state.commanded_effort < min_effort {
            state.commanded_effort = min_effort;
        }
    }

    /// Returns the kind of motion the joint allows.
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Returns the physical limits of the joint.
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Returns the name of the joint.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new [Joint] without safety limits and with a zero reference
    /// position.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the joint.
    /// * 'joint_type' - The kind of motion the joint allows.
    /// * 'limits' - The physical limits of the joint.
    pub fn new(name: &str, joint_type: JointType, limits: JointLimits) -> Self {
        Self {
            name: name.to_string(),
            joint_type,
            limits,
            safety_limits: None,
            reference_position: 0.0,
        }
    }

    /// Returns the position of the joint's calibration marker.
    pub fn reference_position(&self) -> f64 {
        self.reference_position
    }

    /// Returns the spring/damper constants for the travel bounds, when the
    /// description carried them.
    pub fn safety_limits(&self) -> Option<&SafetyLimits> {
        self.safety_limits.as_ref()
    }

    /// Sets the position of the joint's calibration marker.
    ///
    /// ## Parameters
    ///
    /// * 'reference_position' - The marker position.
    pub fn with_reference_position(mut self, reference_position: f64) -> Self {
        self.reference_position = reference_position;
        self
    }

    /// Attaches spring/damper constants for the travel bounds.
    ///
    /// ## Parameters
    ///
    /// * 'safety_limits' - The constants to store.
    pub fn with_safety_limits(mut self, safety_limits: SafetyLimits) -> Self {
        self.safety_limits = Some(safety_limits);
        self
    }
}

/// The per-cycle state of one joint.
///
/// One of these exists per [Joint], at the same index in the robot state as
/// the joint holds in the robot model. Transmissions write the measured
/// fields on the way in, controllers write the commanded effort, and
/// [Joint::enforce_limits] clamps before anything flows back out.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointState {
    /// The position of the joint, in joint space.
    pub position: f64,

    /// The velocity of the joint, in joint space.
    pub velocity: f64,

    /// The effort the joint is measured to be applying, derived from the
    /// actuator's last measured effort.
    pub applied_effort: f64,

    /// The effort a controller wants the joint to apply.
    pub commanded_effort: f64,

    /// Whether the joint's absolute position has been established. Position
    /// limits are only enforced once this is set.
    pub calibrated: bool,
}

impl JointState {
    /// Creates a new [JointState] with zeroed motion state, no commanded
    /// effort and the calibrated flag cleared.
    pub fn new() -> Self {
        Self::default()
    }
}
