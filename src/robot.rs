use std::collections::HashMap;
use std::sync::Arc;

use sxd_document::dom::Element;

use crate::description;
use crate::hardware::HardwareInterface;
use crate::joint::{Joint, JointLimits, JointState, JointType, SafetyLimits};
use crate::registry::TransmissionRegistry;
use crate::transmission::Transmission;
use crate::Error;

#[cfg(test)]
#[path = "robot_tests.rs"]
mod robot_tests;

/// The static mechanical model of a robot.
///
/// The model is an ordered arena of [Joint]s, an ordered list of
/// [Transmission]s and a name-to-index map for the actuators the hardware
/// layer registered. Joint and transmission order is insertion order, which
/// for a description-loaded model is document order.
///
/// A model is built once, either from an XML description through
/// [Robot::init_from_description] or programmatically through
/// [Robot::add_joint] and [Robot::add_transmission], and is read-only
/// afterwards. Description loading locks the model when it finishes;
/// programmatically built models are typically frozen by handing them to
/// [crate::mechanism_control::MechanismControl], which places them behind a
/// shared handle.
#[derive(Default)]
pub struct Robot {
    /// The joints, in insertion order.
    joints: Vec<Joint>,

    /// Joint name to arena index.
    joint_lookup: HashMap<String, usize>,

    /// The transmissions, in insertion order.
    transmissions: Vec<Box<dyn Transmission>>,

    /// Actuator name to hardware arena index, as registered by the hardware
    /// layer.
    actuator_lookup: HashMap<String, usize>,

    /// Set once description loading completes. A locked model refuses
    /// further mutation.
    initialized: bool,
}

impl Robot {
    /// Returns the hardware arena index registered for an actuator name.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The actuator name to look up.
    pub fn actuator_index(&self, name: &str) -> Option<usize> {
        self.actuator_lookup.get(name).copied()
    }

    /// Adds a joint to the model and returns its arena index.
    ///
    /// ## Parameters
    ///
    /// * 'joint' - The joint to add.
    ///
    /// ## Errors
    ///
    /// * [Error::ModelLocked] - Returned when the model is already
    ///   initialized.
    /// * [Error::DuplicateJointName] - Returned when a joint with the same
    ///   name is already in the model.
    pub fn add_joint(&mut self, joint: Joint) -> Result<usize, Error> {
        if self.initialized {
            return Err(Error::ModelLocked {
                name: joint.name().to_string(),
            });
        }
        if self.joint_lookup.contains_key(joint.name()) {
            return Err(Error::DuplicateJointName {
                name: joint.name().to_string(),
            });
        }

        let index = self.joints.len();
        self.joint_lookup.insert(joint.name().to_string(), index);
        self.joints.push(joint);
        Ok(index)
    }

    /// Adds a transmission to the model.
    ///
    /// The transmission must already have resolved its joint and actuator
    /// indices, so when building programmatically the joints and actuators
    /// go in first.
    ///
    /// ## Parameters
    ///
    /// * 'transmission' - The transmission to add.
    ///
    /// ## Errors
    ///
    /// * [Error::ModelLocked] - Returned when the model is already
    ///   initialized.
    pub fn add_transmission(&mut self, transmission: Box<dyn Transmission>) -> Result<(), Error> {
        if self.initialized {
            return Err(Error::ModelLocked {
                name: transmission.name().to_string(),
            });
        }

        self.transmissions.push(transmission);
        Ok(())
    }

    /// Builds the model from an XML robot description.
    ///
    /// The description's `<joint>` elements are loaded first, then its
    /// `<transmission>` elements, each dispatched to the factory the
    /// registry holds for its `type` attribute. A malformed element, an
    /// unresolved name reference or an unknown transmission type does not
    /// abort the load: the element is logged and skipped, the rest of the
    /// description still loads, and the call reports how much was lost.
    /// This keeps a robot with one bad joint bringing up the rest of its
    /// mechanism instead of nothing.
    ///
    /// The model locks when this returns, on the failure path too.
    /// Initializing a model twice is a wiring bug and panics.
    ///
    /// ## Parameters
    ///
    /// * 'xml' - The robot description document.
    /// * 'registry' - The transmission factories to resolve `type`
    ///   attributes against.
    ///
    /// ## Errors
    ///
    /// * [Error::DescriptionParse] - Returned when the document itself does
    ///   not parse; nothing is loaded.
    /// * [Error::DescriptionIncomplete] - Returned when one or more elements
    ///   were skipped; the model keeps everything that did load.
    pub fn init_from_description(
        &mut self,
        xml: &str,
        registry: &TransmissionRegistry,
    ) -> Result<(), Error> {
        assert!(!self.initialized, "the robot model is already initialized");

        let package = description::parse(xml)?;
        let document = package.as_document();
        let root = description::root_element(&document)?;

        let mut failed = 0;

        for element in description::child_elements(root, "joint") {
            match parse_joint(element).and_then(|joint| self.add_joint(joint)) {
                Ok(index) => {
                    log::debug!("loaded joint '{}' at index {}", self.joints[index].name(), index);
                }
                Err(err) => {
                    log::error!("skipping a joint element: {}", err);
                    failed += 1;
                }
            }
        }

        for element in description::child_elements(root, "transmission") {
            match self.build_transmission(element, registry) {
                Ok(transmission) => {
                    log::debug!("loaded transmission '{}'", transmission.name());
                    self.transmissions.push(transmission);
                }
                Err(err) => {
                    log::error!("skipping a transmission element: {}", err);
                    failed += 1;
                }
            }
        }

        self.initialized = true;

        if failed > 0 {
            log::warn!("the robot description loaded with {} skipped element(s)", failed);
            return Err(Error::DescriptionIncomplete { failed });
        }
        Ok(())
    }

    /// Returns true once description loading has locked the model.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the joint with the given name, if any.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The joint name to look up.
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joint_index(name).map(|index| &self.joints[index])
    }

    /// Returns the arena index of the joint with the given name, if any.
    ///
    /// Controllers resolve the joint names from their configuration here
    /// once, at init time, and index directly during update.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The joint name to look up.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_lookup.get(name).copied()
    }

    /// Returns the joints, in insertion order.
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Creates a new, empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the hardware arena index an actuator name resolves to.
    ///
    /// The hardware layer calls this for each actuator before the
    /// description loads, so transmissions can resolve their actuator
    /// references.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The actuator name.
    /// * 'index' - The actuator's index in the hardware arena.
    ///
    /// ## Errors
    ///
    /// * [Error::ModelLocked] - Returned when the model is already
    ///   initialized.
    /// * [Error::DuplicateRegistration] - Returned when the name is already
    ///   registered.
    pub fn register_actuator(&mut self, name: &str, index: usize) -> Result<(), Error> {
        if self.initialized {
            return Err(Error::ModelLocked {
                name: name.to_string(),
            });
        }
        if self.actuator_lookup.contains_key(name) {
            return Err(Error::DuplicateRegistration {
                name: name.to_string(),
            });
        }

        self.actuator_lookup.insert(name.to_string(), index);
        Ok(())
    }

    /// Registers every actuator the hardware interface holds, under its own
    /// name and index.
    ///
    /// ## Parameters
    ///
    /// * 'hardware' - The hardware interface to take the actuators from.
    ///
    /// ## Errors
    ///
    /// * [Error::ModelLocked] / [Error::DuplicateRegistration] - See
    ///   [Robot::register_actuator].
    pub fn register_actuators(&mut self, hardware: &HardwareInterface) -> Result<(), Error> {
        for (index, actuator) in hardware.actuators().iter().enumerate() {
            self.register_actuator(actuator.name(), index)?;
        }
        Ok(())
    }

    /// Returns the transmissions, in insertion order.
    pub fn transmissions(&self) -> &[Box<dyn Transmission>] {
        &self.transmissions
    }

    /// Returns the transmissions mutably.
    ///
    /// The backwards propagate paths need this: simulators own their model
    /// outright and drive transmission-internal state through it. A model
    /// that is already behind a shared handle only exposes the forward
    /// paths.
    pub fn transmissions_mut(&mut self) -> &mut [Box<dyn Transmission>] {
        &mut self.transmissions
    }

    fn build_transmission(
        &self,
        element: Element<'_>,
        registry: &TransmissionRegistry,
    ) -> Result<Box<dyn Transmission>, Error> {
        let type_name = description::required_attribute(element, "type")?;
        let factory = registry
            .get(type_name)
            .ok_or_else(|| Error::UnknownTransmissionType {
                type_name: type_name.to_string(),
            })?;
        factory(element, self)
    }
}

fn parse_joint(element: Element<'_>) -> Result<Joint, Error> {
    let name = description::required_attribute(element, "name")?;

    let joint_type = match description::optional_attribute(element, "type") {
        Some(text) => text.parse::<JointType>()?,
        None => JointType::Rotary,
    };

    let min_position = description::required_child_scalar(element, "limitMin")?;
    let max_position = description::required_child_scalar(element, "limitMax")?;
    let max_effort = description::required_child_scalar(element, "effortLimit")?;
    let max_velocity = description::required_child_scalar(element, "velocityLimit")?;
    if min_position > max_position {
        return Err(Error::InvalidLimits {
            joint: name.to_string(),
            min: min_position,
            max: max_position,
        });
    }

    let limits = JointLimits::new(min_position, max_position, max_effort, max_velocity);
    let mut joint = Joint::new(name, joint_type, limits);

    if let Some(reference_position) =
        description::optional_child_scalar(element, "referencePosition")?
    {
        joint = joint.with_reference_position(reference_position);
    }

    let safety_min = description::child_element(element, "safetyLimitMin");
    let safety_max = description::child_element(element, "safetyLimitMax");
    if safety_min.is_some() || safety_max.is_some() {
        let mut safety_limits = SafetyLimits::default();
        if let Some(bound) = safety_min {
            safety_limits.spring_constant_min =
                description::optional_attribute_scalar(bound, "spring")?.unwrap_or(0.0);
            safety_limits.damping_constant_min =
                description::optional_attribute_scalar(bound, "damping")?.unwrap_or(0.0);
            safety_limits.length_min =
                description::optional_attribute_scalar(bound, "length")?.unwrap_or(0.0);
        }
        if let Some(bound) = safety_max {
            safety_limits.spring_constant_max =
                description::optional_attribute_scalar(bound, "spring")?.unwrap_or(0.0);
            safety_limits.damping_constant_max =
                description::optional_attribute_scalar(bound, "damping")?.unwrap_or(0.0);
            safety_limits.length_max =
                description::optional_attribute_scalar(bound, "length")?.unwrap_or(0.0);
        }
        joint = joint.with_safety_limits(safety_limits);
    }

    Ok(joint)
}

/// The per-cycle state of a whole robot: one [JointState] per model joint,
/// at the same index.
///
/// The state belongs to the realtime side. Each cycle the transmissions
/// write the measured fields, controllers write commanded efforts, limit
/// enforcement clamps, and the transmissions turn the result into actuator
/// commands. The model handle is shared; the states are not.
pub struct RobotState {
    /// The model the states are index-parallel with.
    model: Arc<Robot>,

    /// One state per model joint.
    joint_states: Vec<JointState>,
}

impl RobotState {
    /// Clamps every joint's state against its model limits.
    ///
    /// Runs once per cycle, after the controllers and before the commanded
    /// efforts propagate to the actuators.
    pub fn enforce_safety_limits(&mut self) {
        for (joint, state) in self.model.joints().iter().zip(&mut self.joint_states) {
            joint.enforce_limits(state);
        }
    }

    /// Returns the state of the joint at the given model index.
    ///
    /// ## Parameters
    ///
    /// * 'index' - The joint's arena index.
    pub fn joint_state(&self, index: usize) -> Option<&JointState> {
        self.joint_states.get(index)
    }

    /// Returns the state of the named joint.
    ///
    /// This walks the model's name map; controllers on the update path
    /// resolve the index once at init time and use [RobotState::joint_state]
    /// instead.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The joint name to look up.
    pub fn joint_state_by_name(&self, name: &str) -> Option<&JointState> {
        self.model
            .joint_index(name)
            .and_then(|index| self.joint_states.get(index))
    }

    /// Returns the state of the joint at the given model index, mutably.
    ///
    /// ## Parameters
    ///
    /// * 'index' - The joint's arena index.
    pub fn joint_state_mut(&mut self, index: usize) -> Option<&mut JointState> {
        self.joint_states.get_mut(index)
    }

    /// Returns every joint state, in model order.
    pub fn joint_states(&self) -> &[JointState] {
        &self.joint_states
    }

    /// Returns every joint state mutably, in model order.
    pub fn joint_states_mut(&mut self) -> &mut [JointState] {
        &mut self.joint_states
    }

    /// Returns the model the states are index-parallel with.
    pub fn model(&self) -> &Robot {
        &self.model
    }

    /// Creates the state arena for a model, one zeroed, uncalibrated state
    /// per joint.
    ///
    /// ## Parameters
    ///
    /// * 'model' - The model to mirror.
    pub fn new(model: Arc<Robot>) -> Self {
        let joint_states = vec![JointState::new(); model.joints().len()];
        Self {
            model,
            joint_states,
        }
    }

    /// Returns every state to its zeroed, uncalibrated starting point.
    ///
    /// Reinitialization support: the arena itself is kept, so no allocation
    /// happens and the model stays untouched.
    pub fn reset(&mut self) {
        for state in &mut self.joint_states {
            *state = JointState::new();
        }
    }
}
