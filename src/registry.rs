use std::collections::HashMap;

use sxd_document::dom::Element;

use crate::controller::Controller;
use crate::robot::Robot;
use crate::transmission::{gripper, simple, wrist, Transmission};
use crate::Error;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;

/// A factory that builds a transmission from its description element,
/// resolving the joint and actuator names it references against the model
/// built so far.
pub type TransmissionFactory = fn(Element<'_>, &Robot) -> Result<Box<dyn Transmission>, Error>;

/// A factory that allocates a controller. The controller is configured
/// afterwards through [Controller::init], before it ever enters the live
/// table.
pub type ControllerFactory = fn() -> Box<dyn Controller>;

/// An explicit name-to-factory map.
///
/// Nothing registers itself here as a side effect of being linked in: the
/// embedder populates a registry during startup, before any description
/// loading or controller spawning happens, and hands it to the code that
/// needs it. After that the registry is only read; [Registry::register]
/// refuses names that are already taken, so a name maps to one factory for
/// the registry's whole life.
#[derive(Debug)]
pub struct Registry<F> {
    /// The registered factories, keyed by type name.
    factories: HashMap<String, F>,
}

impl<F> Registry<F> {
    /// Returns the factory registered under the given name, if any.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The type name to look up.
    pub fn get(&self, name: &str) -> Option<&F> {
        self.factories.get(name)
    }

    /// Returns the registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Creates a new, empty [Registry].
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory under a type name.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The type name descriptions and spawn requests will use.
    /// * 'factory' - The factory to associate with the name.
    ///
    /// ## Errors
    ///
    /// * [Error::DuplicateRegistration] - Returned when the name is already
    ///   taken.
    pub fn register(&mut self, name: &str, factory: F) -> Result<(), Error> {
        if self.factories.contains_key(name) {
            return Err(Error::DuplicateRegistration {
                name: name.to_string(),
            });
        }

        self.factories.insert(name.to_string(), factory);
        Ok(())
    }
}

impl<F> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// The registry robot descriptions resolve `<transmission type=...>`
/// elements against.
pub type TransmissionRegistry = Registry<TransmissionFactory>;

/// The registry controller spawn requests resolve their type name against.
pub type ControllerRegistry = Registry<ControllerFactory>;

impl TransmissionRegistry {
    /// Creates a registry pre-loaded with the transmission types this crate
    /// ships: `SimpleTransmission`, `WristTransmission` and
    /// `GripperTransmission`.
    pub fn with_standard_types() -> Self {
        Self {
            factories: HashMap::from([
                (
                    "SimpleTransmission".to_string(),
                    simple::factory as TransmissionFactory,
                ),
                (
                    "WristTransmission".to_string(),
                    wrist::factory as TransmissionFactory,
                ),
                (
                    "GripperTransmission".to_string(),
                    gripper::factory as TransmissionFactory,
                ),
            ]),
        }
    }
}
