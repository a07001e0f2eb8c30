use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};

use crate::controller::Controller;
use crate::description;
use crate::hardware::HardwareInterface;
use crate::realtime_publisher::MechanismSnapshot;
use crate::registry::ControllerRegistry;
use crate::robot::{Robot, RobotState};
use crate::Error;

#[cfg(test)]
#[path = "mechanism_control_tests.rs"]
mod mechanism_control_tests;

/// The capacity of the controller table.
///
/// The table is allocated once at this size and never grows, so the
/// realtime loop's per-cycle work is bounded no matter how many spawn and
/// kill requests arrive.
pub const MAX_NUM_CONTROLLERS: usize = 100;

/// A change to the controller table, queued by the manager and applied by
/// the realtime thread at the top of its next cycle.
///
/// The two halves share one FIFO channel, so an `Add` for a slot is always
/// applied before any later `Remove` of the same slot.
enum Request {
    /// Place a fully-initialized controller into its reserved slot.
    Add {
        /// The slot the manager reserved.
        slot: usize,

        /// The controller to run.
        controller: Box<dyn Controller>,
    },

    /// Move the controller out of a slot and hand it back to the manager.
    Remove {
        /// The slot to empty.
        slot: usize,
    },
}

/// The realtime half of the mechanism: the model, the live joint state and
/// the controller table.
///
/// One of these is owned by the realtime thread, which calls
/// [MechanismControl::update] at a fixed rate. Everything else goes through
/// the [ControllerManager] built alongside it by [MechanismControl::new].
pub struct MechanismControl {
    /// The static model, shared with the manager.
    model: Arc<Robot>,

    /// The per-cycle joint state, owned exclusively by this half.
    state: RobotState,

    /// The controller table. Slot order is update order.
    controllers: Vec<Option<Box<dyn Controller>>>,

    /// Table changes queued by the manager.
    requests: Receiver<Request>,

    /// Removed controllers on their way back to the manager for disposal.
    removed: Sender<Box<dyn Controller>>,
}

impl MechanismControl {
    /// Returns the model this mechanism runs against.
    pub fn model(&self) -> &Robot {
        &self.model
    }

    /// Creates the realtime half and its manager for a model.
    ///
    /// The model is frozen here: both halves share it read-only from now
    /// on. The manager is the only way to change the controller table, and
    /// it can be handed to any non-realtime thread.
    ///
    /// ## Parameters
    ///
    /// * 'robot' - The model to run.
    /// * 'registry' - The controller factories spawn requests resolve
    ///   against.
    pub fn new(robot: Robot, registry: ControllerRegistry) -> (MechanismControl, ControllerManager) {
        let model = Arc::new(robot);
        let state = RobotState::new(Arc::clone(&model));

        // One extra request slot so a full table can still queue removals.
        let (request_sender, request_receiver) =
            crossbeam_channel::bounded(MAX_NUM_CONTROLLERS + 1);
        let (removed_sender, removed_receiver) = crossbeam_channel::bounded(MAX_NUM_CONTROLLERS);

        let control = MechanismControl {
            model: Arc::clone(&model),
            state,
            controllers: (0..MAX_NUM_CONTROLLERS).map(|_| None).collect(),
            requests: request_receiver,
            removed: removed_sender,
        };
        let manager = ControllerManager {
            model,
            registry,
            inner: Mutex::new(ManagerInner {
                names: vec![None; MAX_NUM_CONTROLLERS],
                requests: request_sender,
                removed: removed_receiver,
            }),
        };

        (control, manager)
    }

    /// Copies the current joint state into a snapshot.
    ///
    /// Call this from the realtime thread after [MechanismControl::update];
    /// with a snapshot built by [MechanismSnapshot::for_robot] it does not
    /// allocate.
    ///
    /// ## Parameters
    ///
    /// * 'time' - The hardware clock, in seconds.
    /// * 'snapshot' - The snapshot to fill.
    pub fn snapshot_state(&self, time: f64, snapshot: &mut MechanismSnapshot) {
        snapshot.record(time, self.state.joint_states());
    }

    /// Returns the live joint state.
    pub fn state(&self) -> &RobotState {
        &self.state
    }

    /// Returns the live joint state mutably, for calibration routines and
    /// simulators that feed the state directly.
    pub fn state_mut(&mut self) -> &mut RobotState {
        &mut self.state
    }

    /// Runs one control cycle.
    ///
    /// The cycle is four phases in fixed order, after the queued table
    /// changes are applied:
    ///
    /// 1. Every transmission carries measured actuator state into joint
    ///    space.
    /// 2. Every live controller runs, in slot order.
    /// 3. Every joint's limits clamp the commanded state.
    /// 4. Every transmission carries the clamped commands back into
    ///    actuator commands.
    ///
    /// The whole cycle is realtime-safe: bounded iteration, no locks, no
    /// allocation. Removed controllers are sent back to the manager whole
    /// precisely so no destructor runs on this thread.
    ///
    /// ## Parameters
    ///
    /// * 'hardware' - The actuator arena the cycle reads from and writes
    ///   to.
    pub fn update(&mut self, hardware: &mut HardwareInterface) {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                Request::Add { slot, controller } => {
                    assert!(
                        self.controllers[slot].is_none(),
                        "controller slot {} was handed out while occupied",
                        slot
                    );
                    self.controllers[slot] = Some(controller);
                }
                Request::Remove { slot } => {
                    let controller = self.controllers[slot].take();
                    assert!(
                        controller.is_some(),
                        "a removal was queued for empty controller slot {}",
                        slot
                    );
                    if let Some(controller) = controller {
                        // The return side never fills: the manager drains it
                        // before queueing more work. A disconnected manager
                        // means teardown, and then dropping here is safe.
                        let _ = self.removed.try_send(controller);
                    }
                }
            }
        }

        for transmission in self.model.transmissions() {
            transmission.propagate_position(hardware.actuators(), self.state.joint_states_mut());
        }

        for controller in self.controllers.iter_mut().flatten() {
            controller.update(&mut self.state, hardware);
        }

        self.state.enforce_safety_limits();

        for transmission in self.model.transmissions() {
            transmission.propagate_effort(self.state.joint_states(), hardware.actuators_mut());
        }
    }
}

/// The manager's own bookkeeping, behind its mutex.
struct ManagerInner {
    /// A mirror of the controller table holding only the names. A `Some`
    /// here means the slot is reserved: live in the realtime table, or
    /// queued to become live.
    names: Vec<Option<String>>,

    /// Table changes on their way to the realtime thread.
    requests: Sender<Request>,

    /// Removed controllers coming back for disposal.
    removed: Receiver<Box<dyn Controller>>,
}

impl ManagerInner {
    /// Drops every controller the realtime thread has handed back so far.
    fn reap(&mut self) {
        while let Ok(controller) = self.removed.try_recv() {
            drop(controller);
        }
    }
}

/// The non-realtime half of the mechanism: spawns and kills controllers.
///
/// The manager never touches the realtime thread's data. It keeps a name
/// mirror of the controller table, queues table changes over a channel, and
/// disposes of removed controllers on its own threads. All methods take
/// `&self`; the manager can be shared across non-realtime threads.
pub struct ControllerManager {
    /// The static model, shared with the realtime half.
    model: Arc<Robot>,

    /// The controller factories spawn requests resolve against.
    registry: ControllerRegistry,

    /// The mutable bookkeeping.
    inner: Mutex<ManagerInner>,
}

impl ControllerManager {
    /// Schedules a pre-built controller under a name.
    ///
    /// This is the programmatic sibling of
    /// [ControllerManager::spawn_controller] for controllers that are
    /// configured in code. The controller must be fully ready to run: the
    /// realtime thread will start calling its update on the next cycle.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name to run the controller under.
    /// * 'controller' - The controller to schedule.
    ///
    /// ## Errors
    ///
    /// * [Error::DuplicateControllerName] - Returned when the name is
    ///   already taken.
    /// * [Error::ControllerCapacityExhausted] - Returned when every slot is
    ///   reserved.
    /// * [Error::RealtimeLoopStopped] - Returned when the realtime half is
    ///   gone or has stopped draining requests; nothing was scheduled.
    pub fn add_controller(
        &self,
        name: &str,
        controller: Box<dyn Controller>,
    ) -> Result<(), Error> {
        let mut inner = self.lock_inner();
        inner.reap();

        if inner
            .names
            .iter()
            .any(|existing| existing.as_deref() == Some(name))
        {
            return Err(Error::DuplicateControllerName {
                name: name.to_string(),
            });
        }

        let slot = inner.names.iter().position(Option::is_none).ok_or(
            Error::ControllerCapacityExhausted {
                capacity: MAX_NUM_CONTROLLERS,
            },
        )?;

        inner.names[slot] = Some(name.to_string());
        if inner
            .requests
            .try_send(Request::Add { slot, controller })
            .is_err()
        {
            inner.names[slot] = None;
            return Err(Error::RealtimeLoopStopped);
        }

        log::debug!("queued controller '{}' for slot {}", name, slot);
        Ok(())
    }

    /// Returns the names of all scheduled controllers, in slot order.
    ///
    /// A name appears here from the moment its spawn is accepted until its
    /// kill is accepted, which can be one cycle ahead of the realtime
    /// table.
    pub fn controller_names(&self) -> Vec<String> {
        let mut inner = self.lock_inner();
        inner.reap();
        inner.names.iter().flatten().cloned().collect()
    }

    /// Returns the registered controller type names, sorted.
    pub fn controller_type_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Takes a controller out of service.
    ///
    /// The name stops being scheduled immediately; the realtime thread
    /// drops the controller from its table on its next cycle and hands it
    /// back, and the manager disposes of it on a later call. The controller
    /// may therefore run at most one more cycle after this returns.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name the controller runs under.
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownController] - Returned when no controller runs
    ///   under the name.
    /// * [Error::RealtimeLoopStopped] - Returned when the realtime half is
    ///   gone or has stopped draining requests; the controller is still
    ///   scheduled.
    pub fn kill_controller(&self, name: &str) -> Result<(), Error> {
        let mut inner = self.lock_inner();
        inner.reap();

        let slot = inner
            .names
            .iter()
            .position(|existing| existing.as_deref() == Some(name))
            .ok_or_else(|| Error::UnknownController {
                name: name.to_string(),
            })?;

        if inner.requests.try_send(Request::Remove { slot }).is_err() {
            return Err(Error::RealtimeLoopStopped);
        }
        inner.names[slot] = None;

        log::info!("killed controller '{}' in slot {}", name, slot);
        Ok(())
    }

    /// Returns the model the controllers run against.
    pub fn model(&self) -> &Robot {
        &self.model
    }

    /// Builds, configures and schedules a controller.
    ///
    /// The factory registered under `type_name` builds the controller, the
    /// controller configures itself against the model from the given XML,
    /// and only a controller that configured successfully is scheduled. The
    /// realtime thread starts calling it on the next cycle.
    ///
    /// ## Parameters
    ///
    /// * 'type_name' - The registered controller type.
    /// * 'name' - The name to run the controller under.
    /// * 'config_xml' - The controller's XML configuration document; its
    ///   root element is handed to [Controller::init].
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownControllerType] - Returned when no factory is
    ///   registered under the type name.
    /// * [Error::DescriptionParse] - Returned when the configuration XML
    ///   does not parse.
    /// * [Error::ControllerInitFailed] - Returned when the controller
    ///   refused its configuration.
    /// * [Error::DuplicateControllerName] /
    ///   [Error::ControllerCapacityExhausted] /
    ///   [Error::RealtimeLoopStopped] - See
    ///   [ControllerManager::add_controller].
    pub fn spawn_controller(
        &self,
        type_name: &str,
        name: &str,
        config_xml: &str,
    ) -> Result<(), Error> {
        let factory = self
            .registry
            .get(type_name)
            .ok_or_else(|| Error::UnknownControllerType {
                type_name: type_name.to_string(),
            })?;

        let package = description::parse(config_xml)?;
        let document = package.as_document();
        let config = description::root_element(&document)?;

        let mut controller = factory();
        controller
            .init(&self.model, config)
            .map_err(|err| Error::ControllerInitFailed {
                name: name.to_string(),
                details: err.to_string(),
            })?;

        self.add_controller(name, controller)?;

        log::info!("spawned controller '{}' of type '{}'", name, type_name);
        Ok(())
    }

    fn lock_inner(&self) -> MutexGuard<'_, ManagerInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}
