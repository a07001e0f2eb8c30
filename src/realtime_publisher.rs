use std::sync::{Arc, Mutex, TryLockError};

use crate::joint::JointState;
use crate::robot::Robot;

#[cfg(test)]
#[path = "realtime_publisher_tests.rs"]
mod realtime_publisher_tests;

/// A single-slot mailbox carrying values off the realtime thread.
///
/// The realtime side calls [RealtimePublisher::publish] each cycle. The call
/// tries the lock and walks away when a reader holds it, so it never blocks;
/// a cycle whose value could not be placed is simply not observed. The value
/// is written with `clone_from`, so a slot type that reuses its buffers
/// (such as a `Vec` that is always the same length) settles into
/// allocation-free publishing after the first write.
///
/// Readers run on non-realtime threads and take the lock outright.
///
/// Handles are cheap clones sharing one slot; keep one on each side.
pub struct RealtimePublisher<T> {
    /// The shared slot.
    mailbox: Arc<Mutex<T>>,
}

impl<T: Clone> RealtimePublisher<T> {
    /// Returns a copy of the most recently published value.
    ///
    /// Blocks briefly when the publisher is mid-write; safe on any
    /// non-realtime thread.
    pub fn latest(&self) -> T {
        self.mailbox
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    /// Creates a publisher whose slot starts at the given value.
    ///
    /// ## Parameters
    ///
    /// * 'initial' - The value readers see before the first publish.
    pub fn new(initial: T) -> Self {
        Self {
            mailbox: Arc::new(Mutex::new(initial)),
        }
    }

    /// Places a value in the slot unless a reader currently holds it.
    ///
    /// Returns true when the value was placed. A false return means a
    /// reader was mid-copy and this cycle's value was skipped; the caller
    /// publishes again next cycle, so no special handling is needed.
    ///
    /// ## Parameters
    ///
    /// * 'value' - The value to place.
    #[cfg_attr(test, mutants::skip)] // Cannot easily check mutations as readers poll for the written value
    pub fn publish(&self, value: &T) -> bool {
        let mut slot = match self.mailbox.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(err)) => err.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        slot.clone_from(value);
        true
    }
}

impl<T> Clone for RealtimePublisher<T> {
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

/// A copy of the whole mechanism's joint state at one instant.
///
/// This is the value the realtime loop publishes for monitoring: the
/// hardware clock and one [JointState] per model joint, in model order.
/// Build it with [MechanismSnapshot::for_robot] so the joint vector is
/// already the right size and recording never allocates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MechanismSnapshot {
    /// The hardware clock at the instant of the snapshot, in seconds.
    pub time: f64,

    /// The joint states, index-parallel with the model's joints.
    pub joints: Vec<JointState>,
}

impl MechanismSnapshot {
    /// Creates a snapshot sized for a model, zeroed.
    ///
    /// ## Parameters
    ///
    /// * 'model' - The model whose joints the snapshot will mirror.
    pub fn for_robot(model: &Robot) -> Self {
        Self {
            time: 0.0,
            joints: vec![JointState::new(); model.joints().len()],
        }
    }

    /// Overwrites the snapshot with the given instant.
    ///
    /// Resizes only when the joint count changed, so a snapshot built with
    /// [MechanismSnapshot::for_robot] records without allocating.
    ///
    /// ## Parameters
    ///
    /// * 'time' - The hardware clock, in seconds.
    /// * 'joint_states' - The joint states to copy in.
    pub fn record(&mut self, time: f64, joint_states: &[JointState]) {
        self.time = time;
        self.joints.resize(joint_states.len(), JointState::new());
        self.joints.copy_from_slice(joint_states);
    }
}
