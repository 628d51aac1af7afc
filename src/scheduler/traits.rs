/*!
 * Scheduler Traits
 * Interface between the kernel run loop and a scheduling policy
 */

use crate::core::errors::StoreError;
use crate::core::types::{Pid, Priority, Tick};
use serde::{Deserialize, Serialize};

/// Directive returned by a thread that asked to sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepHint {
    pub ticks: Tick,
}

/// What the kernel feeds back after running the last offered PID
///
/// `None` means the process is runnable again next cycle.
pub type ThreadReturn = Option<SleepHint>;

/// Cooperative scheduling policy
///
/// A cycle is driven as `start_cycle()` followed by repeated
/// `next(previous)` calls until it returns `None`. `previous` is the
/// return value of the PID handed out by the preceding `next` call.
pub trait Scheduler: Send {
    /// Register a runnable PID; already registered PIDs are left untouched
    fn add(&mut self, pid: Pid);

    /// Unregister a PID; no-op if absent
    fn remove(&mut self, pid: Pid);

    fn contains(&self, pid: Pid) -> bool;

    /// Every registered PID, ascending
    fn pids(&self) -> Vec<Pid>;

    /// Restart the per-cycle sequence
    fn start_cycle(&mut self);

    /// Next PID to run this cycle, or `None` when the cycle is exhausted
    fn next(&mut self, previous: ThreadReturn) -> Option<Pid>;

    /// Move a PID to another band, returning whether it was applied
    fn reclassify(&mut self, _pid: Pid, _priority: Priority) -> bool {
        false
    }

    /// Clear a pending sleep so the PID is offered again this cycle
    fn wake(&mut self, _pid: Pid) -> bool {
        false
    }

    /// First persistence failure since the last call, if any
    ///
    /// The kernel polls this after every slot and fails the cycle with it.
    fn take_error(&mut self) -> Option<StoreError> {
        None
    }

    fn len(&self) -> usize {
        self.pids().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
