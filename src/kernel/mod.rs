/*!
 * Kernel
 * Process lifecycle, syscall interpretation and the per-cycle run loop
 */

use crate::core::config::KernelConfig;
use crate::core::types::{KernelResult, Pid, Tick};
use crate::monitoring::KernelLogger;
use crate::process::{ProcessDescriptor, ProcessInfo, ProcessTable, Registry, Thread};
use crate::scheduler::{ManualClock, Quota, Scheduler};
use crate::store::DataHandle;
use ahash::AHashMap;
use std::sync::Arc;

mod builder;
mod dispatch;
mod lifecycle;
mod ps;
mod stats;

pub use builder::KernelBuilder;
pub use stats::CycleStats;

/// Cycle counter used when the host supplies no clock
struct CycleCounter {
    clock: Arc<ManualClock>,
    handle: DataHandle<Tick>,
}

/// Cooperative microkernel
///
/// The process table is durable and is the source of truth; threads and
/// scheduler bookkeeping are rebuilt from it whenever a kernel is built.
pub struct Kernel {
    config: KernelConfig,
    table: ProcessTable,
    threads: AHashMap<Pid, Box<dyn Thread>>,
    registry: Registry,
    scheduler: Box<dyn Scheduler>,
    logger: Arc<dyn KernelLogger>,
    quota: Arc<dyn Quota>,
    counter: Option<CycleCounter>,
    pid_count: Pid,
}

impl Kernel {
    /// Create a builder over the given durable store
    pub fn builder(store: Arc<dyn crate::store::DurableStore>) -> KernelBuilder {
        KernelBuilder::new(store)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    /// Remaining compute budget reported by the quota source
    pub fn quota(&self) -> f64 {
        self.quota.remaining()
    }

    /// PIDs in the process table, ascending
    pub fn pids(&self) -> KernelResult<Vec<Pid>> {
        self.table.pids()
    }

    pub fn contains(&self, pid: Pid) -> KernelResult<bool> {
        self.table.contains(pid)
    }

    pub fn descriptor(&self, pid: Pid) -> KernelResult<ProcessDescriptor> {
        self.table.get(pid)
    }

    /// Every process, ascending by PID
    pub fn processes(&self) -> KernelResult<Vec<ProcessInfo>> {
        Ok(self
            .table
            .descriptors()?
            .iter()
            .map(ProcessDescriptor::info)
            .collect())
    }

    /// Number of live in-memory threads
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn has_thread(&self, pid: Pid) -> bool {
        self.threads.contains_key(&pid)
    }
}
