/*!
 * OS Core Library
 * Cooperative tick-driven microkernel with a durable process table
 */

pub mod core;
pub mod kernel;
pub mod monitoring;
pub mod process;
pub mod scheduler;
pub mod store;
pub mod syscalls;

// Re-exports
pub use crate::core::*;
pub use kernel::{CycleStats, Kernel, KernelBuilder};
pub use monitoring::{init_tracing, KernelLogger, TracingLogger};
pub use process::{
    from_fn, ProcessDescriptor, ProcessInfo, ProcessMemory, Registry, Step, Thread,
};
pub use scheduler::{
    Clock, ManualClock, PriorityScheduler, Quota, Scheduler, SleepHint, ThreadReturn, Unlimited,
};
pub use store::{DataHandle, DurableStore, JsonFileStore, MemoryStore};
pub use syscalls::{Syscall, SyscallResult};
