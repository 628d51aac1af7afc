/*!
 * Kernel Limits and Constants
 *
 * Reserved identities, durable key layout and allocator bounds.
 */

use super::types::{Pid, Priority, Tick};

// =============================================================================
// RESERVED PROCESSES
// =============================================================================

/// Root supervisor; killing it means reboot
pub const ROOT_PID: Pid = 0;

/// Primary process created right after a reboot
pub const INIT_PID: Pid = 1;

/// Type tag of the built-in root supervisor body
pub const ROOT_TYPE: &str = "tron";

/// Default type tag of the primary process
pub const DEFAULT_INIT_TYPE: &str = "init";

// =============================================================================
// PID ALLOCATION
// =============================================================================

/// Upper bound of the rolling PID counter; allocation wraps back to 1 past it
pub const PID_LIMIT: Pid = 50_000;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Band for processes that never asked to be reclassified
pub const DEFAULT_PRIORITY: Priority = 5;

/// Sleep length used for "suspend indefinitely"
pub const HIBERNATE_TICKS: Tick = Tick::MAX;

// =============================================================================
// DURABLE LAYOUT
// =============================================================================

/// Reserved process memory key holding the construction arguments
pub const ARGS_KEY: &str = "__args";

/// Prefix applied to every kernel-owned store key
pub const DEFAULT_KEY_PREFIX: &str = "kernel:";

/// Process table key (after the kernel prefix)
pub const TABLE_KEY: &str = "processTable";

/// Scheduler state key (after the kernel prefix)
pub const SCHEDULER_KEY: &str = "scheduler";

/// Kernel-owned cycle counter key (after the kernel prefix)
pub const CYCLE_KEY: &str = "cycle";

/// Prefix of per-process data handle keys
pub const PROCESS_KEY_PREFIX: &str = "process:";

/// Store key for a named per-process data handle
pub fn process_key(pid: Pid, name: &str) -> String {
    format!("{}{}:{}", PROCESS_KEY_PREFIX, pid, name)
}

/// Store key prefix covering every data handle owned by `pid`
pub fn process_key_scope(pid: Pid) -> String {
    format!("{}{}:", PROCESS_KEY_PREFIX, pid)
}
