/*!
 * Cycle Statistics
 */

use serde::Serialize;

/// Counters for one `run()` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CycleStats {
    /// Scheduling slots handed out
    pub threads_run: u32,
    /// Syscalls interpreted, sleeps included
    pub syscalls: u32,
    /// Processes that exited on purpose or completed
    pub exits: u32,
    /// Processes killed for faulting
    pub faults: u32,
    pub elapsed_micros: u64,
    /// Quota reported at the end of the cycle; advisory only
    pub quota_remaining: f64,
}

impl CycleStats {
    /// Whether any process left the table this cycle
    #[inline]
    pub fn had_terminations(&self) -> bool {
        self.exits + self.faults > 0
    }
}
