/*!
 * Syscall Types
 * Requests a thread yields to the kernel and the responses it gets back
 */

use crate::core::limits::HIBERNATE_TICKS;
use crate::core::types::{Pid, Priority, Tick, Value};
use crate::process::{ProcessInfo, ProcessMemory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured request yielded by a thread
///
/// Everything except `Sleep` is handled synchronously and the thread is
/// resumed in the same scheduling slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "syscall")]
pub enum Syscall {
    /// Suspend for at least `ticks` cycles
    Sleep { ticks: Tick },

    /// Create a child process
    Fork {
        process_type: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<Value>,
    },

    /// Kill a direct child (and its descendants)
    Kill { pid: Pid },

    /// Obtain the caller's own durable memory
    Allocate,

    /// List direct children
    Children,

    /// Move the caller to another priority band
    Priority { priority: Priority },
}

impl Syscall {
    pub fn sleep(ticks: Tick) -> Self {
        Self::Sleep { ticks }
    }

    /// Sleep that never wakes up on its own
    pub fn hibernate() -> Self {
        Self::Sleep {
            ticks: HIBERNATE_TICKS,
        }
    }

    pub fn fork(process_type: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Fork {
            process_type: process_type.into(),
            args,
        }
    }

    pub fn kill(pid: Pid) -> Self {
        Self::Kill { pid }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sleep { .. } => "sleep",
            Self::Fork { .. } => "fork",
            Self::Kill { .. } => "kill",
            Self::Allocate => "allocate",
            Self::Children => "children",
            Self::Priority { .. } => "priority",
        }
    }
}

/// Response handed to the thread on its next resumption
#[derive(Debug, Clone)]
pub enum SyscallResult {
    Fork { pid: Pid },
    /// `killed` is false when the target was not a direct child
    Kill { killed: bool },
    Allocate { memory: ProcessMemory },
    Children { children: BTreeMap<Pid, ProcessInfo> },
    Priority { applied: bool },
}

impl SyscallResult {
    /// Child PID of a fork response
    pub fn forked_pid(&self) -> Option<Pid> {
        match self {
            Self::Fork { pid } => Some(*pid),
            _ => None,
        }
    }

    pub fn into_memory(self) -> Option<ProcessMemory> {
        match self {
            Self::Allocate { memory } => Some(memory),
            _ => None,
        }
    }

    pub fn into_children(self) -> Option<BTreeMap<Pid, ProcessInfo>> {
        match self {
            Self::Children { children } => Some(children),
            _ => None,
        }
    }
}
