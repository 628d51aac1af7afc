/*!
 * Process Descriptors
 * Durable identity of a logical process
 */

use crate::core::limits::ARGS_KEY;
use crate::core::types::{Pid, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-process durable memory: `__args` plus process-defined entries
pub type MemoryMap = BTreeMap<String, Value>;

/// Process descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDescriptor {
    pub process_type: String,
    pub pid: Pid,
    pub parent: Pid,
    pub memory: MemoryMap,
}

impl ProcessDescriptor {
    pub fn new(process_type: impl Into<String>, pid: Pid, parent: Pid, args: Vec<Value>) -> Self {
        let mut memory = MemoryMap::new();
        memory.insert(ARGS_KEY.to_string(), Value::Array(args));
        Self {
            process_type: process_type.into(),
            pid,
            parent,
            memory,
        }
    }

    /// Stored construction arguments
    pub fn args(&self) -> Vec<Value> {
        match self.memory.get(ARGS_KEY) {
            Some(Value::Array(args)) => args.clone(),
            _ => Vec::new(),
        }
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            parent: self.parent,
            process_type: self.process_type.clone(),
            args: self.args(),
        }
    }
}

/// Persisted layout: `[type, pid, parent, memory]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedDescriptor(pub String, pub Pid, pub Pid, pub MemoryMap);

impl From<ProcessDescriptor> for PackedDescriptor {
    fn from(d: ProcessDescriptor) -> Self {
        PackedDescriptor(d.process_type, d.pid, d.parent, d.memory)
    }
}

impl From<PackedDescriptor> for ProcessDescriptor {
    fn from(PackedDescriptor(process_type, pid, parent, memory): PackedDescriptor) -> Self {
        Self {
            process_type,
            pid,
            parent,
            memory,
        }
    }
}

/// Read-only process summary handed to threads and introspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub parent: Pid,
    pub process_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}
