/*!
 * Process Memory
 * A process's own durable memory, handed out by the allocate syscall
 */

use super::table::ProcessTable;
use crate::core::errors::{KernelError, StoreError};
use crate::core::limits::{process_key, ARGS_KEY};
use crate::core::types::{KernelResult, Pid, Value};
use crate::store::DataHandle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Pointer into the memory map of one process descriptor
///
/// Reads and writes go straight to the process table, so values survive a
/// global reset.
#[derive(Debug, Clone)]
pub struct ProcessMemory {
    table: ProcessTable,
    pid: Pid,
}

impl ProcessMemory {
    pub(crate) fn new(table: ProcessTable, pid: Pid) -> Self {
        Self { table, pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Construction arguments
    pub fn args(&self) -> KernelResult<Vec<Value>> {
        Ok(self.table.get(self.pid)?.args())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> KernelResult<Option<T>> {
        let descriptor = self.table.get(self.pid)?;
        descriptor
            .memory
            .get(key)
            .cloned()
            .map(|raw| {
                serde_json::from_value(raw).map_err(|e| {
                    KernelError::Store(StoreError::Corrupt {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })
                })
            })
            .transpose()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> KernelResult<()> {
        if key == ARGS_KEY {
            return Err(KernelError::ReservedKey(key.to_string()));
        }
        let raw = serde_json::to_value(value).map_err(StoreError::from)?;
        self.table.update_memory(self.pid, |memory| {
            memory.insert(key.to_string(), raw);
        })
    }

    pub fn remove(&self, key: &str) -> KernelResult<bool> {
        if key == ARGS_KEY {
            return Err(KernelError::ReservedKey(key.to_string()));
        }
        self.table
            .update_memory(self.pid, |memory| memory.remove(key).is_some())
    }

    /// Process-defined keys, excluding `__args`
    pub fn keys(&self) -> KernelResult<Vec<String>> {
        Ok(self
            .table
            .get(self.pid)?
            .memory
            .into_keys()
            .filter(|key| key != ARGS_KEY)
            .collect())
    }

    /// Typed handle to a separate durable key owned by this process
    ///
    /// The store key is recorded under `name` in the memory map so the
    /// pointer itself is durable. The key is deleted when the process dies.
    pub fn handle<T>(&self, name: &str, default: T) -> KernelResult<DataHandle<T>>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let key = process_key(self.pid, name);
        self.set(name, &key)?;
        Ok(DataHandle::new(Arc::clone(self.table.store()), key, default))
    }
}
