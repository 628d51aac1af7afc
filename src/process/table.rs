/*!
 * Process Table
 * Durable map from PID to process descriptor
 */

use super::descriptor::{MemoryMap, PackedDescriptor, ProcessDescriptor};
use crate::core::errors::KernelError;
use crate::core::types::{KernelResult, Pid};
use crate::store::{DataHandle, DurableStore};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Persisted table shape; PIDs serialize as stringified keys
pub type TableMap = BTreeMap<Pid, PackedDescriptor>;

/// Process table
///
/// Every mutation is written straight through to the durable store. The
/// table validates nothing beyond presence: parent checks and cascading
/// belong to the kernel.
#[derive(Clone)]
pub struct ProcessTable {
    store: Arc<dyn DurableStore>,
    handle: DataHandle<TableMap>,
}

impl ProcessTable {
    pub fn new(store: Arc<dyn DurableStore>, key: impl Into<String>) -> Self {
        let handle = DataHandle::new(Arc::clone(&store), key, TableMap::new());
        Self { store, handle }
    }

    /// Store backing the table and per-process data handles
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    pub fn get(&self, pid: Pid) -> KernelResult<ProcessDescriptor> {
        self.find(pid)?.ok_or(KernelError::NotFound(pid))
    }

    pub fn find(&self, pid: Pid) -> KernelResult<Option<ProcessDescriptor>> {
        Ok(self.handle.get()?.remove(&pid).map(ProcessDescriptor::from))
    }

    pub fn contains(&self, pid: Pid) -> KernelResult<bool> {
        Ok(self.handle.get()?.contains_key(&pid))
    }

    /// Insert or overwrite
    pub fn set(&self, descriptor: ProcessDescriptor) -> KernelResult<()> {
        self.handle
            .update(|table| table.insert(descriptor.pid, descriptor.into()))?;
        Ok(())
    }

    /// Delete one entry, returning whether it existed
    pub fn remove(&self, pid: Pid) -> KernelResult<bool> {
        Ok(self.handle.update(|table| table.remove(&pid).is_some())?)
    }

    /// Delete several entries in a single write
    pub fn remove_all(&self, pids: &[Pid]) -> KernelResult<usize> {
        Ok(self.handle.update(|table| {
            pids.iter()
                .filter(|pid| table.remove(pid).is_some())
                .count()
        })?)
    }

    pub fn clear(&self) -> KernelResult<()> {
        self.handle.set(&TableMap::new())?;
        Ok(())
    }

    /// All PIDs, ascending
    pub fn pids(&self) -> KernelResult<Vec<Pid>> {
        Ok(self.handle.get()?.into_keys().collect())
    }

    pub fn len(&self) -> KernelResult<usize> {
        Ok(self.handle.get()?.len())
    }

    pub fn is_empty(&self) -> KernelResult<bool> {
        Ok(self.len()? == 0)
    }

    /// All descriptors, ascending by PID
    pub fn descriptors(&self) -> KernelResult<Vec<ProcessDescriptor>> {
        Ok(self
            .handle
            .get()?
            .into_values()
            .map(ProcessDescriptor::from)
            .collect())
    }

    /// Entries whose parent is `pid`, excluding `pid` itself
    ///
    /// The root is its own parent, so it never shows up as its own child.
    pub fn children(&self, pid: Pid) -> KernelResult<Vec<ProcessDescriptor>> {
        Ok(self
            .descriptors()?
            .into_iter()
            .filter(|d| d.parent == pid && d.pid != pid)
            .collect())
    }

    /// Mutate one process's memory map in place
    pub fn update_memory<R>(
        &self,
        pid: Pid,
        f: impl FnOnce(&mut MemoryMap) -> R,
    ) -> KernelResult<R> {
        self.handle
            .update(|table| table.get_mut(&pid).map(|packed| f(&mut packed.3)))?
            .ok_or(KernelError::NotFound(pid))
    }

    /// Raw copy of the persisted table
    pub fn snapshot(&self) -> KernelResult<TableMap> {
        Ok(self.handle.get()?)
    }
}

impl fmt::Debug for ProcessTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessTable")
            .field("key", &self.handle.key())
            .finish()
    }
}
