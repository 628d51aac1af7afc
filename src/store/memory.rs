/*!
 * In-Memory Store
 * Durable store backed by a locked map
 */

use super::traits::DurableStore;
use crate::core::types::{StoreResult, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Map-backed store
///
/// `snapshot` + `from_snapshot` model a global reset: every in-memory
/// structure is dropped and only the durable map is carried over.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(data: BTreeMap<String, Value>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Copy of the full durable contents
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.data.read().clone()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl DurableStore for MemoryStore {
    fn read(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|key, _| !key.starts_with(prefix));
        Ok(before - data.len())
    }
}
