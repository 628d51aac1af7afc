/*!
 * Durable Store Traits
 * Backend-agnostic key/value persistence
 */

use crate::core::types::{StoreResult, Value};

/// The persistence layer that survives a global reset
///
/// Every write is visible to the next read; implementations never buffer.
pub trait DurableStore: Send + Sync {
    /// Read the value at `key`, `None` if never written
    fn read(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Overwrite the value at `key`
    fn write(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove `key`; no-op if absent
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// All keys currently present
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Remove every key starting with `prefix`, returning how many went
    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let doomed: Vec<String> = self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        for key in &doomed {
            self.delete(key)?;
        }
        Ok(doomed.len())
    }
}
