/*!
 * Durable Handle
 * Typed accessor bound to one key in the durable store
 */

use super::traits::DurableStore;
use crate::core::errors::StoreError;
use crate::core::types::StoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Typed view of a single durable key
///
/// The handle holds no cached value: every `get` goes to the store, so two
/// handles on the same key always agree.
pub struct DataHandle<T> {
    store: Arc<dyn DurableStore>,
    key: String,
    default: T,
}

impl<T> DataHandle<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: Arc<dyn DurableStore>, key: impl Into<String>, default: T) -> Self {
        Self {
            store,
            key: key.into(),
            default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current persisted value
    ///
    /// An absent key is initialized with the default, so later reads see a
    /// stable value even if the default changes.
    pub fn get(&self) -> StoreResult<T> {
        match self.store.read(&self.key)? {
            Some(raw) => serde_json::from_value(raw).map_err(|e| StoreError::Corrupt {
                key: self.key.clone(),
                reason: e.to_string(),
            }),
            None => {
                let value = self.default.clone();
                self.set(&value)?;
                Ok(value)
            }
        }
    }

    pub fn set(&self, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_value(value)?;
        self.store.write(&self.key, raw)
    }

    /// Read-modify-write in one call
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> StoreResult<R> {
        let mut value = self.get()?;
        let result = f(&mut value);
        self.set(&value)?;
        Ok(result)
    }

    /// Whether the key has ever been written
    pub fn exists(&self) -> StoreResult<bool> {
        Ok(self.store.read(&self.key)?.is_some())
    }

    pub fn clear(&self) -> StoreResult<()> {
        self.store.delete(&self.key)
    }
}

impl<T: Clone> Clone for DataHandle<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T> fmt::Debug for DataHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataHandle").field("key", &self.key).finish()
    }
}
