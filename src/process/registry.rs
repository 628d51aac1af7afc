/*!
 * Process Registry
 * Maps type tags to thread factories
 */

use super::thread::Thread;
use crate::core::errors::{KernelError, RegistryError};
use crate::core::limits::ROOT_TYPE;
use crate::core::types::{KernelResult, Pid, Value};
use ahash::AHashMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Factory = Arc<dyn Fn(&[Value]) -> Result<Box<dyn Thread>, String> + Send + Sync>;

/// Closed set of process bodies the kernel can instantiate
///
/// Tags are validated when registered; lookups only fail for tags that
/// were never registered (e.g. a stale table entry after a deploy).
#[derive(Clone, Default)]
pub struct Registry {
    factories: AHashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory receiving the raw stored arguments
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&[Value]) -> Box<dyn Thread> + Send + Sync + 'static,
    {
        self.insert(tag.into(), Arc::new(move |args| Ok(factory(args))))
    }

    /// Register a factory whose arguments are decoded into `A`
    ///
    /// The stored argument array is deserialized as a sequence, so `A` is
    /// typically a tuple: `(u32, String)` accepts `[1, "x"]`.
    pub fn register_typed<A, F>(&mut self, tag: impl Into<String>, factory: F) -> Result<&mut Self, RegistryError>
    where
        A: DeserializeOwned,
        F: Fn(A) -> Box<dyn Thread> + Send + Sync + 'static,
    {
        self.insert(
            tag.into(),
            Arc::new(move |args| {
                let decoded = serde_json::from_value::<A>(Value::Array(args.to_vec()))
                    .map_err(|e| e.to_string())?;
                Ok(factory(decoded))
            }),
        )
    }

    fn insert(&mut self, tag: String, factory: Factory) -> Result<&mut Self, RegistryError> {
        if tag == ROOT_TYPE {
            return Err(RegistryError::Reserved(tag));
        }
        if self.factories.contains_key(&tag) {
            return Err(RegistryError::Duplicate(tag));
        }
        debug!(process_type = %tag, "Registered process type");
        self.factories.insert(tag, factory);
        Ok(self)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Instantiate the body for `tag` on behalf of `pid`
    pub fn spawn(&self, pid: Pid, tag: &str, args: &[Value]) -> KernelResult<Box<dyn Thread>> {
        let factory = self
            .factories
            .get(tag)
            .ok_or_else(|| KernelError::UnregisteredType {
                pid,
                process_type: tag.to_string(),
            })?;
        factory(args).map_err(|reason| KernelError::InvalidArgs {
            pid,
            process_type: tag.to_string(),
            reason,
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types())
            .finish()
    }
}
