/*!
 * JSON File Store
 * Write-through durable store persisted as a single JSON document
 */

use super::traits::DurableStore;
use crate::core::errors::StoreError;
use crate::core::types::{StoreResult, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed store
///
/// The whole map is rewritten on every mutation through a temp file and a
/// rename, so a crash leaves either the old or the new document. Memory is
/// only updated once the document is on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing contents if present
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = fs::read(&path)?;
            if raw.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
                    key: path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            BTreeMap::new()
        };

        info!(path = %path.display(), keys = data.len(), "Opened durable store");
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, data: &BTreeMap<String, Value>) -> StoreResult<()> {
        let bytes = serde_json::to_vec(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Flushed durable store");
        Ok(())
    }
}

impl DurableStore for JsonFileStore {
    fn read(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut data = self.data.write();
        let mut next = data.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        *data = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut data = self.data.write();
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut next = data.clone();
        next.remove(key);
        self.flush(&next)?;
        *data = next;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut data = self.data.write();
        let mut next = data.clone();
        next.retain(|key, _| !key.starts_with(prefix));
        let removed = data.len() - next.len();
        if removed > 0 {
            self.flush(&next)?;
            *data = next;
        }
        Ok(removed)
    }
}
