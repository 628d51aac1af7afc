/*!
 * Kernel Configuration
 * Tunables with defaults and environment overrides
 */

use super::limits::{
    CYCLE_KEY, DEFAULT_INIT_TYPE, DEFAULT_KEY_PREFIX, DEFAULT_PRIORITY, PID_LIMIT, SCHEDULER_KEY, TABLE_KEY,
};
use super::types::{Pid, Priority};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// PID counter wraps back to 1 once it reaches this value
    pub pid_limit: Pid,
    /// Band assigned to newly added processes
    pub default_priority: Priority,
    /// Type tag of PID 1
    pub init_type: String,
    /// Prefix for kernel-owned durable keys
    pub key_prefix: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            pid_limit: PID_LIMIT,
            default_priority: DEFAULT_PRIORITY,
            init_type: DEFAULT_INIT_TYPE.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl KernelConfig {
    /// Defaults overlaid with environment variables
    ///
    /// Environment variables:
    /// - OSCORE_PID_LIMIT
    /// - OSCORE_DEFAULT_PRIORITY
    /// - OSCORE_INIT_TYPE
    /// - OSCORE_KEY_PREFIX
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(limit) = parse_env::<Pid>("OSCORE_PID_LIMIT") {
            if limit > 1 {
                config.pid_limit = limit;
            } else {
                warn!(limit, "Ignoring OSCORE_PID_LIMIT below 2");
            }
        }
        if let Some(priority) = parse_env::<Priority>("OSCORE_DEFAULT_PRIORITY") {
            config.default_priority = priority;
        }
        if let Ok(init_type) = std::env::var("OSCORE_INIT_TYPE") {
            config.init_type = init_type;
        }
        if let Ok(prefix) = std::env::var("OSCORE_KEY_PREFIX") {
            config.key_prefix = prefix;
        }
        config
    }

    pub fn table_key(&self) -> String {
        format!("{}{}", self.key_prefix, TABLE_KEY)
    }

    pub fn scheduler_key(&self) -> String {
        format!("{}{}", self.key_prefix, SCHEDULER_KEY)
    }

    pub fn cycle_key(&self) -> String {
        format!("{}{}", self.key_prefix, CYCLE_KEY)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
