/*!
 * Core Types
 * Common types used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Cycle counter supplied by the host clock
pub type Tick = u64;

/// Priority band (0-255, higher is offered first)
pub type Priority = u8;

/// Untyped persisted value, as stored in the durable store
pub type Value = serde_json::Value;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Result type for durable store operations
pub type StoreResult<T> = Result<T, super::errors::StoreError>;

/// Result type returned by process bodies
pub type ThreadResult<T> = Result<T, super::errors::ThreadError>;
