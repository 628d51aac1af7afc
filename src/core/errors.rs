/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use super::types::Pid;
use miette::Diagnostic;
use thiserror::Error;

/// Kernel errors
///
/// Thread-level variants (`UnregisteredType`, `InvalidArgs`, `TaskFault`,
/// `CleanExit`, `MissingThread`) are recovered inside the run loop by killing
/// the offending PID. Table and store variants propagate to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum KernelError {
    #[error("Process {0} not found")]
    #[diagnostic(
        code(kernel::not_found),
        help("The process table no longer holds this PID. The table may be corrupt.")
    )]
    NotFound(Pid),

    #[error("PID already occupied: {0}")]
    #[diagnostic(
        code(kernel::duplicate_pid),
        help("The PID allocator handed out a live PID. This is an allocator bug.")
    )]
    DuplicatePid(Pid),

    #[error("No free PID below {0}")]
    #[diagnostic(
        code(kernel::pid_exhausted),
        help("Every PID up to the configured limit is live. Kill processes or raise pid_limit.")
    )]
    PidExhausted(Pid),

    #[error("Process {pid} has unknown type '{process_type}'")]
    #[diagnostic(
        code(kernel::unregistered_type),
        help("Register the type tag before the kernel is built.")
    )]
    UnregisteredType { pid: Pid, process_type: String },

    #[error("Process {pid} of type '{process_type}' rejected its arguments: {reason}")]
    #[diagnostic(
        code(kernel::invalid_args),
        help("Stored arguments no longer match the registered factory signature.")
    )]
    InvalidArgs {
        pid: Pid,
        process_type: String,
        reason: String,
    },

    #[error("Process {pid} faulted: {message}")]
    #[diagnostic(code(kernel::task_fault))]
    TaskFault { pid: Pid, message: String },

    #[error("Process {pid} exited: {reason}")]
    #[diagnostic(code(kernel::clean_exit))]
    CleanExit { pid: Pid, reason: String },

    #[error("Process {0} has no thread")]
    #[diagnostic(
        code(kernel::missing_thread),
        help("The in-memory thread map is out of sync with the process table.")
    )]
    MissingThread(Pid),

    #[error("Memory key '{0}' is reserved")]
    #[diagnostic(code(kernel::reserved_key))]
    ReservedKey(String),

    #[error("Durable store failure: {0}")]
    #[diagnostic(code(kernel::store))]
    Store(#[from] StoreError),
}

/// Durable store errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum StoreError {
    #[error("Serialization failed: {0}")]
    #[diagnostic(code(store::serialization))]
    Serialization(String),

    #[error("I/O failed: {0}")]
    #[diagnostic(
        code(store::io),
        help("Check that the store path exists and is writable.")
    )]
    Io(String),

    #[error("Value at '{key}' is corrupt: {reason}")]
    #[diagnostic(code(store::corrupt))]
    Corrupt { key: String, reason: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Registry errors, raised at registration time
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum RegistryError {
    #[error("Process type '{0}' is already registered")]
    #[diagnostic(code(registry::duplicate))]
    Duplicate(String),

    #[error("Process type '{0}' is reserved by the kernel")]
    #[diagnostic(code(registry::reserved))]
    Reserved(String),
}

/// Errors a process body returns from `resume`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// Intentional termination
    #[error("exit: {0}")]
    Exit(String),

    #[error("fault: {0}")]
    Fault(String),
}

impl ThreadError {
    pub fn exit(reason: impl Into<String>) -> Self {
        Self::Exit(reason.into())
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }
}

// Bodies use `?` on memory and handle operations
impl From<KernelError> for ThreadError {
    fn from(err: KernelError) -> Self {
        ThreadError::Fault(err.to_string())
    }
}

impl From<StoreError> for ThreadError {
    fn from(err: StoreError) -> Self {
        ThreadError::Fault(err.to_string())
    }
}
