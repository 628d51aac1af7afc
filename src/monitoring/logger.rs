/*!
 * Kernel Logger
 * Sink for kernel-level events that hosts may want to route elsewhere
 */

use crate::core::errors::KernelError;
use crate::process::ProcessInfo;
use tracing::{error, info, warn};

/// Receives lifecycle events, faults and exits observed by the kernel
///
/// Implementations must not panic; the kernel calls them from inside the
/// run loop.
pub trait KernelLogger: Send + Sync {
    /// Routine lifecycle events: reboot, fork, kill
    fn on_info(&self, message: &str);

    /// Recoverable anomalies, such as a table without its root
    fn on_warn(&self, message: &str);

    /// Recovered failures: unknown types, rejected arguments, table desync
    fn on_error(&self, message: &str);

    /// Critical condition; raised when something tries to kill the root
    fn on_alert(&self, message: &str);

    /// A process exited on purpose
    fn on_thread_exit(&self, process: &ProcessInfo, reason: &str);

    /// A process faulted and was killed
    fn on_thread_error(&self, process: &ProcessInfo, error: &KernelError);
}

/// Default logger emitting `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl KernelLogger for TracingLogger {
    fn on_info(&self, message: &str) {
        info!("{}", message);
    }

    fn on_warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn on_error(&self, message: &str) {
        error!("{}", message);
    }

    fn on_alert(&self, message: &str) {
        error!(alert = true, "{}", message);
    }

    fn on_thread_exit(&self, process: &ProcessInfo, reason: &str) {
        info!(
            pid = process.pid,
            process_type = %process.process_type,
            reason,
            "Process exited"
        );
    }

    fn on_thread_error(&self, process: &ProcessInfo, err: &KernelError) {
        error!(
            pid = process.pid,
            process_type = %process.process_type,
            error = %err,
            "Process errored"
        );
    }
}
