/*!
 * Threads
 * Resumable state machines that process bodies compile down to
 */

use crate::core::types::ThreadResult;
use crate::syscalls::{Syscall, SyscallResult};

/// Outcome of one resumption
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Ordinary suspend point; run again next cycle
    Yield,
    /// Request handled by the kernel
    Call(Syscall),
    /// Body finished; the process is removed
    Complete,
}

/// Resumable computation behind a process
///
/// `input` carries the response to the syscall yielded by the previous
/// resumption, and is `None` on the first resumption of a cycle. Returning
/// `Err(ThreadError::Exit)` terminates cleanly; any other error or a panic
/// is a fault. Either way the process and its descendants are killed.
pub trait Thread: Send {
    fn resume(&mut self, input: Option<SyscallResult>) -> ThreadResult<Step>;
}

/// Thread backed by a closure
pub struct FnThread<F>(F);

impl<F> Thread for FnThread<F>
where
    F: FnMut(Option<SyscallResult>) -> ThreadResult<Step> + Send,
{
    fn resume(&mut self, input: Option<SyscallResult>) -> ThreadResult<Step> {
        (self.0)(input)
    }
}

/// Box a closure as a thread
pub fn from_fn<F>(f: F) -> Box<dyn Thread>
where
    F: FnMut(Option<SyscallResult>) -> ThreadResult<Step> + Send + 'static,
{
    Box::new(FnThread(f))
}
