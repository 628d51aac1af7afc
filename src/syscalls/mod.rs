/*!
 * Syscalls Module
 * Kernel request/response surface for threads
 */

pub mod types;

pub use types::{Syscall, SyscallResult};
