/*!
 * Process Module
 * Descriptors, the durable process table, and process bodies
 */

pub mod descriptor;
pub mod memory;
pub mod registry;
pub(crate) mod root;
pub mod table;
pub mod thread;

// Re-export for convenience
pub use descriptor::{MemoryMap, PackedDescriptor, ProcessDescriptor, ProcessInfo};
pub use memory::ProcessMemory;
pub use registry::Registry;
pub use table::{ProcessTable, TableMap};
pub use thread::{from_fn, FnThread, Step, Thread};
