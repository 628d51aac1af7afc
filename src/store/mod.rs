/*!
 * Durable Store Module
 * Persistence that bridges ephemeral cycles
 */

pub mod file;
pub mod handle;
pub mod memory;
pub mod traits;

// Re-export public API
pub use file::JsonFileStore;
pub use handle::DataHandle;
pub use memory::MemoryStore;
pub use traits::DurableStore;
