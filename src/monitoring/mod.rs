/*!
 * Monitoring Module
 * Tracing setup and the kernel logger sink
 */

pub mod logger;
pub mod tracer;

pub use logger::{KernelLogger, TracingLogger};
pub use tracer::init_tracing;
