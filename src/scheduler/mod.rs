/*!
 * Scheduler Module
 * Cooperative scheduling abstraction and the priority policy
 */

pub mod clock;
pub mod priority;
pub mod traits;

// Re-export public API
pub use clock::{Clock, ManualClock, Quota, Unlimited};
pub use priority::{PriorityScheduler, SchedulerState, SchedulerStats};
pub use traits::{Scheduler, SleepHint, ThreadReturn};
