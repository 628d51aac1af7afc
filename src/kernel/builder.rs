/*!
 * Kernel Builder
 * Assembles a kernel from its collaborators and restores its state
 */

use super::{CycleCounter, Kernel};
use crate::core::config::KernelConfig;
use crate::core::types::{KernelResult, Tick};
use crate::monitoring::{KernelLogger, TracingLogger};
use crate::process::{ProcessTable, Registry};
use crate::scheduler::{
    Clock, ManualClock, PriorityScheduler, Quota, Scheduler, SchedulerState, Unlimited,
};
use crate::store::{DataHandle, DurableStore};
use ahash::AHashMap;
use std::sync::Arc;
use tracing::info;

/// Builder for Kernel
pub struct KernelBuilder {
    store: Arc<dyn DurableStore>,
    config: KernelConfig,
    registry: Registry,
    scheduler: Option<Box<dyn Scheduler>>,
    clock: Option<Arc<dyn Clock>>,
    logger: Arc<dyn KernelLogger>,
    quota: Arc<dyn Quota>,
}

impl KernelBuilder {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            store,
            config: KernelConfig::default(),
            registry: Registry::new(),
            scheduler: None,
            clock: None,
            logger: Arc::new(TracingLogger),
            quota: Arc::new(Unlimited),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Process bodies available to `fork` and to reconstruction
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the default persisted priority scheduler
    pub fn with_scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Clock for the default scheduler's sleep arithmetic
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn KernelLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_quota(mut self, quota: Arc<dyn Quota>) -> Self {
        self.quota = quota;
        self
    }

    /// Build the kernel, rebooting if the root process is missing and
    /// otherwise rebuilding every thread from the table
    pub fn build(self) -> KernelResult<Kernel> {
        let mut counter = None;
        let custom_scheduler = self.scheduler.is_some();
        let scheduler: Box<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => {
                let clock: Arc<dyn Clock> = match self.clock {
                    Some(clock) => clock,
                    None => {
                        let handle = DataHandle::new(
                            Arc::clone(&self.store),
                            self.config.cycle_key(),
                            0 as Tick,
                        );
                        let manual = Arc::new(ManualClock::new(handle.get()?));
                        counter = Some(CycleCounter {
                            clock: Arc::clone(&manual),
                            handle,
                        });
                        manual
                    }
                };
                let state = DataHandle::new(
                    Arc::clone(&self.store),
                    self.config.scheduler_key(),
                    SchedulerState::default(),
                );
                Box::new(
                    PriorityScheduler::new(self.config.default_priority, clock)
                        .with_persistence(state)?,
                )
            }
        };

        info!(
            types = ?self.registry.types(),
            pid_limit = self.config.pid_limit,
            custom_scheduler,
            internal_clock = counter.is_some(),
            "Kernel initializing"
        );

        let mut kernel = Kernel {
            table: ProcessTable::new(self.store, self.config.table_key()),
            config: self.config,
            threads: AHashMap::new(),
            registry: self.registry,
            scheduler,
            logger: self.logger,
            quota: self.quota,
            counter,
            pid_count: 0,
        };
        kernel.start()?;
        kernel.check_scheduler()?;
        Ok(kernel)
    }
}
