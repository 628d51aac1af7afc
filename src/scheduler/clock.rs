/*!
 * Clock and Quota Sources
 * Host-supplied cycle counter and compute budget
 */

use crate::core::types::Tick;
use std::sync::atomic::{AtomicU64, Ordering};

/// Current cycle counter
pub trait Clock: Send + Sync {
    fn now(&self) -> Tick;
}

impl<F> Clock for F
where
    F: Fn() -> Tick + Send + Sync,
{
    fn now(&self) -> Tick {
        self()
    }
}

/// Clock advanced explicitly by the host
#[derive(Debug, Default)]
pub struct ManualClock {
    tick: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Tick) -> Self {
        Self {
            tick: AtomicU64::new(start),
        }
    }

    /// Move forward by `ticks`, returning the new value
    pub fn advance(&self, ticks: Tick) -> Tick {
        self.tick.fetch_add(ticks, Ordering::SeqCst) + ticks
    }

    pub fn set(&self, tick: Tick) {
        self.tick.store(tick, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }
}

/// Remaining compute budget for the current cycle
///
/// Advisory only: the kernel reports it, it never interrupts a thread.
pub trait Quota: Send + Sync {
    fn remaining(&self) -> f64;
}

impl<F> Quota for F
where
    F: Fn() -> f64 + Send + Sync,
{
    fn remaining(&self) -> f64 {
        self()
    }
}

/// Quota source for hosts without a budget
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

impl Quota for Unlimited {
    fn remaining(&self) -> f64 {
        f64::INFINITY
    }
}
