/*!
 * Priority Scheduler
 * Banded cooperative scheduling with sleep deadlines
 */

use super::clock::Clock;
use super::traits::{Scheduler, ThreadReturn};
use crate::core::errors::StoreError;
use crate::core::types::{Pid, Priority, StoreResult, Tick};
use crate::store::DataHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Scheduling entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    priority: Priority,
    /// Insertion order inside the band
    seq: u64,
    /// First tick at which the PID may be offered again
    wake_at: Tick,
    #[serde(skip)]
    offered_in: u64,
}

/// Persisted scheduler state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    next_seq: u64,
    cycle: u64,
    entries: BTreeMap<Pid, Entry>,
}

/// Point-in-time scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub registered: usize,
    pub sleeping: usize,
    pub bands: usize,
    pub cycle: u64,
}

/// Banded scheduler
///
/// Higher priority values are drained first. Inside a band PIDs are offered
/// in insertion order, each at most once per cycle. A PID whose sleep
/// deadline lies in the future is skipped and re-enters its band when the
/// clock reaches the deadline.
pub struct PriorityScheduler {
    default_priority: Priority,
    clock: Arc<dyn Clock>,
    state: SchedulerState,
    // Priority -> seq -> pid, derived from `state.entries`
    bands: BTreeMap<Priority, BTreeMap<u64, Pid>>,
    now: Tick,
    last_offered: Option<Pid>,
    persistence: Option<DataHandle<SchedulerState>>,
    failed: Option<StoreError>,
}

impl PriorityScheduler {
    pub fn new(default_priority: Priority, clock: Arc<dyn Clock>) -> Self {
        debug!(default_priority, "Priority scheduler initialized");
        Self {
            default_priority,
            clock,
            state: SchedulerState::default(),
            bands: BTreeMap::new(),
            now: 0,
            last_offered: None,
            persistence: None,
            failed: None,
        }
    }

    /// Persist bands, insertion order and sleep deadlines through `handle`
    ///
    /// Any state already stored under the handle's key is loaded.
    pub fn with_persistence(mut self, handle: DataHandle<SchedulerState>) -> StoreResult<Self> {
        self.state = handle.get()?;
        self.rebuild_bands();
        debug!(
            key = handle.key(),
            entries = self.state.entries.len(),
            "Scheduler state restored"
        );
        self.persistence = Some(handle);
        Ok(self)
    }

    pub fn priority_of(&self, pid: Pid) -> Option<Priority> {
        self.state.entries.get(&pid).map(|e| e.priority)
    }

    /// Sleep deadline for `pid`, if it is currently sleeping
    pub fn wake_at(&self, pid: Pid) -> Option<Tick> {
        self.state
            .entries
            .get(&pid)
            .map(|e| e.wake_at)
            .filter(|&wake_at| wake_at > self.clock.now())
    }

    pub fn stats(&self) -> SchedulerStats {
        let now = self.clock.now();
        SchedulerStats {
            registered: self.state.entries.len(),
            sleeping: self
                .state
                .entries
                .values()
                .filter(|e| e.wake_at > now)
                .count(),
            bands: self.bands.len(),
            cycle: self.state.cycle,
        }
    }

    fn rebuild_bands(&mut self) {
        self.bands.clear();
        for (&pid, entry) in &self.state.entries {
            self.bands
                .entry(entry.priority)
                .or_default()
                .insert(entry.seq, pid);
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.state.next_seq;
        self.state.next_seq += 1;
        seq
    }

    fn unlink(&mut self, priority: Priority, seq: u64) {
        if let Some(band) = self.bands.get_mut(&priority) {
            band.remove(&seq);
            if band.is_empty() {
                self.bands.remove(&priority);
            }
        }
    }

    /// Write the state through; the first failure is kept for `take_error`
    fn persist(&mut self) {
        let Some(ref handle) = self.persistence else {
            return;
        };
        if let Err(e) = handle.set(&self.state) {
            warn!(error = %e, "Failed to persist scheduler state");
            self.failed.get_or_insert(e);
        }
    }

    fn apply_hint(&mut self, previous: ThreadReturn) {
        let Some(pid) = self.last_offered.take() else {
            return;
        };
        let Some(hint) = previous else {
            return;
        };
        let now = self.now;
        if let Some(entry) = self.state.entries.get_mut(&pid) {
            entry.wake_at = now.saturating_add(hint.ticks);
            trace!(pid, ticks = hint.ticks, wake_at = entry.wake_at, "Process sleeping");
            self.persist();
        }
    }

    fn pick(&self) -> Option<Pid> {
        let cycle = self.state.cycle;
        let now = self.now;
        self.bands.values().rev().find_map(|band| {
            band.values().copied().find(|pid| {
                self.state
                    .entries
                    .get(pid)
                    .is_some_and(|e| e.offered_in != cycle && e.wake_at <= now)
            })
        })
    }
}

impl Scheduler for PriorityScheduler {
    fn add(&mut self, pid: Pid) {
        if self.state.entries.contains_key(&pid) {
            return;
        }
        let seq = self.take_seq();
        let priority = self.default_priority;
        self.state.entries.insert(
            pid,
            Entry {
                priority,
                seq,
                wake_at: 0,
                offered_in: 0,
            },
        );
        self.bands.entry(priority).or_default().insert(seq, pid);
        self.persist();
        debug!(pid, priority, "Process added to scheduler");
    }

    fn remove(&mut self, pid: Pid) {
        if let Some(entry) = self.state.entries.remove(&pid) {
            self.unlink(entry.priority, entry.seq);
            self.persist();
            debug!(pid, "Process removed from scheduler");
        }
    }

    fn contains(&self, pid: Pid) -> bool {
        self.state.entries.contains_key(&pid)
    }

    fn pids(&self) -> Vec<Pid> {
        self.state.entries.keys().copied().collect()
    }

    fn start_cycle(&mut self) {
        self.state.cycle += 1;
        self.now = self.clock.now();
        self.last_offered = None;
        trace!(cycle = self.state.cycle, now = self.now, "Scheduler cycle started");
    }

    fn next(&mut self, previous: ThreadReturn) -> Option<Pid> {
        self.apply_hint(previous);

        let pid = self.pick()?;
        let cycle = self.state.cycle;
        if let Some(entry) = self.state.entries.get_mut(&pid) {
            entry.offered_in = cycle;
        }
        self.last_offered = Some(pid);
        Some(pid)
    }

    fn reclassify(&mut self, pid: Pid, priority: Priority) -> bool {
        let Some(current) = self.state.entries.get(&pid).copied() else {
            return false;
        };
        if current.priority == priority {
            return true;
        }

        self.unlink(current.priority, current.seq);
        let seq = self.take_seq();
        if let Some(entry) = self.state.entries.get_mut(&pid) {
            entry.priority = priority;
            entry.seq = seq;
        }
        self.bands.entry(priority).or_default().insert(seq, pid);
        self.persist();
        debug!(pid, from = current.priority, to = priority, "Process reclassified");
        true
    }

    fn wake(&mut self, pid: Pid) -> bool {
        let Some(entry) = self.state.entries.get_mut(&pid) else {
            return false;
        };
        if entry.wake_at != 0 {
            entry.wake_at = 0;
            self.persist();
            trace!(pid, "Process woken");
        }
        true
    }

    fn take_error(&mut self) -> Option<StoreError> {
        self.failed.take()
    }

    fn len(&self) -> usize {
        self.state.entries.len()
    }
}
