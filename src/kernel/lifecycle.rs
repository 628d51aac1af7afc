/*!
 * Process Lifecycle
 * Startup, reboot, PID allocation, creation and cascading kill
 */

use super::Kernel;
use crate::core::errors::KernelError;
use crate::core::limits::{process_key_scope, INIT_PID, PROCESS_KEY_PREFIX, ROOT_PID, ROOT_TYPE};
use crate::core::types::{KernelResult, Pid, Value};
use crate::process::root::Tron;
use crate::process::{ProcessDescriptor, Thread};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use tracing::{debug, info};

impl Kernel {
    /// Restore from the table, or reboot when the root is gone
    pub(super) fn start(&mut self) -> KernelResult<()> {
        if !self.table.contains(ROOT_PID)? {
            self.logger.on_warn("Root process missing, rebooting");
            self.reboot_inner()?;
            return Ok(());
        }

        for pid in self.table.pids()? {
            self.init_thread(pid)?;
        }
        // The root re-checks for the primary process on every start
        self.scheduler.wake(ROOT_PID);

        // Scheduler state may outlive processes killed before a reset
        let live: BTreeSet<Pid> = self.table.pids()?.into_iter().collect();
        for pid in self.scheduler.pids() {
            if !live.contains(&pid) {
                self.scheduler.remove(pid);
            }
        }

        self.pid_count = live.last().copied().unwrap_or(ROOT_PID);
        info!(
            processes = live.len(),
            threads = self.threads.len(),
            "Kernel restored from process table"
        );
        Ok(())
    }

    /// Reset the table to just the root and the primary process
    ///
    /// Never fails to the caller; errors go to the logger.
    pub fn reboot(&mut self) -> bool {
        match self.reboot_inner() {
            Ok(()) => true,
            Err(e) => {
                self.logger.on_error(&format!("Reboot failed: {}", e));
                false
            }
        }
    }

    pub(super) fn reboot_inner(&mut self) -> KernelResult<()> {
        self.logger.on_info("Rebooting...");

        for pid in self.scheduler.pids() {
            self.scheduler.remove(pid);
        }
        self.threads.clear();
        self.table.clear()?;
        self.table.store().delete_prefix(PROCESS_KEY_PREFIX)?;
        self.pid_count = INIT_PID;

        let init_type = self.config.init_type.clone();
        self.create_process(ROOT_TYPE, Vec::new(), ROOT_PID, ROOT_PID)?;
        self.create_process(&init_type, Vec::new(), INIT_PID, ROOT_PID)?;
        Ok(())
    }

    /// Next free PID from the rolling counter
    ///
    /// Wraps to 1 once the counter reaches the limit and skips live PIDs.
    pub(super) fn acquire_pid(&mut self) -> KernelResult<Pid> {
        let table = self.table.snapshot()?;
        let limit = self.config.pid_limit;
        for _ in 0..limit {
            if self.pid_count >= limit {
                self.pid_count = ROOT_PID;
            }
            self.pid_count += 1;
            if !table.contains_key(&self.pid_count) {
                return Ok(self.pid_count);
            }
        }
        Err(KernelError::PidExhausted(limit))
    }

    pub(super) fn create_process(
        &mut self,
        process_type: &str,
        args: Vec<Value>,
        pid: Pid,
        parent: Pid,
    ) -> KernelResult<()> {
        if self.table.contains(pid)? {
            return Err(KernelError::DuplicatePid(pid));
        }

        self.table
            .set(ProcessDescriptor::new(process_type, pid, parent, args))?;
        self.init_thread(pid)
    }

    /// Instantiate the thread for a table entry and make it runnable
    ///
    /// Unknown types and rejected arguments kill the PID and are logged;
    /// they never fail the caller.
    fn init_thread(&mut self, pid: Pid) -> KernelResult<()> {
        // May already be gone through a cascade during reconstruction
        let Some(descriptor) = self.table.find(pid)? else {
            return Ok(());
        };

        let spawned: KernelResult<Box<dyn Thread>> =
            if pid == ROOT_PID && descriptor.process_type == ROOT_TYPE {
                Ok(Box::new(Tron::new(self.config.init_type.clone())))
            } else {
                self.registry
                    .spawn(pid, &descriptor.process_type, &descriptor.args())
            };

        match spawned {
            Ok(thread) => {
                self.threads.insert(pid, thread);
                self.scheduler.add(pid);
                debug!(pid, process_type = %descriptor.process_type, "Thread initialized");
                Ok(())
            }
            Err(err @ (KernelError::UnregisteredType { .. } | KernelError::InvalidArgs { .. })) => {
                self.kill_tree(pid)?;
                self.logger.on_error(&format!(
                    "Error trying to initialise pid {}: {}",
                    pid, err
                ));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Kill a process and all its descendants
    ///
    /// Administrative entry point: returns false if the PID was not live or
    /// the kill failed. Killing the root reboots.
    pub fn kill(&mut self, pid: Pid) -> bool {
        let result = match self.table.contains(pid) {
            Ok(false) if pid != ROOT_PID => Ok(false),
            Ok(_) => self.kill_tree(pid).map(|()| true),
            Err(e) => Err(e),
        };
        match result {
            Ok(killed) => killed,
            Err(e) => {
                self.logger
                    .on_error(&format!("Failed to kill pid {}: {}", pid, e));
                false
            }
        }
    }

    /// Unconditional cascading kill, no grace period
    pub(super) fn kill_tree(&mut self, pid: Pid) -> KernelResult<()> {
        if pid == ROOT_PID {
            self.logger
                .on_alert("Trying to kill the root process, rebooting...");
            return self.reboot_inner();
        }

        let table = self.table.snapshot()?;
        let mut by_parent: AHashMap<Pid, Vec<Pid>> = AHashMap::new();
        for (&child, packed) in &table {
            if child != packed.2 {
                by_parent.entry(packed.2).or_default().push(child);
            }
        }

        let mut victims = Vec::new();
        let mut seen = AHashSet::new();
        let mut stack = vec![pid];
        while let Some(next) = stack.pop() {
            if next == ROOT_PID || !seen.insert(next) {
                continue;
            }
            victims.push(next);
            if let Some(children) = by_parent.get(&next) {
                stack.extend(children.iter().copied());
            }
        }

        for &victim in &victims {
            self.threads.remove(&victim);
            self.scheduler.remove(victim);
            self.table
                .store()
                .delete_prefix(&process_key_scope(victim))?;
        }
        self.table.remove_all(&victims)?;

        self.logger.on_info(&format!(
            "Killed pid {} and {} descendant(s)",
            pid,
            victims.len().saturating_sub(1)
        ));
        Ok(())
    }

    /// Fail with any persistence error the scheduler has swallowed
    pub(super) fn check_scheduler(&mut self) -> KernelResult<()> {
        match self.scheduler.take_error() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Advance the internal cycle counter, if the kernel owns the clock
    pub(super) fn tick(&mut self) -> KernelResult<()> {
        if let Some(ref counter) = self.counter {
            let now = counter.handle.update(|tick| {
                *tick += 1;
                *tick
            })?;
            counter.clock.set(now);
        }
        Ok(())
    }
}
