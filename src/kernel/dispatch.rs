/*!
 * Run Loop and Syscall Dispatch
 * Drives one cycle and interprets the requests threads yield
 */

use super::{CycleStats, Kernel};
use crate::core::errors::{KernelError, ThreadError};
use crate::core::types::{KernelResult, Pid};
use crate::process::{ProcessMemory, Step, Thread};
use crate::scheduler::{SleepHint, ThreadReturn};
use crate::syscalls::{Syscall, SyscallResult};
use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, trace};

impl Kernel {
    /// Run one full cycle
    ///
    /// Process faults and exits are recovered by killing the process. Only
    /// table, scheduler and store failures propagate. The quota is reported,
    /// never enforced.
    pub fn run(&mut self) -> KernelResult<CycleStats> {
        let started = Instant::now();
        self.tick()?;
        self.scheduler.start_cycle();

        let mut stats = CycleStats::default();
        let mut previous: ThreadReturn = None;
        while let Some(pid) = self.scheduler.next(previous.take()) {
            let Some(descriptor) = self.table.find(pid)? else {
                self.logger.on_error(&format!(
                    "Scheduled pid {} has no process descriptor",
                    pid
                ));
                self.threads.remove(&pid);
                self.scheduler.remove(pid);
                continue;
            };
            let process = descriptor.info();

            stats.threads_run += 1;
            let slot = Instant::now();
            match self.run_thread(pid, &mut stats) {
                Ok(hint) => previous = hint,
                Err(KernelError::CleanExit { reason, .. }) => {
                    self.kill_tree(pid)?;
                    self.logger.on_thread_exit(&process, &reason);
                    stats.exits += 1;
                }
                Err(err @ (KernelError::TaskFault { .. } | KernelError::MissingThread(_))) => {
                    self.kill_tree(pid)?;
                    self.logger.on_thread_error(&process, &err);
                    stats.faults += 1;
                }
                Err(err) => return Err(err),
            }
            self.check_scheduler()?;
            trace!(
                pid,
                elapsed_us = slot.elapsed().as_micros() as u64,
                quota = self.quota.remaining(),
                "Thread slot finished"
            );
        }

        self.check_scheduler()?;

        stats.elapsed_micros = started.elapsed().as_micros() as u64;
        stats.quota_remaining = self.quota.remaining();
        debug!(
            threads_run = stats.threads_run,
            syscalls = stats.syscalls,
            exits = stats.exits,
            faults = stats.faults,
            elapsed_us = stats.elapsed_micros,
            "Cycle complete"
        );
        Ok(stats)
    }

    /// Resume the thread for `pid` until it yields, sleeps or terminates
    fn run_thread(&mut self, pid: Pid, stats: &mut CycleStats) -> KernelResult<ThreadReturn> {
        let Some(mut thread) = self.threads.remove(&pid) else {
            return Err(KernelError::MissingThread(pid));
        };

        let outcome = self.drive(pid, thread.as_mut(), stats);

        // A completed, killed or rebooted process must not get its old
        // thread back
        if outcome.is_ok() && self.table.contains(pid)? && !self.threads.contains_key(&pid) {
            self.threads.insert(pid, thread);
        }
        outcome
    }

    fn drive(
        &mut self,
        pid: Pid,
        thread: &mut dyn Thread,
        stats: &mut CycleStats,
    ) -> KernelResult<ThreadReturn> {
        let mut input: Option<SyscallResult> = None;
        loop {
            let resumed = panic::catch_unwind(AssertUnwindSafe(|| thread.resume(input.take())));
            let step = match resumed {
                Ok(Ok(step)) => step,
                Ok(Err(ThreadError::Exit(reason))) => {
                    return Err(KernelError::CleanExit { pid, reason })
                }
                Ok(Err(ThreadError::Fault(message))) => {
                    return Err(KernelError::TaskFault { pid, message })
                }
                Err(payload) => {
                    return Err(KernelError::TaskFault {
                        pid,
                        message: panic_message(payload.as_ref()),
                    })
                }
            };

            match step {
                Step::Yield => return Ok(None),
                Step::Complete => {
                    debug!(pid, "Process completed");
                    self.kill_tree(pid)?;
                    stats.exits += 1;
                    return Ok(None);
                }
                Step::Call(call) => {
                    stats.syscalls += 1;
                    match self.dispatch(pid, call)? {
                        ControlFlow::Break(hint) => return Ok(Some(hint)),
                        ControlFlow::Continue(result) => input = Some(result),
                    }
                }
            }
        }
    }

    /// Interpret one syscall on behalf of `pid`
    ///
    /// `Break` ends the thread's slot with a sleep hint; `Continue` resumes
    /// the same thread with the response.
    fn dispatch(
        &mut self,
        pid: Pid,
        call: Syscall,
    ) -> KernelResult<ControlFlow<SleepHint, SyscallResult>> {
        trace!(pid, syscall = call.name(), "Syscall");

        let result = match call {
            Syscall::Sleep { ticks } => return Ok(ControlFlow::Break(SleepHint { ticks })),

            Syscall::Fork { process_type, args } => {
                let child = self.acquire_pid().map_err(|err| match err {
                    KernelError::PidExhausted(_) => KernelError::TaskFault {
                        pid,
                        message: format!("fork failed: {}", err),
                    },
                    other => other,
                })?;
                self.create_process(&process_type, args, child, pid)?;
                self.logger.on_info(&format!(
                    "Pid {} forked '{}' as pid {}",
                    pid, process_type, child
                ));
                SyscallResult::Fork { pid: child }
            }

            Syscall::Kill { pid: target } => {
                let is_child = target != pid
                    && self
                        .table
                        .find(target)?
                        .is_some_and(|descriptor| descriptor.parent == pid);
                if is_child {
                    self.kill_tree(target)?;
                } else {
                    debug!(pid, target, "Ignoring kill of a non-child");
                }
                SyscallResult::Kill { killed: is_child }
            }

            Syscall::Allocate => SyscallResult::Allocate {
                memory: ProcessMemory::new(self.table.clone(), pid),
            },

            Syscall::Children => SyscallResult::Children {
                children: self
                    .table
                    .children(pid)?
                    .iter()
                    .map(|descriptor| (descriptor.pid, descriptor.info()))
                    .collect(),
            },

            Syscall::Priority { priority } => SyscallResult::Priority {
                applied: self.scheduler.reclassify(pid, priority),
            },
        };
        Ok(ControlFlow::Continue(result))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
