/*!
 * Root Supervisor
 * Built-in body of PID 0
 */

use super::thread::{Step, Thread};
use crate::core::errors::ThreadError;
use crate::core::types::ThreadResult;
use crate::syscalls::{Syscall, SyscallResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Query,
    Inspect,
    Hibernate,
}

/// Makes sure a primary process exists, then sleeps forever
#[derive(Debug)]
pub(crate) struct Tron {
    init_type: String,
    phase: Phase,
}

impl Tron {
    pub(crate) fn new(init_type: impl Into<String>) -> Self {
        Self {
            init_type: init_type.into(),
            phase: Phase::Query,
        }
    }
}

impl Thread for Tron {
    fn resume(&mut self, input: Option<SyscallResult>) -> ThreadResult<Step> {
        match self.phase {
            Phase::Query => {
                self.phase = Phase::Inspect;
                Ok(Step::Call(Syscall::Children))
            }
            Phase::Inspect => {
                let children = input
                    .and_then(SyscallResult::into_children)
                    .ok_or_else(|| ThreadError::fault("expected children listing"))?;
                self.phase = Phase::Hibernate;
                if children.values().any(|c| c.process_type == self.init_type) {
                    Ok(Step::Call(Syscall::hibernate()))
                } else {
                    Ok(Step::Call(Syscall::fork(self.init_type.clone(), Vec::new())))
                }
            }
            Phase::Hibernate => Ok(Step::Call(Syscall::hibernate())),
        }
    }
}
