/*!
 * Recovery Tests
 * Table desync, PID exhaustion, stale arguments and store failures
 */

use crate::support::{registry, responses, Event, RecordingLogger};
use oscore::{
    DurableStore, Kernel, KernelConfig, KernelError, ManualClock, MemoryStore, Pid,
    PriorityScheduler, Registry, Scheduler, StoreError, StoreResult, Syscall, SyscallResult,
    ThreadReturn, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Priority scheduler that also offers `stray` first in every cycle until
/// the kernel removes it
///
/// `stray` is left out of `pids`, so startup reconciliation cannot drop it.
struct StrayScheduler {
    inner: PriorityScheduler,
    stray: Option<Pid>,
    offered: bool,
}

impl StrayScheduler {
    fn new(stray: Pid) -> Self {
        Self {
            inner: PriorityScheduler::new(5, Arc::new(ManualClock::new(0))),
            stray: Some(stray),
            offered: false,
        }
    }
}

impl Scheduler for StrayScheduler {
    fn add(&mut self, pid: Pid) {
        self.inner.add(pid);
    }

    fn remove(&mut self, pid: Pid) {
        if self.stray == Some(pid) {
            self.stray = None;
        }
        self.inner.remove(pid);
    }

    fn contains(&self, pid: Pid) -> bool {
        self.stray == Some(pid) || self.inner.contains(pid)
    }

    fn pids(&self) -> Vec<Pid> {
        self.inner.pids()
    }

    fn start_cycle(&mut self) {
        self.offered = false;
        self.inner.start_cycle();
    }

    fn next(&mut self, previous: ThreadReturn) -> Option<Pid> {
        if !self.offered {
            self.offered = true;
            if let Some(stray) = self.stray {
                return Some(stray);
            }
        }
        self.inner.next(previous)
    }
}

fn boot_with(
    store: Arc<dyn DurableStore>,
    registry: Registry,
    scheduler: Option<StrayScheduler>,
    config: KernelConfig,
) -> (Kernel, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let mut builder = Kernel::builder(store)
        .with_registry(registry)
        .with_config(config)
        .with_logger(logger.clone());
    if let Some(scheduler) = scheduler {
        builder = builder.with_scheduler(scheduler);
    }
    (builder.build().unwrap(), logger)
}

#[test]
fn test_entry_without_thread_is_killed() {
    let store = Arc::new(MemoryStore::new());
    let (mut kernel, logger) = boot_with(
        store.clone(),
        registry(vec![], responses()),
        Some(StrayScheduler::new(7)),
        KernelConfig::default(),
    );

    // Appears in the table behind the kernel's back, so no thread exists
    let mut table = store.read("kernel:processTable").unwrap().unwrap();
    table
        .as_object_mut()
        .unwrap()
        .insert("7".to_string(), json!(["idle", 7, 1, {"__args": []}]));
    store.write("kernel:processTable", table).unwrap();
    logger.clear();

    let stats = kernel.run().unwrap();

    assert_eq!(stats.faults, 1);
    assert_eq!(kernel.pids().unwrap(), vec![0, 1]);
    assert_eq!(
        logger.process_events(),
        vec![Event::Fault(7, KernelError::MissingThread(7))]
    );

    let stats = kernel.run().unwrap();
    assert_eq!(stats.faults, 0);
}

#[test]
fn test_scheduled_pid_without_descriptor_is_dropped() {
    let (mut kernel, logger) = boot_with(
        Arc::new(MemoryStore::new()),
        registry(vec![], responses()),
        Some(StrayScheduler::new(9)),
        KernelConfig::default(),
    );
    assert!(kernel.scheduler().contains(9));

    let stats = kernel.run().unwrap();

    // The cycle carried on with the real processes
    assert_eq!(stats.threads_run, 2);
    assert_eq!(stats.faults, 0);
    assert!(!kernel.scheduler().contains(9));
    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("pid 9"));

    kernel.run().unwrap();
    assert_eq!(logger.errors().len(), 1);
}

#[test]
fn test_fork_with_no_free_pid_faults_the_caller() {
    let seen = responses();
    let calls = vec![Syscall::fork("idle", vec![]); 3];
    let config = KernelConfig {
        pid_limit: 3,
        ..Default::default()
    };
    let (mut kernel, logger) = boot_with(
        Arc::new(MemoryStore::new()),
        registry(calls, seen.clone()),
        None,
        config,
    );

    let stats = kernel.run().unwrap();

    assert_eq!(stats.faults, 1);
    assert!(matches!(
        seen.lock().as_slice(),
        [SyscallResult::Fork { pid: 2 }, SyscallResult::Fork { pid: 3 }]
    ));
    // Init and the children it already forked are gone; the root survives
    assert_eq!(kernel.pids().unwrap(), vec![0]);
    match logger.process_events().as_slice() {
        [Event::Fault(1, KernelError::TaskFault { pid: 1, message })] => {
            assert!(message.contains("fork failed"));
        }
        other => panic!("unexpected events: {:?}", other),
    }

    assert!(kernel.run().is_ok());
}

#[test]
fn test_reconstruction_kills_process_with_stale_args() {
    let store = Arc::new(MemoryStore::new());
    let calls = vec![Syscall::fork("forker", vec![json!(["idle"])])];
    let (mut kernel, _) = boot_with(
        store.clone(),
        registry(calls, responses()),
        None,
        KernelConfig::default(),
    );
    kernel.run().unwrap();
    assert_eq!(kernel.pids().unwrap(), vec![0, 1, 2, 3]);
    drop(kernel);

    // `forker` expects a list of tags
    let mut table = store.read("kernel:processTable").unwrap().unwrap();
    table["2"][3]["__args"] = json!([42]);
    store.write("kernel:processTable", table).unwrap();

    let (restored, logger) = boot_with(
        store,
        registry(vec![], responses()),
        None,
        KernelConfig::default(),
    );

    assert_eq!(restored.pids().unwrap(), vec![0, 1]);
    assert_eq!(restored.scheduler().pids(), vec![0, 1]);
    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("rejected its arguments"));
    assert!(logger.process_events().is_empty());
}

/// Memory store whose writes to `key` fail once `broken` is set
#[derive(Default)]
struct BrittleStore {
    inner: MemoryStore,
    key: &'static str,
    broken: AtomicBool,
}

impl DurableStore for BrittleStore {
    fn read(&self, key: &str) -> StoreResult<Option<Value>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: Value) -> StoreResult<()> {
        if key == self.key && self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Io("disk full".into()));
        }
        self.inner.write(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        self.inner.keys()
    }
}

#[test]
fn test_lost_sleep_deadline_fails_the_cycle() {
    let store = Arc::new(BrittleStore {
        key: "kernel:scheduler",
        ..Default::default()
    });
    let (mut kernel, _) = boot_with(
        store.clone(),
        registry(vec![Syscall::sleep(2)], responses()),
        None,
        KernelConfig::default(),
    );

    store.broken.store(true, Ordering::SeqCst);
    assert!(matches!(
        kernel.run(),
        Err(KernelError::Store(StoreError::Io(_)))
    ));

    store.broken.store(false, Ordering::SeqCst);
    assert!(kernel.run().is_ok());
}
