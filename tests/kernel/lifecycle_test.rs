/*!
 * Lifecycle Tests
 * Reboot, reconstruction, PID allocation and cascading kill
 */

use crate::support::{boot, registry, responses, tree_kernel};
use oscore::{DurableStore, MemoryStore, Pid, Registry, Syscall, SyscallResult};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn test_empty_store_boots_root_and_init() {
    let store = Arc::new(MemoryStore::new());
    let (kernel, _) = boot(store.clone(), registry(vec![], responses()));

    assert_eq!(kernel.pids().unwrap(), vec![0, 1]);

    let root = kernel.descriptor(0).unwrap();
    assert_eq!(root.process_type, "tron");
    assert_eq!(root.parent, 0);

    let init = kernel.descriptor(1).unwrap();
    assert_eq!(init.process_type, "init");
    assert_eq!(init.parent, 0);

    assert_eq!(
        store.read("kernel:processTable").unwrap(),
        Some(json!({
            "0": ["tron", 0, 0, {"__args": []}],
            "1": ["init", 1, 0, {"__args": []}],
        }))
    );
    assert_eq!(kernel.scheduler().pids(), vec![0, 1]);
}

#[test]
fn test_kill_cascades_to_descendants() {
    let (mut kernel, _) = tree_kernel(Arc::new(MemoryStore::new()));
    assert_eq!(kernel.pids().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(kernel.descriptor(4).unwrap().parent, 2);

    assert!(kernel.kill(2));

    assert_eq!(kernel.pids().unwrap(), vec![0, 1, 3]);
    assert_eq!(kernel.scheduler().pids(), vec![0, 1, 3]);
    for pid in [2, 4, 5] {
        assert!(!kernel.has_thread(pid));
    }
    assert_eq!(kernel.thread_count(), 3);
}

#[test]
fn test_kill_root_reboots() {
    let (mut kernel, logger) = tree_kernel(Arc::new(MemoryStore::new()));

    assert!(kernel.kill(0));

    assert_eq!(kernel.pids().unwrap(), vec![0, 1]);
    assert_eq!(kernel.descriptor(0).unwrap().parent, 0);
    assert_eq!(kernel.descriptor(1).unwrap().parent, 0);
    assert_eq!(kernel.scheduler().pids(), vec![0, 1]);
    assert_eq!(
        logger.alerts(),
        vec!["Trying to kill the root process, rebooting...".to_string()]
    );
}

#[test]
fn test_kill_absent_pid_returns_false() {
    let (mut kernel, logger) = tree_kernel(Arc::new(MemoryStore::new()));
    logger.clear();
    assert!(!kernel.kill(42));
    assert_eq!(kernel.pids().unwrap().len(), 6);
    assert!(logger.events().is_empty());
}

#[test]
fn test_reboot_restarts_pid_allocation() {
    let store = Arc::new(MemoryStore::new());
    let (mut kernel, _) = tree_kernel(store.clone());
    store.write("process:4:cache", json!([1, 2])).unwrap();

    assert!(kernel.reboot());
    assert_eq!(kernel.pids().unwrap(), vec![0, 1]);
    assert_eq!(store.read("process:4:cache").unwrap(), None);

    // The rebuilt init replays its script and gets fresh low PIDs
    kernel.run().unwrap();
    assert_eq!(kernel.pids().unwrap(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_unregistered_fork_is_killed_and_logged() {
    let seen = responses();
    let store = Arc::new(MemoryStore::new());
    let (mut kernel, logger) = boot(
        store,
        registry(vec![Syscall::fork("ghost", vec![])], seen.clone()),
    );

    let stats = kernel.run().unwrap();

    assert_eq!(kernel.pids().unwrap(), vec![0, 1]);
    assert_eq!(stats.faults, 0);
    assert!(matches!(
        seen.lock().as_slice(),
        [SyscallResult::Fork { pid: 2 }]
    ));
    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("ghost"));
    // Unknown types are errors, not alerts
    assert!(logger.alerts().is_empty());
}

#[test]
fn test_reconstruction_rebuilds_every_thread() {
    let store = Arc::new(MemoryStore::new());
    let (kernel, _) = tree_kernel(store.clone());
    let before = kernel.processes().unwrap();
    drop(kernel);

    let (restored, logger) = boot(store, registry(vec![], responses()));

    assert_eq!(restored.processes().unwrap(), before);
    assert_eq!(restored.thread_count(), 6);
    assert_eq!(restored.scheduler().pids(), vec![0, 1, 2, 3, 4, 5]);
    assert!(logger.events().is_empty());
}

#[test]
fn test_reconstruction_kills_unknown_types() {
    let store = Arc::new(MemoryStore::new());
    let (kernel, _) = tree_kernel(store.clone());
    drop(kernel);

    // Same tree, but `forker` is no longer registered
    let mut registry = Registry::new();
    registry
        .register("init", |_| crate::support::idle())
        .unwrap()
        .register("idle", |_| crate::support::idle())
        .unwrap();
    let (restored, logger) = boot(store, registry);

    assert_eq!(restored.pids().unwrap(), vec![0, 1, 3]);
    assert!(!restored.scheduler().contains(4));
    let errors = logger.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("forker"));
    assert!(logger.process_events().is_empty());
}

#[test]
fn test_missing_root_triggers_reboot() {
    let store = Arc::new(MemoryStore::new());
    let (kernel, _) = tree_kernel(store.clone());
    drop(kernel);

    let mut table = store.read("kernel:processTable").unwrap().unwrap();
    table.as_object_mut().unwrap().remove("0");
    store.write("kernel:processTable", table).unwrap();

    let (restored, logger) = boot(store, registry(vec![], responses()));
    assert_eq!(restored.pids().unwrap(), vec![0, 1]);
    assert_eq!(restored.scheduler().pids(), vec![0, 1]);
    assert_eq!(logger.warnings().len(), 1);
    assert_eq!(logger.infos(), vec!["Rebooting...".to_string()]);
}

#[test]
fn test_logger_sees_reboot_fork_and_kill() {
    let calls = vec![Syscall::fork("idle", vec![])];
    let (mut kernel, logger) = boot(
        Arc::new(MemoryStore::new()),
        registry(calls, responses()),
    );
    assert_eq!(logger.infos(), vec!["Rebooting...".to_string()]);

    kernel.run().unwrap();
    assert!(kernel.kill(2));
    assert!(kernel.reboot());

    let infos = logger.infos();
    assert_eq!(infos.len(), 4);
    assert!(infos[1].contains("forked 'idle' as pid 2"));
    assert!(infos[2].contains("Killed pid 2"));
    assert_eq!(infos[3], "Rebooting...");
    assert!(logger.errors().is_empty());
    assert!(logger.alerts().is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_forks_get_distinct_fresh_pids(count in 1usize..40) {
        let seen = responses();
        let calls = (0..count).map(|_| Syscall::fork("idle", vec![])).collect();
        let store = Arc::new(MemoryStore::new());
        let (mut kernel, _) = boot(store, registry(calls, seen.clone()));
        kernel.run().unwrap();

        let pids: Vec<Pid> = seen
            .lock()
            .iter()
            .filter_map(SyscallResult::forked_pid)
            .collect();
        let distinct: BTreeSet<Pid> = pids.iter().copied().collect();

        prop_assert_eq!(pids.len(), count);
        prop_assert_eq!(distinct.len(), count);
        prop_assert!(pids.iter().all(|&pid| pid > 1));
        prop_assert_eq!(kernel.pids().unwrap().len(), count + 2);
    }
}
