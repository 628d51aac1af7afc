/*!
 * Scheduling Tests
 * Sleep deferral, band ordering and reconstruction fidelity
 */

use crate::support::{boot, registry, responses, script};
use oscore::{from_fn, DataHandle, Kernel, ManualClock, MemoryStore, Registry, Step, Syscall, Tick};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type RunLog = Arc<Mutex<Vec<String>>>;

/// Registry whose init forks `names` as `tracked` processes then hibernates
///
/// A tracked process named "high" first moves itself to band 9; every
/// tracked process appends its name to `log` whenever it runs.
fn tracked_registry(names: &[&str], log: RunLog) -> Registry {
    let mut calls: Vec<Syscall> = names
        .iter()
        .map(|name| Syscall::fork("tracked", vec![json!(name)]))
        .collect();
    calls.push(Syscall::hibernate());

    let mut registry = Registry::new();
    registry
        .register("init", move |_| script(calls.clone(), responses()))
        .unwrap()
        .register_typed("tracked", move |(name,): (String,)| {
            let log = log.clone();
            let mut reclassified = false;
            from_fn(move |_| {
                if name == "high" && !reclassified {
                    reclassified = true;
                    return Ok(Step::Call(Syscall::Priority { priority: 9 }));
                }
                log.lock().push(name.clone());
                Ok(Step::Yield)
            })
        })
        .unwrap();
    registry
}

fn cycle(kernel: &mut Kernel, log: &RunLog) -> Vec<String> {
    log.lock().clear();
    kernel.run().unwrap();
    log.lock().clone()
}

#[test]
fn test_sleep_defers_next_offer() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    let counter = runs.clone();
    registry
        .register("init", move |_| {
            let counter = counter.clone();
            from_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Step::Call(Syscall::sleep(3)))
            })
        })
        .unwrap();
    let (mut kernel, _) = boot(Arc::new(MemoryStore::new()), registry);

    let mut observed = Vec::new();
    for _ in 0..8 {
        kernel.run().unwrap();
        observed.push(runs.load(Ordering::SeqCst));
    }

    assert_eq!(observed, vec![1, 1, 1, 2, 2, 2, 3, 3]);
}

#[test]
fn test_sleep_uses_host_clock() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    let counter = runs.clone();
    registry
        .register("init", move |_| {
            let counter = counter.clone();
            from_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Step::Call(Syscall::sleep(10)))
            })
        })
        .unwrap();
    let clock = Arc::new(ManualClock::new(1_000));
    let mut kernel = Kernel::builder(Arc::new(MemoryStore::new()))
        .with_registry(registry)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    kernel.run().unwrap();
    kernel.run().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    clock.advance(9);
    kernel.run().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    clock.advance(1);
    kernel.run().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_higher_band_always_drained_first() {
    let log: RunLog = Arc::new(Mutex::new(Vec::new()));
    let registry = tracked_registry(&["low", "high", "other"], log.clone());
    let (mut kernel, _) = boot(Arc::new(MemoryStore::new()), registry);

    // "high" only moves to band 9 during its first slot
    assert_eq!(cycle(&mut kernel, &log), vec!["low", "high", "other"]);

    for _ in 0..3 {
        assert_eq!(cycle(&mut kernel, &log), vec!["high", "low", "other"]);
    }
}

#[test]
fn test_reconstruction_reproduces_schedule() {
    let log: RunLog = Arc::new(Mutex::new(Vec::new()));
    let names = ["a", "high", "b"];
    let store = Arc::new(MemoryStore::new());
    let (mut uninterrupted, _) = boot(store.clone(), tracked_registry(&names, log.clone()));
    cycle(&mut uninterrupted, &log);
    cycle(&mut uninterrupted, &log);

    let restored_log: RunLog = Arc::new(Mutex::new(Vec::new()));
    let snapshot = Arc::new(MemoryStore::from_snapshot(store.snapshot()));
    let (mut restored, _) = boot(snapshot, tracked_registry(&names, restored_log.clone()));

    for _ in 0..4 {
        assert_eq!(
            cycle(&mut restored, &restored_log),
            cycle(&mut uninterrupted, &log)
        );
    }
    assert_eq!(restored.pids().unwrap(), uninterrupted.pids().unwrap());
}

#[test]
fn test_cycle_counter_is_durable() {
    let store = Arc::new(MemoryStore::new());
    let (mut kernel, _) = boot(store.clone(), registry(vec![], responses()));
    for _ in 0..3 {
        kernel.run().unwrap();
    }
    drop(kernel);

    assert_eq!(
        DataHandle::new(store, "kernel:cycle", 0 as Tick)
            .get()
            .unwrap(),
        3
    );
}
