/*!
 * OS Core Host - Main Entry Point
 *
 * Drives the kernel on a fixed tick:
 * - Durable JSON file store
 * - Demo process bodies (init plus persistent counters)
 * - Graceful shutdown on Ctrl+C
 */

use anyhow::Context;
use oscore::core::limits::ROOT_PID;
use oscore::{
    from_fn, init_tracing, JsonFileStore, Kernel, KernelConfig, ProcessMemory, Registry, Step,
    Syscall, SyscallResult, Thread, ThreadError, ThreadResult,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Counters init keeps alive: (name, ticks between increments)
const COUNTERS: &[(&str, u64)] = &[("fast", 1), ("slow", 5)];

/// Ticks init sleeps between surveys of its children
const INIT_SURVEY_TICKS: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing
    init_tracing();

    info!("OS core host starting...");
    info!("================================================");

    let config = KernelConfig::from_env();
    let store_path = std::env::var("OSCORE_STORE_PATH")
        .unwrap_or_else(|_| "/tmp/oscore/store.json".to_string());
    info!(store_path = %store_path, "Opening durable store");
    let store = Arc::new(
        JsonFileStore::open(&store_path)
            .with_context(|| format!("Failed to open store at {}", store_path))?,
    );

    let mut kernel = Kernel::builder(store)
        .with_config(config)
        .with_registry(demo_registry()?)
        .build()
        .context("Failed to build kernel")?;

    let tick_ms = env_or("OSCORE_TICK_MS", 1000u64);
    let max_ticks = std::env::var("OSCORE_TICKS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok());

    info!(tick_ms, max_ticks = ?max_ticks, "Kernel entering main loop...");
    info!("Press Ctrl+C to exit");

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let stats = kernel.run().context("Kernel cycle failed")?;
                ticks += 1;
                info!(
                    tick = ticks,
                    threads_run = stats.threads_run,
                    syscalls = stats.syscalls,
                    exits = stats.exits,
                    faults = stats.faults,
                    elapsed_us = stats.elapsed_micros,
                    "Tick complete"
                );
                if max_ticks.is_some_and(|max| ticks >= max) {
                    info!(ticks, "Tick limit reached");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    info!("Process tree:\n{}", kernel.ps(ROOT_PID)?);
    info!(ticks, "OS core host stopped");
    Ok(())
}

fn env_or(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Ignoring unparsable value");
            default
        }),
        Err(_) => default,
    }
}

fn demo_registry() -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    registry
        .register("init", |_| init_body())?
        .register_typed("counter", |(name, every): (String, u64)| counter_body(name, every))?;
    Ok(registry)
}

/// Keeps one counter of each name running, then sleeps
fn init_body() -> Box<dyn Thread> {
    let mut pending: Vec<(String, u64)> = Vec::new();
    from_fn(move |input| match input {
        None => Ok(Step::Call(Syscall::Children)),
        Some(SyscallResult::Children { children }) => {
            let running: Vec<String> = children
                .values()
                .filter_map(|child| child.args.first()?.as_str().map(str::to_string))
                .collect();
            pending = COUNTERS
                .iter()
                .filter(|(name, _)| !running.iter().any(|r| r == name))
                .map(|&(name, every)| (name.to_string(), every))
                .collect();
            next_fork(&mut pending)
        }
        Some(SyscallResult::Fork { .. }) => next_fork(&mut pending),
        Some(other) => Err(ThreadError::fault(format!("unexpected response: {:?}", other))),
    })
}

fn next_fork(pending: &mut Vec<(String, u64)>) -> ThreadResult<Step> {
    match pending.pop() {
        Some((name, every)) => Ok(Step::Call(Syscall::fork(
            "counter",
            vec![json!(name), json!(every)],
        ))),
        None => Ok(Step::Call(Syscall::sleep(INIT_SURVEY_TICKS))),
    }
}

/// Increments a durable count every `every` ticks
fn counter_body(name: String, every: u64) -> Box<dyn Thread> {
    let mut memory: Option<ProcessMemory> = None;
    from_fn(move |input| {
        if let Some(result) = input {
            memory = result.into_memory();
        }
        let Some(ref mem) = memory else {
            return Ok(Step::Call(Syscall::Allocate));
        };

        let count = mem.get::<u64>("count")?.unwrap_or(0) + 1;
        mem.set("count", &count)?;
        info!(counter = %name, count, "Counter ticked");
        Ok(Step::Call(Syscall::sleep(every)))
    })
}
