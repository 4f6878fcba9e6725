//! Architectural Contract Test: Pass Isolation & Shutdown
//!
//! This test verifies how the scheduler drives passes over time.
//!
//! Constraints verified:
//! - A failing or panicking pass never stops the schedule
//! - Passes never overlap, even when one outlives the interval
//! - Shutdown lets an in-flight pass finish
//! - The first pass waits for the startup delay
//!
//! If this test fails, someone has added:
//! - Error propagation out of the scheduler loop
//! - Concurrent pass execution
//! - Cancellation of in-flight passes

mod common;

use common::*;
use driftdns_core::{PassStatus, Reconciler, Scheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const IP: &str = "203.0.113.7";
const INTERVAL: Duration = Duration::from_millis(1_000);

fn build_scheduler(
    resolver: &ScriptedIpResolver,
    provider: &InMemoryProvider,
    startup_delay: Duration,
) -> Scheduler {
    let config = minimal_config(&[("Z1", "home.example.com.")]);
    let (reconciler, _rx) = Reconciler::new(
        Box::new(ScriptedIpResolver::sharing_counters_with(resolver)),
        Box::new(InMemoryProvider::sharing_counters_with(provider)),
        &config,
    )
    .expect("reconciler construction succeeds");

    Scheduler::new(Arc::new(reconciler), INTERVAL, startup_delay)
}

fn spawn_scheduler(scheduler: Scheduler) -> (oneshot::Sender<()>, JoinHandle<usize>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        scheduler
            .run_until(async {
                let _ = shutdown_rx.await;
            })
            .await
    });
    (shutdown_tx, handle)
}

#[tokio::test(start_paused = true)]
async fn failed_pass_is_retried_on_next_tick() {
    let resolver = ScriptedIpResolver::failing_once_then(IP);
    let provider = InMemoryProvider::new();
    provider.insert("Z1", a_record("home.example.com.", "198.51.100.1"));

    let scheduler = build_scheduler(&resolver, &provider, Duration::ZERO);
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    shutdown_tx.send(()).unwrap();

    let passes = handle.await.expect("scheduler task must not panic");
    assert_eq!(passes, 2);
    assert_eq!(resolver.resolve_call_count(), 2);
    assert_eq!(
        provider.upsert_call_count(),
        1,
        "Second pass should repair the record after the first one failed"
    );
}

#[tokio::test(start_paused = true)]
async fn panicking_pass_does_not_stop_scheduler() {
    let resolver = ScriptedIpResolver::new(IP);
    let provider = InMemoryProvider::new();
    provider.insert("Z1", a_record("home.example.com.", "198.51.100.1"));
    provider.panic_on_next_list();

    let scheduler = build_scheduler(&resolver, &provider, Duration::ZERO);
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    shutdown_tx.send(()).unwrap();

    let passes = handle.await.expect("panic must stay inside the pass");
    assert_eq!(passes, 2);
    assert_eq!(provider.list_calls().len(), 1);
    assert_eq!(provider.upsert_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn passes_never_overlap() {
    let resolver = ScriptedIpResolver::new(IP);
    let provider = InMemoryProvider::new().with_list_delay(Duration::from_millis(2_500));
    provider.insert("Z1", a_record("home.example.com.", "198.51.100.1"));

    let scheduler = build_scheduler(&resolver, &provider, Duration::ZERO);
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    // Pass 1 runs 0..2500ms, missed ticks are skipped, pass 2 starts at 3000ms
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    shutdown_tx.send(()).unwrap();

    let passes = handle.await.unwrap();
    assert_eq!(passes, 2, "Missed ticks must not fire in a burst");
    assert_eq!(provider.max_concurrent_lists(), 1);
    assert_eq!(provider.list_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_in_flight_pass() {
    let resolver = ScriptedIpResolver::new(IP);
    let provider = InMemoryProvider::new().with_list_delay(Duration::from_millis(2_500));
    provider.insert("Z1", a_record("home.example.com.", "198.51.100.1"));

    let scheduler = build_scheduler(&resolver, &provider, Duration::ZERO);
    let started = tokio::time::Instant::now();
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    shutdown_tx.send(()).unwrap();
    assert_eq!(provider.upsert_call_count(), 0, "pass is still listing");

    let passes = handle.await.unwrap();
    assert_eq!(passes, 1);
    assert_eq!(
        provider.upsert_call_count(),
        1,
        "In-flight pass must complete its upsert before shutdown"
    );
    assert!(started.elapsed() >= Duration::from_millis(2_500));
}

#[tokio::test(start_paused = true)]
async fn first_pass_waits_for_startup_delay() {
    let resolver = ScriptedIpResolver::new(IP);
    let provider = InMemoryProvider::new();
    provider.insert("Z1", a_record("home.example.com.", IP));

    let scheduler = build_scheduler(&resolver, &provider, Duration::from_millis(5_000));
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    tokio::time::sleep(Duration::from_millis(4_000)).await;
    assert_eq!(resolver.resolve_call_count(), 0);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(resolver.resolve_call_count(), 1);

    shutdown_tx.send(()).unwrap();
    assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test]
async fn run_pass_reports_status_at_boundary() {
    let resolver = ScriptedIpResolver::failing_once_then(IP);
    let provider = InMemoryProvider::new();
    provider.insert("Z1", a_record("home.example.com.", "198.51.100.1"));

    let scheduler = build_scheduler(&resolver, &provider, Duration::ZERO);

    assert_eq!(scheduler.run_pass().await, PassStatus::Failed);
    assert_eq!(scheduler.run_pass().await, PassStatus::Succeeded);

    provider.panic_on_next_list();
    assert_eq!(scheduler.run_pass().await, PassStatus::Panicked);

    assert_eq!(scheduler.run_pass().await, PassStatus::Succeeded);
    assert_eq!(provider.upsert_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_first_tick_runs_no_pass() {
    let resolver = ScriptedIpResolver::new(IP);
    let provider = InMemoryProvider::new();

    let scheduler = build_scheduler(&resolver, &provider, Duration::from_millis(1_000));
    let (shutdown_tx, handle) = spawn_scheduler(scheduler);

    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(result.is_ok(), "Scheduler should terminate within 5 seconds");
    assert_eq!(result.unwrap().unwrap(), 0);
    assert_eq!(resolver.resolve_call_count(), 0);
}
