//! Fixed-interval scheduler
//!
//! The [`Scheduler`] drives [`Reconciler::reconcile_once`] for the lifetime of
//! the process.
//!
//! ## Pass isolation
//!
//! Every pass runs in its own task. An error returned by the pass, or a panic
//! inside it, is logged at the pass boundary and the loop continues with the
//! next tick.
//!
//! ## Serialization
//!
//! The loop awaits each pass before waiting for the next tick, so passes never
//! overlap. Ticks missed while a long pass was running are skipped rather than
//! fired in a burst.
//!
//! ## Shutdown
//!
//! The shutdown future is only observed between passes: a pass that is in
//! flight when the signal arrives is allowed to finish.

use crate::engine::Reconciler;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

/// Outcome of one scheduled pass, as seen from the pass boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// The pass returned `Ok`
    Succeeded,
    /// The pass returned an error
    Failed,
    /// The pass panicked
    Panicked,
}

/// Periodic driver for a [`Reconciler`]
pub struct Scheduler {
    /// Shared reconciler; each pass task holds a clone
    reconciler: Arc<Reconciler>,

    /// Period between pass starts
    interval: Duration,

    /// Delay before the first pass
    startup_delay: Duration,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Parameters
    ///
    /// - `reconciler`: The reconciler to drive
    /// - `interval`: Period between passes (clamped to at least 1ms)
    /// - `startup_delay`: Delay before the first pass
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration, startup_delay: Duration) -> Self {
        Self {
            reconciler,
            interval: interval.max(Duration::from_millis(1)),
            startup_delay,
        }
    }

    /// Run passes until `shutdown` resolves
    ///
    /// Returns the number of passes that were started.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Scheduler started (interval={:?}, startup_delay={:?})",
            self.interval, self.startup_delay
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.startup_delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut passes = 0;
        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!("Shutdown signal received, scheduler stopping");
                    break;
                }

                _ = ticker.tick() => {
                    passes += 1;
                    self.run_pass().await;
                }
            }
        }

        info!("Scheduler stopped after {} pass(es)", passes);
        passes
    }

    /// Run a single pass behind the isolation boundary
    pub async fn run_pass(&self) -> PassStatus {
        let reconciler = Arc::clone(&self.reconciler);
        let handle = tokio::spawn(async move { reconciler.reconcile_once().await });

        match handle.await {
            Ok(Ok(())) => PassStatus::Succeeded,
            Ok(Err(e)) => {
                error!(error = %e, "reconciliation pass failed");
                PassStatus::Failed
            }
            Err(join_error) => {
                error!(error = %join_error, "reconciliation pass panicked");
                PassStatus::Panicked
            }
        }
    }
}
