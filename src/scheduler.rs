// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Periodic execution of reconciliation cycles.
//!
//! The scheduler waits `initial_delay`, runs a cycle, then waits `interval`
//! after each cycle completes. Cycles never overlap. A failed cycle is
//! logged and counted, and the next one runs on schedule.
//!
//! Cancellation is observed while waiting. A cycle already in progress runs
//! to completion so the monitoring session is always closed.

use crate::metrics;
use crate::reconciler::CycleReport;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Run one cycle, log its outcome and record cycle metrics.
///
/// # Errors
///
/// Returns the cycle's error unchanged.
pub async fn timed_cycle<Fut>(cycle: Fut) -> Result<CycleReport>
where
    Fut: Future<Output = Result<CycleReport>>,
{
    let started = Instant::now();
    let result = cycle.await;
    let elapsed = started.elapsed();

    match &result {
        Ok(report) => {
            metrics::record_cycle_success(elapsed, report);
            info!(
                duration_ms = elapsed.as_millis(),
                hosts = report.hosts_discovered,
                owned_monitors = report.owned_monitors,
                deleted = report.sync.deleted.len(),
                delete_failures = report.sync.delete_failures.len(),
                created = report.sync.created.len(),
                "Reconciliation cycle completed"
            );
        }
        Err(e) => {
            metrics::record_cycle_error(elapsed);
            error!(
                duration_ms = elapsed.as_millis(),
                error = %format!("{e:#}"),
                "Reconciliation cycle failed"
            );
        }
    }

    result
}

/// Fixed-delay cycle runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
        }
    }

    /// Run cycles until `shutdown` is cancelled and return how many ran.
    pub async fn run<F, Fut>(&self, shutdown: CancellationToken, mut cycle: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CycleReport>>,
    {
        info!(
            initial_delay_secs = self.initial_delay.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Starting reconciliation scheduler"
        );

        let mut cycles = 0;
        let mut delay = self.initial_delay;

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!(cycles, "Reconciliation scheduler stopped");
                    return cycles;
                }
                () = sleep(delay) => {}
            }

            // failures are already logged and counted
            let _ = timed_cycle(cycle()).await;
            cycles += 1;
            delay = self.interval;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
