//! Background timer that drives the staleness sweep.
//!
//! Spawns a tokio task that runs one sweep per tick. Ticks run strictly one
//! after another, so two sweeps never overlap.

use crate::services::staleness_sweep::StalenessSweep;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Default interval between sweeps (seconds).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

pub struct SweepScheduler;

impl SweepScheduler {
    /// Start the sweep loop. The first sweep runs immediately.
    pub fn spawn(sweep: Arc<StalenessSweep>, period: Duration) -> SweepHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!("Staleness sweep scheduled every {:?}", period);
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                match sweep.run_once().await {
                    Ok(report) if report.notified > 0 || report.failed > 0 => {
                        info!(
                            evaluated = report.evaluated,
                            notified = report.notified,
                            failed = report.failed,
                            cooling_down = report.cooling_down,
                            "Staleness sweep finished"
                        );
                    }
                    Ok(report) => {
                        debug!(evaluated = report.evaluated, "Staleness sweep found nothing to do");
                    }
                    Err(e) => error!("Staleness sweep failed: {}", e),
                }
            }

            info!("Staleness sweep stopped");
        });

        SweepHandle { cancel, task }
    }
}

/// Owned handle to the running sweep loop.
pub struct SweepHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop the loop and wait for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("Sweep task ended abnormally: {}", e);
        }
    }
}
