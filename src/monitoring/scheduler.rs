//! Periodic monitoring scheduler.
//!
//! Drives [`PodMonitor`] on a fixed interval from a single background task.
//! Cycles run to completion inside that task, so they never overlap; a slow
//! cycle simply delays the next tick. Shutdown is a single-shot cancellation
//! that is safe to request more than once.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::monitoring::monitor::PodMonitor;

/// Schedules monitoring cycles until shut down.
pub struct MonitorScheduler {
    monitor: Option<PodMonitor>,
    interval: Duration,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl MonitorScheduler {
    pub fn new(monitor: PodMonitor, interval: Duration) -> Self {
        Self {
            monitor: Some(monitor),
            interval,
            token: CancellationToken::new(),
            handle: None,
        }
    }

    /// Start the background monitoring task. The first cycle runs one full
    /// interval after start. Calling `start` again has no effect.
    pub fn start(&mut self) {
        let Some(monitor) = self.monitor.take() else {
            return;
        };

        info!(interval_secs = self.interval.as_secs_f64(), "starting periodic monitoring");

        let token = self.token.clone();
        let period = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    // Check the stop signal first so no cycle starts once
                    // shutdown has been requested.
                    biased;
                    () = token.cancelled() => {
                        info!("stopping monitoring");
                        return;
                    }
                    _ = ticker.tick() => {
                        debug!("starting scheduled monitoring check");
                        if let Err(err) = monitor.run().await {
                            error!(error = %err, "scheduled monitoring run failed");
                        }
                    }
                }
            }
        }));
    }

    /// Raise the stop signal and return immediately without waiting for an
    /// in-flight cycle to finish. Idempotent: repeated calls are no-ops.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Wait for the background task to observe the stop signal and exit.
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                error!(error = %err, "monitoring task terminated abnormally");
            }
        }
    }
}
