//! Periodic collection.
//!
//! # Responsibilities
//! - Trigger a collection cycle on every tick
//! - Stop on shutdown, letting an in-flight cycle observe cancellation

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::collector::Collector;

pub struct Scheduler {
    collector: Arc<Collector>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(collector: Arc<Collector>, interval: Duration) -> Self {
        Self { collector, interval }
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// The first cycle starts immediately. A cycle that overruns the
    /// interval delays the next tick instead of bursting.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Collector scheduler starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.collector.collect(&shutdown).await {
                        Ok(cycle) if !cycle.failures.is_empty() => {
                            tracing::warn!(
                                cycle_id = %cycle.cycle_id,
                                failed = cycle.failures.len(),
                                "Collection cycle finished with failures"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Collection cycle failed"),
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Collector scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
