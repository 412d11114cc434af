//! Signal poller
//!
//! Runs the pipeline on a fixed cadence. A failed cycle is logged and the next
//! tick tries again; there is no retry inside a cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::pipeline::SignalPipeline;

pub async fn run_signal_poller(pipeline: Arc<SignalPipeline>, poll_every: Duration) {
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        symbol = %pipeline.symbol(),
        every_ms = poll_every.as_millis() as u64,
        "signal poller started"
    );

    loop {
        ticker.tick().await;

        match pipeline.run_cycle().await {
            Ok(report) => {
                info!(
                    trace_id = %report.trace_id,
                    points = report.points,
                    alerts = report.alerts.len(),
                    state_persisted = report.state_persisted,
                    "signal cycle complete"
                );
            }
            Err(e) => {
                error!(error = %e, symbol = %pipeline.symbol(), "signal cycle failed");
            }
        }
    }
}
