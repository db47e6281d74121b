use std::time::Duration;

use chrono::Utc;
use tokio::time;

use super::{grading_countdown, price_alerts};
use crate::AppState;

/// Runs both jobs every `job_interval_secs` inside this process.
///
/// Returns without spawning when the interval is 0, leaving invocation to an
/// external scheduler hitting the `/jobs/*` endpoints.
pub fn spawn_job_scheduler(state: AppState) {
    let secs = state.settings.job_interval_secs;
    if secs == 0 {
        tracing::info!("in-process job scheduler disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(secs));
        // a slow tick shouldn't cause a burst of catch-up runs
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            run_tick(&state).await;
        }
    });

    tracing::info!(interval_secs = secs, "in-process job scheduler started");
}

async fn run_tick(state: &AppState) {
    let now = Utc::now().timestamp();

    if let Err(e) = price_alerts::run(state, now, false).await {
        tracing::error!(job = "price-alerts", error = %e, "job tick failed");
    }

    if let Err(e) = grading_countdown::run(state, now, false).await {
        tracing::error!(job = "grading-countdown", error = %e, "job tick failed");
    }
}
