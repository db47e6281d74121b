use serde_json::json;

use super::{
    batch::{self, BatchReport, RecordOutcome},
    notifier::NewNotification,
    predicates,
};
use crate::{error::JobError, models::GradingOrder, templates, AppState};

pub const EVENT: &str = "gradingOrdersUpdated";
pub const KIND: &str = "grading_started";

/// Moves every paid, queued order whose tier delay has run out into `grading`.
pub async fn run(state: &AppState, now: i64, dry_run: bool) -> Result<BatchReport, JobError> {
    let orders = state.store.queued_grading_orders().await?;

    let mut report = BatchReport {
        checked: orders.len(),
        ..Default::default()
    };

    let next_due_in = orders
        .iter()
        .filter_map(|o| predicates::remaining(o, now))
        .filter(|secs| *secs > 0)
        .min();

    let expired: Vec<GradingOrder> = orders
        .into_iter()
        .filter(|o| predicates::is_ready_for_grading(o, now))
        .collect();

    tracing::debug!(
        checked = report.checked,
        expired = expired.len(),
        next_due_in = ?next_due_in,
        dry_run,
        "grading countdown scan"
    );

    let outcomes = batch::process_all(expired, state.settings.job_concurrency, |order| {
        apply(state, order, now, dry_run)
    })
    .await;

    for outcome in outcomes {
        report.record(outcome);
    }

    if report.transitioned > 0 && !dry_run {
        let _ = state.events_tx.send(EVENT.to_string());
    }

    tracing::info!(
        checked = report.checked,
        processed = report.transitioned,
        failed = report.failed,
        skipped = report.skipped,
        notify_failed = report.notify_failed,
        dry_run,
        "grading countdown done"
    );

    Ok(report)
}

async fn apply(state: &AppState, order: GradingOrder, now: i64, dry_run: bool) -> RecordOutcome {
    if dry_run {
        return RecordOutcome::Transitioned { notify_failed: 0 };
    }

    match state.store.start_grading(order.id, now).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(order_id = %order.id, "grading order already started");
            return RecordOutcome::AlreadyTransitioned;
        }
        Err(e) => {
            tracing::warn!(order_id = %order.id, error = %e, "failed to start grading");
            return RecordOutcome::Failed;
        }
    }

    let mut notify_failed = 0;

    if let Err(e) = notify(state, &order).await {
        tracing::warn!(
            order_id = %order.id,
            user_id = %order.owner_id,
            error = %e,
            "grading notification not sent"
        );
        notify_failed += 1;
    }

    if let Err(e) = state.grading.trigger(order.id).await {
        tracing::error!(order_id = %order.id, error = %e, "grading trigger failed");
        notify_failed += 1;
    }

    RecordOutcome::Transitioned { notify_failed }
}

async fn notify(state: &AppState, order: &GradingOrder) -> Result<(), JobError> {
    let ctx = json!({
        "tier": order.speed_tier.as_str(),
        "card_name": order.card_name,
    });

    let title = templates::render(&state.hbs, templates::GRADING_STARTED_TITLE, &ctx)?;
    let body = templates::render(&state.hbs, templates::GRADING_STARTED_BODY, &ctx)?;

    state
        .notifier
        .emit(NewNotification {
            user_id: order.owner_id,
            kind: KIND.to_string(),
            title,
            body,
            data: json!({
                "order_id": order.id.to_hex(),
                "speed_tier": order.speed_tier.as_str(),
            }),
        })
        .await
}
