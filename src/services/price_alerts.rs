use std::collections::{HashMap, HashSet};

use mongodb::bson::oid::ObjectId;
use serde_json::json;

use super::{
    batch::{self, BatchReport, RecordOutcome},
    notifier::NewNotification,
    predicates,
};
use crate::{
    error::JobError,
    models::{Direction, MarketItem, WatchRule},
    templates, AppState,
};

pub const EVENT: &str = "watchRulesUpdated";
pub const KIND: &str = "price_alert";

fn fmt2(x: f64) -> String {
    format!("{:.2}", x)
}

/// One pass over every active watch rule.
///
/// Fails only when the store can't be read; per-rule write errors are counted.
pub async fn run(state: &AppState, now: i64, dry_run: bool) -> Result<BatchReport, JobError> {
    let rules = state.store.active_watch_rules().await?;

    // one price read per item, however many rules point at it
    let mut seen = HashSet::new();
    let item_ids: Vec<_> = rules
        .iter()
        .map(|r| r.target_item_id)
        .filter(|id| seen.insert(*id))
        .collect();
    let prices = state.store.current_prices(&item_ids).await?;

    let mut report = BatchReport {
        checked: rules.len(),
        ..Default::default()
    };

    let hits = matching_rules(rules, &prices);

    tracing::debug!(
        checked = report.checked,
        items = item_ids.len(),
        hits = hits.len(),
        dry_run,
        "price alert scan"
    );

    let outcomes = batch::process_all(hits, state.settings.job_concurrency, |(rule, item)| {
        apply(state, rule, item, now, dry_run)
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
        triggered = report.transitioned,
        failed = report.failed,
        skipped = report.skipped,
        notify_failed = report.notify_failed,
        dry_run,
        "price alert check done"
    );

    Ok(report)
}

fn matching_rules(
    rules: Vec<WatchRule>,
    prices: &HashMap<ObjectId, MarketItem>,
) -> Vec<(WatchRule, MarketItem)> {
    rules
        .into_iter()
        .filter_map(|rule| {
            let item = prices.get(&rule.target_item_id)?;
            predicates::is_triggered(&rule, item.current_price).then(|| (rule, item.clone()))
        })
        .collect()
}

async fn apply(
    state: &AppState,
    rule: WatchRule,
    item: MarketItem,
    now: i64,
    dry_run: bool,
) -> RecordOutcome {
    if dry_run {
        return RecordOutcome::Transitioned { notify_failed: 0 };
    }

    match state.store.deactivate_watch_rule(rule.id, now).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(rule_id = %rule.id, "watch rule already triggered");
            return RecordOutcome::AlreadyTransitioned;
        }
        Err(e) => {
            tracing::warn!(rule_id = %rule.id, error = %e, "failed to deactivate watch rule");
            return RecordOutcome::Failed;
        }
    }

    let notify_failed = match notify(state, &rule, &item).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!(
                rule_id = %rule.id,
                user_id = %rule.owner_id,
                error = %e,
                "price alert notification not sent"
            );
            1
        }
    };

    RecordOutcome::Transitioned { notify_failed }
}

async fn notify(state: &AppState, rule: &WatchRule, item: &MarketItem) -> Result<(), JobError> {
    let ctx = json!({
        "item_name": item.name,
        "current_price": fmt2(item.current_price),
        "target_price": fmt2(rule.target_price),
        "below": rule.direction == Direction::Below,
    });

    let title = templates::render(&state.hbs, templates::PRICE_ALERT_TITLE, &ctx)?;
    let body = templates::render(&state.hbs, templates::PRICE_ALERT_BODY, &ctx)?;

    state
        .notifier
        .emit(NewNotification {
            user_id: rule.owner_id,
            kind: KIND.to_string(),
            title,
            body,
            data: json!({
                "watch_rule_id": rule.id.to_hex(),
                "item_id": item.id.to_hex(),
                "current_price": item.current_price,
                "target_price": rule.target_price,
                "direction": rule.direction.as_str(),
            }),
        })
        .await
}
