use std::sync::Arc;

use cardboom_jobs::error::JobError;
use cardboom_jobs::models::{Direction, MarketItem, WatchRule};
use cardboom_jobs::services::{
    batch::BatchReport,
    memory::{MemoryGradingTrigger, MemoryNotifier, MemoryStore},
    price_alerts,
    store::JobStore,
};
use cardboom_jobs::{config, templates, AppState};
use mongodb::bson::oid::ObjectId;

const NOW: i64 = 1_700_000_000;

struct Harness {
    state: AppState,
    store: Arc<MemoryStore>,
    notifier: Arc<MemoryNotifier>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(16);

    let state = AppState {
        store: store.clone(),
        notifier: notifier.clone(),
        grading: Arc::new(MemoryGradingTrigger::new()),
        hbs: templates::build_handlebars().expect("templates"),
        settings: config::Settings::default(),
        events_tx,
    };

    Harness {
        state,
        store,
        notifier,
    }
}

fn item(store: &MemoryStore, name: &str, price: f64) -> ObjectId {
    let id = ObjectId::new();
    store.upsert_market_item(MarketItem {
        id,
        name: name.to_string(),
        current_price: price,
    });
    id
}

fn rule(
    store: &MemoryStore,
    item_id: ObjectId,
    direction: Direction,
    target_price: f64,
) -> WatchRule {
    let r = WatchRule {
        id: ObjectId::new(),
        owner_id: ObjectId::new(),
        target_item_id: item_id,
        target_price,
        direction,
        active: true,
        triggered_at: None,
        created_at: NOW - 3600,
    };
    store.insert_watch_rule(r.clone());
    r
}

#[tokio::test]
async fn price_below_target_triggers_once_and_notifies() {
    let h = harness();
    let item_id = item(&h.store, "Charizard Holo", 95.0);
    let r = rule(&h.store, item_id, Direction::Below, 100.0);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(
        report,
        BatchReport {
            checked: 1,
            transitioned: 1,
            ..Default::default()
        }
    );

    let stored = h.store.watch_rule(r.id).unwrap();
    assert!(!stored.active);
    assert_eq!(stored.triggered_at, Some(NOW));

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_id, r.owner_id);
    assert_eq!(sent[0].kind, "price_alert");
    assert_eq!(sent[0].title, "Price Alert Triggered!");
    assert!(sent[0].body.contains("95"));
    assert!(sent[0].body.contains("100"));
    assert!(sent[0].body.contains("Charizard Holo"));
    assert_eq!(sent[0].data["watch_rule_id"], r.id.to_hex());
    assert_eq!(sent[0].data["direction"], "below");
}

#[tokio::test]
async fn price_above_below_target_does_nothing() {
    let h = harness();
    let item_id = item(&h.store, "Pikachu Promo", 105.0);
    let r = rule(&h.store, item_id, Direction::Below, 100.0);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.transitioned, 0);

    let stored = h.store.watch_rule(r.id).unwrap();
    assert!(stored.active);
    assert_eq!(stored.triggered_at, None);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn above_rule_triggers_on_rise() {
    let h = harness();
    let item_id = item(&h.store, "Blastoise", 250.0);
    rule(&h.store, item_id, Direction::Above, 200.0);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(report.transitioned, 1);
    assert!(h.notifier.sent()[0].body.contains("rose to $250.00"));
}

#[tokio::test]
async fn repeated_runs_do_not_renotify() {
    let h = harness();
    let item_id = item(&h.store, "Mewtwo", 50.0);
    rule(&h.store, item_id, Direction::Below, 60.0);

    let first = price_alerts::run(&h.state, NOW, false).await.unwrap();
    let second = price_alerts::run(&h.state, NOW + 60, false).await.unwrap();
    let third = price_alerts::run(&h.state, NOW + 120, false).await.unwrap();

    assert_eq!(first.transitioned, 1);
    assert_eq!(second.checked, 0);
    assert_eq!(third.transitioned, 0);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn concurrent_runs_notify_once_per_rule() {
    let h = harness();
    let item_id = item(&h.store, "Lugia", 10.0);
    for _ in 0..5 {
        rule(&h.store, item_id, Direction::Below, 20.0);
    }

    let a = h.state.clone();
    let b = h.state.clone();
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { price_alerts::run(&a, NOW, false).await }),
        tokio::spawn(async move { price_alerts::run(&b, NOW, false).await }),
    );
    let ra = ra.unwrap().unwrap();
    let rb = rb.unwrap().unwrap();

    assert_eq!(ra.transitioned + rb.transitioned, 5);
    assert_eq!(ra.failed + rb.failed, 0);
    assert_eq!(h.notifier.sent().len(), 5);
}

#[tokio::test]
async fn conditional_update_only_wins_once() {
    let h = harness();
    let item_id = item(&h.store, "Snorlax", 10.0);
    let r = rule(&h.store, item_id, Direction::Below, 20.0);

    assert!(h.store.deactivate_watch_rule(r.id, NOW).await.unwrap());
    assert!(!h.store.deactivate_watch_rule(r.id, NOW + 1).await.unwrap());
    assert_eq!(h.store.watch_rule(r.id).unwrap().triggered_at, Some(NOW));
}

#[tokio::test]
async fn one_write_failure_does_not_abort_the_batch() {
    let h = harness();
    let item_id = item(&h.store, "Gengar", 5.0);
    let rules: Vec<WatchRule> = (0..10)
        .map(|_| rule(&h.store, item_id, Direction::Below, 10.0))
        .collect();
    h.store.fail_writes_for(rules[4].id);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(report.checked, 10);
    assert_eq!(report.transitioned, 9);
    assert_eq!(report.failed, 1);

    for (i, r) in rules.iter().enumerate() {
        let stored = h.store.watch_rule(r.id).unwrap();
        assert_eq!(stored.active, i == 4, "rule #{}", i + 1);
    }
    assert_eq!(h.notifier.sent().len(), 9);
}

#[tokio::test]
async fn unreachable_store_aborts_the_batch() {
    let h = harness();
    let item_id = item(&h.store, "Eevee", 5.0);
    let r = rule(&h.store, item_id, Direction::Below, 10.0);
    h.store.set_unavailable(true);

    let err = price_alerts::run(&h.state, NOW, false).await.unwrap_err();
    assert!(matches!(err, JobError::StoreUnavailable(_)));
    assert!(err.is_batch_level());

    h.store.set_unavailable(false);
    assert!(h.store.watch_rule(r.id).unwrap().active);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn failed_notification_keeps_the_transition() {
    let h = harness();
    let item_id = item(&h.store, "Dragonite", 5.0);
    let r = rule(&h.store, item_id, Direction::Below, 10.0);
    h.notifier.set_failing(true);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(report.transitioned, 1);
    assert_eq!(report.notify_failed, 1);
    assert_eq!(report.failed, 0);
    assert!(!h.store.watch_rule(r.id).unwrap().active);
}

#[tokio::test]
async fn missing_price_never_triggers() {
    let h = harness();
    let r = rule(&h.store, ObjectId::new(), Direction::Below, 1_000.0);

    let report = price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.transitioned, 0);
    assert!(h.store.watch_rule(r.id).unwrap().active);
}

#[tokio::test]
async fn dry_run_counts_without_writing() {
    let h = harness();
    let item_id = item(&h.store, "Gyarados", 5.0);
    let r = rule(&h.store, item_id, Direction::Below, 10.0);

    let report = price_alerts::run(&h.state, NOW, true).await.unwrap();
    assert_eq!(report.transitioned, 1);
    assert!(h.store.watch_rule(r.id).unwrap().active);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn triggered_batch_broadcasts_update_event() {
    let h = harness();
    let mut rx = h.state.events_tx.subscribe();
    let item_id = item(&h.store, "Umbreon", 5.0);
    rule(&h.store, item_id, Direction::Below, 10.0);

    price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert_eq!(rx.try_recv().unwrap(), price_alerts::EVENT);
}

#[tokio::test]
async fn quiet_batch_broadcasts_nothing() {
    let h = harness();
    let mut rx = h.state.events_tx.subscribe();
    let item_id = item(&h.store, "Umbreon", 50.0);
    rule(&h.store, item_id, Direction::Below, 10.0);

    price_alerts::run(&h.state, NOW, false).await.unwrap();
    assert!(rx.try_recv().is_err());
}
