//! In-memory backends for the job collaborators.
//!
//! Backs the test suite. The store keeps every collection behind one mutex so
//! the conditional updates are atomic the same way a single-document Mongo
//! update is.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use super::{
    grading_client::GradingTrigger,
    notifier::{NewNotification, Notifier},
    store::JobStore,
};
use crate::{
    error::JobError,
    models::{GradingOrder, GradingStatus, MarketItem, WatchRule},
};

#[derive(Default)]
struct Tables {
    // insertion order is the scan order
    watch_rules: Vec<WatchRule>,
    grading_orders: Vec<GradingOrder>,
    market_items: HashMap<ObjectId, MarketItem>,
    failing_writes: HashSet<ObjectId>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, JobError> {
        self.tables
            .lock()
            .map_err(|_| JobError::StoreUnavailable("memory store poisoned".to_string()))
    }

    fn check_available(&self) -> Result<(), JobError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(JobError::StoreUnavailable("store offline".to_string()));
        }
        Ok(())
    }

    pub fn insert_watch_rule(&self, rule: WatchRule) {
        if let Ok(mut t) = self.lock() {
            t.watch_rules.push(rule);
        }
    }

    pub fn insert_grading_order(&self, order: GradingOrder) {
        if let Ok(mut t) = self.lock() {
            t.grading_orders.push(order);
        }
    }

    pub fn upsert_market_item(&self, item: MarketItem) {
        if let Ok(mut t) = self.lock() {
            t.market_items.insert(item.id, item);
        }
    }

    /// Every subsequent conditional update of `id` fails with `RecordWriteFailed`.
    pub fn fail_writes_for(&self, id: ObjectId) {
        if let Ok(mut t) = self.lock() {
            t.failing_writes.insert(id);
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn watch_rule(&self, id: ObjectId) -> Option<WatchRule> {
        let t = self.lock().ok()?;
        t.watch_rules.iter().find(|r| r.id == id).cloned()
    }

    pub fn grading_order(&self, id: ObjectId) -> Option<GradingOrder> {
        let t = self.lock().ok()?;
        t.grading_orders.iter().find(|o| o.id == id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn active_watch_rules(&self) -> Result<Vec<WatchRule>, JobError> {
        self.check_available()?;
        let t = self.lock()?;
        Ok(t.watch_rules.iter().filter(|r| r.active).cloned().collect())
    }

    async fn current_prices(
        &self,
        item_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, MarketItem>, JobError> {
        self.check_available()?;
        let t = self.lock()?;
        Ok(item_ids
            .iter()
            .filter_map(|id| t.market_items.get(id).map(|i| (*id, i.clone())))
            .collect())
    }

    async fn deactivate_watch_rule(&self, id: ObjectId, now: i64) -> Result<bool, JobError> {
        let mut t = self.lock()?;
        if t.failing_writes.contains(&id) {
            return Err(JobError::RecordWriteFailed {
                id: id.to_hex(),
                reason: "injected write failure".to_string(),
            });
        }

        match t.watch_rules.iter_mut().find(|r| r.id == id && r.active) {
            Some(rule) => {
                rule.active = false;
                rule.triggered_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn queued_grading_orders(&self) -> Result<Vec<GradingOrder>, JobError> {
        self.check_available()?;
        let t = self.lock()?;
        Ok(t.grading_orders
            .iter()
            .filter(|o| o.status == GradingStatus::Queued && o.paid_at.is_some())
            .cloned()
            .collect())
    }

    async fn start_grading(&self, id: ObjectId, now: i64) -> Result<bool, JobError> {
        let mut t = self.lock()?;
        if t.failing_writes.contains(&id) {
            return Err(JobError::RecordWriteFailed {
                id: id.to_hex(),
                reason: "injected write failure".to_string(),
            });
        }

        match t
            .grading_orders
            .iter_mut()
            .find(|o| o.id == id && o.status == GradingStatus::Queued)
        {
            Some(order) => {
                order.status = GradingStatus::Grading;
                order.grading_started_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), JobError> {
        self.check_available()
    }
}

#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<NewNotification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn emit(&self, n: NewNotification) -> Result<(), JobError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JobError::NotificationDeliveryFailed("notifier offline".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| JobError::NotificationDeliveryFailed("notifier poisoned".to_string()))?
            .push(n);
        Ok(())
    }
}

/// Records which orders were handed to grading.
#[derive(Default)]
pub struct MemoryGradingTrigger {
    triggered: Mutex<Vec<ObjectId>>,
    failing: AtomicBool,
}

impl MemoryGradingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn triggered(&self) -> Vec<ObjectId> {
        self.triggered.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GradingTrigger for MemoryGradingTrigger {
    async fn trigger(&self, order_id: ObjectId) -> Result<(), JobError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JobError::GradingTriggerFailed("grading service offline".to_string()));
        }
        self.triggered
            .lock()
            .map_err(|_| JobError::GradingTriggerFailed("trigger poisoned".to_string()))?
            .push(order_id);
        Ok(())
    }
}
