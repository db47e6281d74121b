use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::Database;
use serde::de::DeserializeOwned;

use crate::{
    error::JobError,
    models::{GradingOrder, MarketItem, WatchRule},
};

pub const WATCH_RULES: &str = "watch_rules";
pub const GRADING_ORDERS: &str = "grading_orders";
pub const MARKET_ITEMS: &str = "market_items";
pub const NOTIFICATIONS: &str = "notifications";

/// Record store the scheduled jobs scan and transition.
///
/// Scans are coarse pre-filters; the transition methods are conditional
/// updates that return `Ok(true)` only for the call that flipped the record.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn active_watch_rules(&self) -> Result<Vec<WatchRule>, JobError>;

    async fn current_prices(
        &self,
        item_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, MarketItem>, JobError>;

    async fn deactivate_watch_rule(&self, id: ObjectId, now: i64) -> Result<bool, JobError>;

    async fn queued_grading_orders(&self) -> Result<Vec<GradingOrder>, JobError>;

    async fn start_grading(&self, id: ObjectId, now: i64) -> Result<bool, JobError>;

    async fn ping(&self) -> Result<(), JobError>;
}

/// Decodes one raw row into its typed model.
///
/// Rows that don't fit (unknown enum value, wrong field type) are logged and
/// dropped, so the jobs never transition them.
pub fn decode_row<T: DeserializeOwned>(collection: &str, raw: Document) -> Option<T> {
    let id = raw
        .get_object_id("_id")
        .map(|id| id.to_hex())
        .unwrap_or_else(|_| "?".to_string());

    match bson::from_document::<T>(raw) {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::warn!(collection, id = %id, error = %e, "skipping malformed row");
            None
        }
    }
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn scan<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<Vec<T>, JobError> {
        let col = self.db.collection::<Document>(collection);

        let mut cursor = col
            .find(filter, None)
            .await
            .map_err(|e| JobError::StoreUnavailable(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            let raw = res.map_err(|e| JobError::StoreUnavailable(e.to_string()))?;
            items.extend(decode_row(collection, raw));
        }

        Ok(items)
    }
}

#[async_trait]
impl JobStore for MongoStore {
    async fn active_watch_rules(&self) -> Result<Vec<WatchRule>, JobError> {
        self.scan(WATCH_RULES, doc! { "active": true }).await
    }

    async fn current_prices(
        &self,
        item_ids: &[ObjectId],
    ) -> Result<HashMap<ObjectId, MarketItem>, JobError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let items: Vec<MarketItem> = self
            .scan(MARKET_ITEMS, doc! { "_id": { "$in": item_ids.to_vec() } })
            .await?;

        Ok(items.into_iter().map(|i| (i.id, i)).collect())
    }

    async fn deactivate_watch_rule(&self, id: ObjectId, now: i64) -> Result<bool, JobError> {
        let col = self.db.collection::<Document>(WATCH_RULES);

        let res = col
            .update_one(
                doc! { "_id": id, "active": true },
                doc! { "$set": { "active": false, "triggered_at": now } },
                None,
            )
            .await
            .map_err(|e| JobError::RecordWriteFailed {
                id: id.to_hex(),
                reason: e.to_string(),
            })?;

        Ok(res.matched_count > 0)
    }

    async fn queued_grading_orders(&self) -> Result<Vec<GradingOrder>, JobError> {
        self.scan(
            GRADING_ORDERS,
            doc! { "status": "queued", "paid_at": { "$ne": null } },
        )
        .await
    }

    async fn start_grading(&self, id: ObjectId, now: i64) -> Result<bool, JobError> {
        let col = self.db.collection::<Document>(GRADING_ORDERS);

        let res = col
            .update_one(
                doc! { "_id": id, "status": "queued" },
                doc! { "$set": { "status": "grading", "grading_started_at": now } },
                None,
            )
            .await
            .map_err(|e| JobError::RecordWriteFailed {
                id: id.to_hex(),
                reason: e.to_string(),
            })?;

        Ok(res.matched_count > 0)
    }

    async fn ping(&self) -> Result<(), JobError> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(|e| JobError::StoreUnavailable(e.to_string()))
    }
}
