use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::Database;

use super::store::NOTIFICATIONS;
use crate::{error::JobError, models::Notification};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: ObjectId,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// Persists user-facing notifications. Delivery (push, in-app) happens downstream.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, n: NewNotification) -> Result<(), JobError>;
}

#[derive(Clone)]
pub struct MongoNotifier {
    db: Database,
}

impl MongoNotifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Notifier for MongoNotifier {
    async fn emit(&self, n: NewNotification) -> Result<(), JobError> {
        let col = self.db.collection::<Notification>(NOTIFICATIONS);

        let row = Notification {
            id: ObjectId::new(),
            user_id: n.user_id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            data: n.data,
            created_at: Utc::now().timestamp(),
            read: false,
        };

        col.insert_one(&row, None)
            .await
            .map_err(|e| JobError::NotificationDeliveryFailed(e.to_string()))?;

        Ok(())
    }
}
