use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,

    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,

    // free-form payload the UI uses for deep links
    pub data: serde_json::Value,

    pub created_at: i64,
    pub read: bool,
}
