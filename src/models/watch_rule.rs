use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchRule {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub owner_id: ObjectId,
    pub target_item_id: ObjectId,

    pub target_price: f64,
    pub direction: Direction,

    pub active: bool,
    #[serde(default)]
    pub triggered_at: Option<i64>,

    #[serde(default)]
    pub created_at: i64,
}
