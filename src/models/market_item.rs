use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,
    pub current_price: f64,
}
