use mongodb::{
    bson::doc,
    Database, IndexModel,
};

use super::store::{GRADING_ORDERS, NOTIFICATIONS, WATCH_RULES};

pub async fn ensure_indexes(db: &Database) -> Result<(), String> {
    // watch_rules: price alert scan filters on active
    {
        let col = db.collection::<mongodb::bson::Document>(WATCH_RULES);
        let model = IndexModel::builder()
            .keys(doc! { "active": 1, "target_item_id": 1 })
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // grading_orders: countdown scan (status + paid_at)
    {
        let col = db.collection::<mongodb::bson::Document>(GRADING_ORDERS);
        let model = IndexModel::builder()
            .keys(doc! { "status": 1, "paid_at": 1 })
            .build();

        col.create_index(model, None)
            .await
            .map_err(|e| e.to_string())?;
    }

    // notifications: UI lists newest first per user
    {
        let col = db.collection::<mongodb::bson::Document>(NOTIFICATIONS);
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();

        let _ = col.create_index(model, None).await;
    }

    Ok(())
}
