use axum::{Router, routing::get};
use crate::{AppState, controllers::health_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/health", get(health_controller::health))
        .route("/health/db", get(health_controller::health_db))
}
