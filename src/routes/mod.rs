use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{AppState, controllers::health_controller};

pub mod health_routes;
pub mod jobs_routes;
pub mod events_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = health_routes::add_routes(router);
    let router = jobs_routes::add_routes(router, &state);
    let router = events_routes::add_routes(router);

    router
        .fallback(health_controller::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
