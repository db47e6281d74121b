use axum::{Router, middleware::from_fn_with_state, routing::post};
use crate::{AppState, controllers::jobs_controller};

pub fn add_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let jobs = Router::<AppState>::new()
        .route("/jobs/price-alerts", post(jobs_controller::post_price_alerts))
        .route("/jobs/grading-countdown", post(jobs_controller::post_grading_countdown))
        .route_layer(from_fn_with_state(state.clone(), crate::auth::require_service_role));

    router.merge(jobs)
}
