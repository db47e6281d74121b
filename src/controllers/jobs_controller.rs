use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::JobError,
    services::{batch::BatchReport, grading_countdown, price_alerts},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    #[serde(default)]
    pub dry_run: bool,
}

fn report_response(report: BatchReport, transitioned_key: &str, dry_run: bool) -> Response {
    let mut body = json!({
        "success": true,
        "checked": report.checked,
        "failed": report.failed,
        "skipped": report.skipped,
        "notify_failed": report.notify_failed,
        "dry_run": dry_run,
    });
    body[transitioned_key] = json!(report.transitioned);

    (StatusCode::OK, Json(body)).into_response()
}

fn error_response(job: &str, e: JobError) -> Response {
    tracing::error!(job, error = %e, "job aborted");

    let status = if e.is_batch_level() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(json!({ "success": false, "error": e.to_string() }))).into_response()
}

// POST /jobs/price-alerts
pub async fn post_price_alerts(
    State(state): State<AppState>,
    Query(q): Query<JobQuery>,
) -> Response {
    let now = Utc::now().timestamp();

    match price_alerts::run(&state, now, q.dry_run).await {
        Ok(report) => report_response(report, "triggered", q.dry_run),
        Err(e) => error_response("price-alerts", e),
    }
}

// POST /jobs/grading-countdown
pub async fn post_grading_countdown(
    State(state): State<AppState>,
    Query(q): Query<JobQuery>,
) -> Response {
    let now = Utc::now().timestamp();

    match grading_countdown::run(&state, now, q.dry_run).await {
        Ok(report) => report_response(report, "processed", q.dry_run),
        Err(e) => error_response("grading-countdown", e),
    }
}
