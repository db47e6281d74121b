use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;

pub const SERVICE_ROLE: &str = "service_role";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub role: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Mints a short-lived service token. Used for outbound calls to other
/// services that share the job secret.
pub fn issue_service_token(secret: &str, ttl_secs: i64) -> Result<String, String> {
    let exp = (Utc::now() + Duration::seconds(ttl_secs)).timestamp() as usize;

    let claims = Claims {
        role: SERVICE_ROLE.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn is_service_token(secret: &str, token: &str) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims.role == SERVICE_ROLE)
    .unwrap_or(false)
}

/// Job endpoints are only for the scheduler.
pub async fn require_service_role(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = bearer_token(req.headers())
        .map(|t| is_service_token(&state.settings.job_jwt_secret, t))
        .unwrap_or(false);

    if !authorized {
        tracing::warn!(path = %req.uri().path(), "rejected unauthenticated job call");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "unauthorized" })),
        )
            .into_response();
    }

    next.run(req).await
}
