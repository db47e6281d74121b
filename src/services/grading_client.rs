use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use reqwest::Client;
use serde::Serialize;

use crate::error::JobError;

/// Kicks off the actual grading run for an order whose countdown has ended.
#[async_trait]
pub trait GradingTrigger: Send + Sync {
    async fn trigger(&self, order_id: ObjectId) -> Result<(), JobError>;
}

#[derive(Clone)]
pub struct GradingClient {
    http: Client,
    url: String,
    token: String,
}

#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    order_id: &'a str,
}

impl GradingClient {
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(url: String, token: String, timeout: Duration) -> Result<Self, JobError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::GradingTriggerFailed(format!("http client: {e}")))?;

        Ok(Self { http, url, token })
    }

    fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[async_trait]
impl GradingTrigger for GradingClient {
    async fn trigger(&self, order_id: ObjectId) -> Result<(), JobError> {
        let id = order_id.to_hex();

        if !self.has_url() {
            tracing::info!(order_id = %id, "GRADING_TRIGGER_URL not set, skipping grading trigger");
            return Ok(());
        }

        let res = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&TriggerRequest { order_id: &id })
            .send()
            .await
            .map_err(|e| JobError::GradingTriggerFailed(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(JobError::GradingTriggerFailed(format!(
                "grading trigger for {id} failed: {status} {body}"
            )));
        }

        Ok(())
    }
}
