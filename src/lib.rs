//! Library entrypoint for the CardBoom scheduled jobs service.
//!
//! Everything the binary wires together lives here so integration tests under
//! `tests/` can build an `AppState` over the in-memory backends.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;
pub mod templates;

pub mod controllers;
pub mod routes;

use services::{grading_client::GradingTrigger, notifier::Notifier, store::JobStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub grading: Arc<dyn GradingTrigger>,
    pub hbs: templates::Hbs,
    pub settings: config::Settings,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
}
