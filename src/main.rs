use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::Client;
use tracing_subscriber::EnvFilter;

use cardboom_jobs::{
    auth, config, routes,
    services::{
        db_init, grading_client::GradingClient, notifier::MongoNotifier, scheduler,
        store::MongoStore,
    },
    templates, AppState,
};

// outbound grading calls get a fresh token when none is configured
const GRADING_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 365;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = config::load();

    if settings.uses_dev_secret() {
        tracing::warn!(
            "JOB_JWT_SECRET is not set, job endpoints accept tokens signed with the dev secret"
        );
    }

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri).await?;
    let db = client.database(&settings.mongodb_db);

    if let Err(e) = db_init::ensure_indexes(&db).await {
        tracing::warn!(error = %e, "could not ensure indexes");
    }

    let grading_token = if settings.grading_trigger_token.trim().is_empty() {
        auth::issue_service_token(&settings.job_jwt_secret, GRADING_TOKEN_TTL_SECS)?
    } else {
        settings.grading_trigger_token.clone()
    };

    let grading = GradingClient::new(
        settings.grading_trigger_url.clone(),
        grading_token,
        Duration::from_secs(settings.grading_trigger_timeout_secs),
    )?;

    let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(64);

    let state = AppState {
        store: Arc::new(MongoStore::new(db.clone())),
        notifier: Arc::new(MongoNotifier::new(db)),
        grading: Arc::new(grading),
        hbs: templates::build_handlebars()?,
        settings: settings.clone(),
        events_tx,
    };

    scheduler::spawn_job_scheduler(state.clone());

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
