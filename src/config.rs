use std::env;

/// Fallback signing secret. Fine for local runs, never for a deployment.
pub const DEV_JWT_SECRET: &str = "change-me-dev-secret";

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub host: String,
    pub port: u16,

    // HS256 secret the scheduler signs its bearer tokens with
    pub job_jwt_secret: String,

    // empty => grading trigger is a logged no-op
    pub grading_trigger_url: String,
    pub grading_trigger_token: String,
    pub grading_trigger_timeout_secs: u64,

    pub job_concurrency: usize,
    // 0 disables the in-process scheduler
    pub job_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "cardboom".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            job_jwt_secret: DEV_JWT_SECRET.to_string(),
            grading_trigger_url: String::new(),
            grading_trigger_token: String::new(),
            grading_trigger_timeout_secs: 10,
            job_concurrency: 8,
            job_interval_secs: 0,
        }
    }
}

impl Settings {
    pub fn uses_dev_secret(&self) -> bool {
        self.job_jwt_secret == DEV_JWT_SECRET
    }
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let defaults = Settings::default();

    let mongodb_uri = env::var("MONGODB_URI").unwrap_or(defaults.mongodb_uri);
    let mongodb_db = env::var("MONGODB_DB").unwrap_or(defaults.mongodb_db);
    let host = env::var("HOST").unwrap_or(defaults.host);

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let job_jwt_secret = env::var("JOB_JWT_SECRET").unwrap_or(defaults.job_jwt_secret);

    let grading_trigger_url = env::var("GRADING_TRIGGER_URL").unwrap_or_default();
    let grading_trigger_token = env::var("GRADING_TRIGGER_TOKEN").unwrap_or_default();

    let grading_trigger_timeout_secs = env::var("GRADING_TRIGGER_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(defaults.grading_trigger_timeout_secs);

    let job_concurrency = env::var("JOB_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(defaults.job_concurrency);

    let job_interval_secs = env::var("JOB_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.job_interval_secs);

    Settings {
        mongodb_uri,
        mongodb_db,
        host,
        port,
        job_jwt_secret,
        grading_trigger_url,
        grading_trigger_token,
        grading_trigger_timeout_secs,
        job_concurrency,
        job_interval_secs,
    }
}
