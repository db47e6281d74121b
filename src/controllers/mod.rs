pub mod events_controller;
pub mod health_controller;
pub mod jobs_controller;
