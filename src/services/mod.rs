pub mod db_init;
pub mod scheduler;

pub mod batch;
pub mod predicates;
pub mod price_alerts;
pub mod grading_countdown;

pub mod store;
pub mod notifier;
pub mod grading_client;
pub mod memory;
