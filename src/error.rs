use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    /// The scan or a price lookup could not reach the store. Aborts the batch.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single conditional update failed. The batch skips the record.
    #[error("write failed for {id}: {reason}")]
    RecordWriteFailed { id: String, reason: String },

    #[error("notification delivery failed: {0}")]
    NotificationDeliveryFailed(String),

    #[error("grading trigger failed: {0}")]
    GradingTriggerFailed(String),

    #[error("template error: {0}")]
    Template(String),
}

impl JobError {
    /// Batch-level errors abort the whole invocation; everything else is per record.
    pub fn is_batch_level(&self) -> bool {
        matches!(self, JobError::StoreUnavailable(_))
    }
}
