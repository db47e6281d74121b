use std::future::Future;

use futures_util::{stream, StreamExt};
use serde::Serialize;

/// What happened to a single candidate record during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Predicate did not match.
    Untouched,
    /// This run flipped the record. `notify_failed` counts best-effort side
    /// effects (notification, grading trigger) that did not go through.
    Transitioned { notify_failed: usize },
    /// Another run got there first; nothing emitted.
    AlreadyTransitioned,
    /// The conditional update itself failed.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub checked: usize,
    pub transitioned: usize,
    pub failed: usize,
    pub skipped: usize,
    pub notify_failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Untouched => {}
            RecordOutcome::Transitioned { notify_failed } => {
                self.transitioned += 1;
                self.notify_failed += notify_failed;
            }
            RecordOutcome::AlreadyTransitioned => self.skipped += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }
}

/// Runs `apply` over every candidate with at most `concurrency` in flight.
///
/// Records are independent, so completion order doesn't matter.
pub async fn process_all<T, F, Fut>(
    candidates: Vec<T>,
    concurrency: usize,
    apply: F,
) -> Vec<RecordOutcome>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = RecordOutcome>,
{
    stream::iter(candidates)
        .map(apply)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
