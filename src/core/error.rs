//! Error types for scheduler operations.

use thiserror::Error;

/// Failure delivered through a task's completion handle.
///
/// Every submitted task settles exactly once, either with the work's success
/// value or with one of these variants.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The work itself failed and the retry budget is exhausted.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
    /// The task was cancelled while still queued (by a drain).
    #[error("task cancelled while queued")]
    Cancelled,
    /// The queue was terminated by an earlier terminal failure under the
    /// stop-on-error policy; carries the triggering failure's description.
    #[error("queue terminated by earlier failure: {0}")]
    QueueTerminated(String),
}

/// Errors produced when constructing a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
