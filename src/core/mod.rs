//! Core scheduler, task lifecycle, and error types.

pub mod error;
pub mod scheduler;
pub mod task;

pub use error::{SchedulerError, TaskError};
pub use scheduler::{DrainReport, Scheduler, SchedulerStats, Spawn};
pub use task::{TaskHandle, TaskId, TaskState, Work};
