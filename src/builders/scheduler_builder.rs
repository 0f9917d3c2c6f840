//! Builder to construct a scheduler from configuration knobs.

use crate::config::SchedulerConfig;
use crate::core::{Scheduler, SchedulerError, Spawn};

/// Fluent builder over [`SchedulerConfig`].
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .with_max_concurrent(4)
///     .with_retry_times(2)
///     .build(TokioSpawner::current())?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
}

impl SchedulerBuilder {
    /// Start from the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    #[must_use]
    pub const fn from_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Cap on simultaneously running tasks.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.config.max_concurrent = max_concurrent;
        self
    }

    /// Whether one terminal failure aborts all still-queued work.
    #[must_use]
    pub const fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.config.stop_on_error = stop_on_error;
        self
    }

    /// Automatic re-attempts per task before a failure becomes terminal.
    #[must_use]
    pub const fn with_retry_times(mut self, retry_times: u32) -> Self {
        self.config.retry_times = retry_times;
        self
    }

    /// Validate the configuration and construct the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if validation fails.
    pub fn build<T, S>(self, spawner: S) -> Result<Scheduler<T, S>, SchedulerError>
    where
        T: Clone + Send + 'static,
        S: Spawn + Send + Sync + 'static,
    {
        Scheduler::new(self.config, spawner)
    }
}
