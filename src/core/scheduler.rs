//! Bounded-concurrency scheduler: queue ownership, dispatch loop, drain.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::core::task::{SettleCell, Task, Work};
use crate::core::{SchedulerError, TaskError, TaskHandle, TaskId, TaskState};
use crate::infra::{DispatchQueue, ResultLedger};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Accounting returned by [`Scheduler::drain`].
#[derive(Debug)]
pub struct DrainReport<T> {
    /// Successful results accumulated in the ledger, plus (when waiting) the
    /// results of tasks that settled during the drain.
    pub completed: Vec<T>,
    /// Number of queued tasks that were cancelled.
    pub cancelled: usize,
    /// Number of tasks still running when the drain returned. Zero when the
    /// drain waited for them.
    pub in_progress: usize,
}

/// Point-in-time snapshot of scheduler state and lifetime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks currently executing.
    pub running: usize,
    /// Tasks waiting in the queue.
    pub queued: usize,
    /// Whether the most recent settlement was a terminal failure.
    pub has_error: bool,
    /// Whether dispatch is paused.
    pub paused: bool,
    /// Total tasks submitted.
    pub submitted: u64,
    /// Total tasks completed successfully.
    pub completed: u64,
    /// Total tasks that failed terminally.
    pub failed: u64,
    /// Total tasks cancelled while queued.
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: u64,
    completed: u64,
    failed: u64,
    cancelled: u64,
}

/// Mutable scheduler state. Guarded by a single mutex so that dispatch,
/// settlement, and drain mutate the queue, running set, and ledger as
/// indivisible steps relative to each other.
struct State<T> {
    queue: DispatchQueue<Task<T>>,
    running: HashMap<TaskId, Arc<SettleCell<T>>>,
    running_count: usize,
    error_flag: bool,
    paused: bool,
    ledger: ResultLedger<T>,
    counters: Counters,
}

impl<T> State<T> {
    fn new() -> Self {
        Self {
            queue: DispatchQueue::new(),
            running: HashMap::new(),
            running_count: 0,
            error_flag: false,
            paused: false,
            ledger: ResultLedger::new(),
            counters: Counters::default(),
        }
    }
}

struct Shared<T, S> {
    config: SchedulerConfig,
    spawner: S,
    state: Mutex<State<T>>,
}

/// Bounded-concurrency task scheduler.
///
/// Runs at most `max_concurrent` submitted tasks at a time, in FIFO order
/// except that retried work is reinserted at the front of the queue. Cloning
/// the scheduler is cheap and yields another handle to the same queue.
///
/// `T` is the success value type shared by all tasks of this scheduler; it
/// must be `Clone` because a result is delivered both to the submitter's
/// handle and to the ledger reported by [`Scheduler::drain`].
pub struct Scheduler<T, S> {
    shared: Arc<Shared<T, S>>,
}

impl<T, S> Clone for Scheduler<T, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, S> Scheduler<T, S>
where
    T: Clone + Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a scheduler from validated configuration and a spawner.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(config: SchedulerConfig, spawner: S) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                spawner,
                state: Mutex::new(State::new()),
            }),
        })
    }

    /// Submit a unit of work and receive its completion handle.
    ///
    /// The work is invoked once per dispatch attempt, so with a non-zero
    /// retry budget it must tolerate being invoked more than once; the
    /// scheduler offers no deduplication. The handle settles exactly once:
    /// with the success value, with the work's own failure once the retry
    /// budget is exhausted, or with a cancellation/queue-terminated failure.
    pub fn submit<F, Fut>(&self, work: F) -> TaskHandle<T>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let work: Work<T> = Box::new(move || Box::pin(work()));
        let (task, handle) = Task::new(work);
        tracing::debug!("task {} submitted", task.id);
        {
            let mut state = self.shared.state.lock();
            state.counters.submitted += 1;
            state.queue.push_back(task);
        }
        dispatch(&self.shared);
        handle
    }

    /// Stop dispatching new tasks. Tasks already running are unaffected.
    /// Idempotent.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock();
        if !state.paused {
            state.paused = true;
            tracing::debug!("dispatch paused");
        }
    }

    /// Allow dispatch again and immediately pull whatever capacity permits.
    /// Idempotent.
    pub fn resume(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.paused {
                state.paused = false;
                tracing::debug!("dispatch resumed");
            }
        }
        dispatch(&self.shared);
    }

    /// Empty the queue, cancelling every task that has not started, and
    /// optionally wait for in-flight tasks to settle.
    ///
    /// Cancelled tasks' handles reject with [`TaskError::Cancelled`]. With
    /// `wait_for_running = false` the report's `completed` holds only the
    /// results accumulated so far and in-flight tasks keep running in the
    /// background, feeding the ledger as normal. With `wait_for_running =
    /// true` the call additionally awaits every in-flight task (through any
    /// remaining retries) and appends the fresh successes; failures settle
    /// their own handles but are excluded from `completed`.
    ///
    /// Either way the error flag, pause flag, and ledger are reset, leaving
    /// the scheduler ready for further submissions.
    pub async fn drain(&self, wait_for_running: bool) -> DrainReport<T> {
        let (mut completed, queued, cells) = {
            let mut state = self.shared.state.lock();
            let queued = state.queue.drain_all();
            let completed = state.ledger.take_all();
            let cells: Vec<Arc<SettleCell<T>>> =
                state.running.values().map(Arc::clone).collect();
            state.counters.cancelled += queued.len() as u64;
            if !wait_for_running {
                state.error_flag = false;
                state.paused = false;
            }
            (completed, queued, cells)
        };

        let cancelled = queued.len();
        for mut task in queued {
            task.state = TaskState::Cancelled;
            task.fail(TaskError::Cancelled);
        }
        tracing::info!(
            "drain: cancelled {} queued task(s), {} in flight (wait={})",
            cancelled,
            cells.len(),
            wait_for_running
        );

        if !wait_for_running {
            dispatch(&self.shared);
            return DrainReport {
                completed,
                cancelled,
                in_progress: cells.len(),
            };
        }

        // Subscribing after the snapshot is safe: a cell that settled in
        // between notifies the subscriber immediately.
        let waiters: Vec<_> = cells.iter().map(|cell| cell.subscribe()).collect();
        for outcome in join_all(waiters).await {
            if let Ok(Some(value)) = outcome {
                completed.push(value);
            }
        }

        {
            let mut state = self.shared.state.lock();
            // Fresh successes from the wait were reported above; empty the
            // ledger for future accumulation.
            state.ledger.clear();
            state.error_flag = false;
            state.paused = false;
        }
        dispatch(&self.shared);

        DrainReport {
            completed,
            cancelled,
            in_progress: 0,
        }
    }

    /// Number of tasks currently executing.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.shared.state.lock().running_count
    }

    /// Number of tasks waiting in the queue.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Whether the most recent settlement was a terminal failure. Cleared by
    /// a later success or by a drain, never by a submit.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.shared.state.lock().error_flag
    }

    /// Whether dispatch is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Snapshot of current state and lifetime counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.state.lock();
        SchedulerStats {
            running: state.running_count,
            queued: state.queue.len(),
            has_error: state.error_flag,
            paused: state.paused,
            submitted: state.counters.submitted,
            completed: state.counters.completed,
            failed: state.counters.failed,
            cancelled: state.counters.cancelled,
        }
    }

    /// Configuration this scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }
}

/// Run the dispatch loop to a fixed point: pull from the queue while capacity
/// and policy allow, spawning each pulled task. Invoked after a submit, a
/// settlement, a resume, and a drain. Each invocation only pulls what current
/// capacity permits and then returns, so settlement-triggered re-invocations
/// never recurse unboundedly.
fn dispatch<T, S>(shared: &Arc<Shared<T, S>>)
where
    T: Clone + Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    loop {
        let task = {
            let mut state = shared.state.lock();
            if state.running_count >= shared.config.max_concurrent
                || (state.error_flag && shared.config.stop_on_error)
                || state.paused
            {
                return;
            }
            let Some(mut task) = state.queue.pop_front() else {
                return;
            };
            task.state = TaskState::Running;
            state.running_count += 1;
            state.running.insert(task.id, Arc::clone(&task.settle));
            task
        };
        tracing::debug!(
            "task {} dispatched (attempt {})",
            task.id,
            task.retry_count + 1
        );
        shared.spawner.spawn(run_task(Arc::clone(shared), task));
    }
}

/// Execute one dispatch attempt of a task and handle its settlement:
/// success feeds the ledger and resolves the handle, a retriable failure
/// requeues at the front, a terminal failure rejects the handle and, under
/// stop-on-error, purges the queue. Every path re-invokes the dispatch loop.
fn run_task<T, S>(shared: Arc<Shared<T, S>>, mut task: Task<T>) -> BoxFuture<'static, ()>
where
    T: Clone + Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    Box::pin(async move {
        let outcome = (task.work)().await;
        match outcome {
            Ok(value) => {
                {
                    let mut state = shared.state.lock();
                    state.running.remove(&task.id);
                    state.running_count -= 1;
                    state.error_flag = false;
                    state.counters.completed += 1;
                    state.ledger.insert(task.id, value.clone());
                }
                task.resolve(value);
                tracing::debug!("task {} settled: {:?}", task.id, task.state);
            }
            Err(err) if task.retry_count < shared.config.retry_times => {
                task.retry_count += 1;
                task.state = TaskState::Queued;
                tracing::debug!(
                    "task {} failed, requeueing at front (retry {} of {}): {err:#}",
                    task.id,
                    task.retry_count,
                    shared.config.retry_times,
                );
                let mut state = shared.state.lock();
                state.running.remove(&task.id);
                state.running_count -= 1;
                state.queue.push_front(task);
                drop(state);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                let purged = {
                    let mut state = shared.state.lock();
                    state.running.remove(&task.id);
                    state.running_count -= 1;
                    state.error_flag = true;
                    state.counters.failed += 1;
                    if shared.config.stop_on_error {
                        let purged = state.queue.drain_all();
                        state.counters.cancelled += purged.len() as u64;
                        purged
                    } else {
                        Vec::new()
                    }
                };
                task.state = TaskState::FailedTerminal;
                task.fail(TaskError::Failed(err));
                tracing::warn!(
                    "task {} failed terminally after {} attempt(s): {}",
                    task.id,
                    task.retry_count + 1,
                    reason
                );
                if !purged.is_empty() {
                    tracing::warn!("stop-on-error: rejecting {} queued task(s)", purged.len());
                    for mut queued in purged {
                        queued.state = TaskState::Cancelled;
                        queued.fail(TaskError::QueueTerminated(reason.clone()));
                    }
                }
            }
        }
        dispatch(&shared);
    })
}
