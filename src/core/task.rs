//! Task identity, lifecycle state, and completion plumbing.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::TaskError;

/// Opaque unique task identifier, assigned at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a task.
///
/// Transitions: `Queued -> Running -> {Completed, Queued (retry),
/// FailedTerminal}`, plus `Queued -> Cancelled` via drain or a
/// stop-on-error queue purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting in the dispatch queue.
    Queued,
    /// Currently executing.
    Running,
    /// Finished successfully; result recorded in the ledger.
    Completed,
    /// Failed after exhausting the retry budget.
    FailedTerminal,
    /// Removed from the queue before it could run.
    Cancelled,
}

/// A unit of work: a zero-argument callable producing a future of
/// value-or-failure. Invoked once per dispatch attempt, so it must tolerate
/// re-invocation when retries are configured.
pub type Work<T> = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + 'static>;

/// One submitted unit of work plus its lifecycle bookkeeping.
pub(crate) struct Task<T> {
    pub(crate) id: TaskId,
    pub(crate) work: Work<T>,
    pub(crate) retry_count: u32,
    pub(crate) state: TaskState,
    completion: Option<oneshot::Sender<Result<T, TaskError>>>,
    pub(crate) settle: Arc<SettleCell<T>>,
}

impl<T> Task<T> {
    /// Create a task in the `Queued` state together with the handle its
    /// submitter awaits.
    pub(crate) fn new(work: Work<T>) -> (Self, TaskHandle<T>) {
        let id = TaskId::new();
        let (tx, rx) = oneshot::channel();
        let task = Self {
            id,
            work,
            retry_count: 0,
            state: TaskState::Queued,
            completion: Some(tx),
            settle: Arc::new(SettleCell::new()),
        };
        (task, TaskHandle { id, rx })
    }
}

impl<T: Clone> Task<T> {
    /// Settle the task with a success value. No-op if already settled.
    pub(crate) fn resolve(&mut self, value: T) {
        self.state = TaskState::Completed;
        if let Some(tx) = self.completion.take() {
            // The submitter may have dropped its handle; that is fine.
            let _ = tx.send(Ok(value.clone()));
        }
        self.settle.settle(Some(value));
    }

    /// Settle the task with a failure. No-op if already settled.
    pub(crate) fn fail(&mut self, err: TaskError) {
        if let Some(tx) = self.completion.take() {
            let _ = tx.send(Err(err));
        }
        self.settle.settle(None);
    }
}

/// Shared settlement cell observed by drain while a task is in flight.
///
/// A task notifies the cell only on *terminal* settlement, so a subscriber
/// waits through intermediate retry attempts. Successes carry the value,
/// failures and cancellations carry `None`.
pub(crate) struct SettleCell<T> {
    inner: Mutex<CellState<T>>,
}

struct CellState<T> {
    outcome: Option<Option<T>>,
    waiters: Vec<oneshot::Sender<Option<T>>>,
}

impl<T> SettleCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(CellState {
                outcome: None,
                waiters: Vec::new(),
            }),
        }
    }
}

impl<T: Clone> SettleCell<T> {
    /// Subscribe to the terminal settlement. Fires immediately if the task
    /// already settled.
    pub(crate) fn subscribe(&self) -> oneshot::Receiver<Option<T>> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock();
        if let Some(outcome) = &inner.outcome {
            let _ = tx.send(outcome.clone());
        } else {
            inner.waiters.push(tx);
        }
        rx
    }

    /// Record the terminal outcome and notify subscribers. First call wins.
    pub(crate) fn settle(&self, outcome: Option<T>) {
        let waiters = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.outcome = Some(outcome.clone());
            std::mem::take(&mut inner.waiters)
        };
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
    }
}

/// Completion future returned by [`crate::core::Scheduler::submit`].
///
/// Settles exactly once: with the work's success value, the work's own
/// failure after the retry budget is exhausted, a cancellation failure, or a
/// queue-terminated failure.
pub struct TaskHandle<T> {
    id: TaskId,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    /// Identifier of the submitted task.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // The scheduler was dropped before the task settled.
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
