//! # Taskgate
//!
//! A bounded-concurrency task scheduler for asynchronous workloads.
//!
//! Taskgate accepts arbitrary units of asynchronous work, runs at most
//! `max_concurrent` of them at a time, retries failing work up to a configured
//! budget, and supports pausing/resuming dispatch as well as draining the
//! queue with precise accounting of queued versus in-flight work.
//!
//! ## Core Problem Solved
//!
//! Fan-out workloads (batch API calls, bulk ingestion, crawl jobs) need a
//! throttle between "everything the caller wants done" and "what the backend
//! can absorb at once":
//!
//! - **Concurrency cap**: at most N tasks in flight, the rest wait in FIFO order
//! - **Automatic retries**: a failing task is re-attempted before its caller
//!   ever sees the failure, and a retried task cuts ahead of fresh work
//! - **Failure policy**: optionally stop dispatching after one terminal failure
//!   and fail everything still queued
//! - **Drain**: cancel queued work and either wait for in-flight tasks or let
//!   them finish in the background, with an accounting of outcomes
//!
//! ## Example
//!
//! ```rust,ignore
//! use taskgate::builders::SchedulerBuilder;
//! use taskgate::runtime::TokioSpawner;
//!
//! let scheduler = SchedulerBuilder::new()
//!     .with_max_concurrent(4)
//!     .with_retry_times(2)
//!     .build(TokioSpawner::current())?;
//!
//! let handle = scheduler.submit(|| async { fetch_page(42).await });
//! let page = handle.await?;
//!
//! // Later: cancel whatever is still queued, wait for in-flight work.
//! let report = scheduler.drain(true).await;
//! println!("{} succeeded, {} cancelled", report.completed.len(), report.cancelled);
//! ```
//!
//! Running tasks are never interrupted: a drain can only cancel work that has
//! not started yet. Callers wanting per-task timeouts wrap their work with
//! their own timeout racing before submitting.
//!
//! For complete examples, see:
//! - `tests/scheduler_test.rs` - Full integration tests
//! - `tests/drain_test.rs` - Drain accounting tests

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduler, task lifecycle, and error types.
pub mod core;
/// Configuration models for scheduler policy knobs.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Infrastructure pieces: dispatch queue and result ledger.
pub mod infra;
/// Runtime adapters for spawning task execution.
pub mod runtime;
/// Shared utilities.
pub mod util;
