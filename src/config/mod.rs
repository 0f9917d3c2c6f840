//! Configuration models for scheduler policy knobs.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
