// src/engine/mod.rs

//! Run orchestration.
//!
//! [`scheduler`] drives a [`crate::dag::TaskGraph`] through a
//! [`crate::exec::Dispatcher`]; [`report`] describes how the run ended.

pub mod report;
pub mod scheduler;

pub use report::{FinalState, RunOutcome, RunReport, TaskReport};
pub use scheduler::Scheduler;
