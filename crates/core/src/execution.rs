//! Task execution
//!
//! [`TaskExecutor`] runs a validated plan, [`state`] tracks each task's
//! lifecycle and [`locks`] keeps tasks with overlapping outputs apart.

pub mod executor;
pub mod locks;
pub mod state;

pub use executor::TaskExecutor;
pub use locks::PathLocks;
pub use state::{RunReport, SkipReason, TaskOutcome, TaskState};
