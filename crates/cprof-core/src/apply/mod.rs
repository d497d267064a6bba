//! Apply engine
//!
//! Reconciles live Claude Code state with a profile through the claude CLI
//! and the scope settings files.

mod concurrent;
mod engine;
mod error;
mod hooks;
mod report;
mod reset;
mod sync;

pub use concurrent::{ConcurrentApplier, ProgressEvent, DEFAULT_WORKERS};
pub use engine::{Applier, ApplyOptions, UserMode};
pub use error::{ApplyError, ApplyResult};
pub use report::{ApplyReport, CategoryOutcome, Direction, ItemError};
