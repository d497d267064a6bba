//! cprof core - profiles, diffing and scope-aware apply
//!
//! This crate provides the profile model, the diff engine, the secret
//! chain and the apply engine that drives the claude CLI.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod apply;
pub mod config;
pub mod diff;
pub mod exec;
pub mod extensions;
pub mod profile;
pub mod scope;
pub mod secrets;

pub use cprof_scanner;

pub use apply::{Applier, ApplyError, ApplyOptions, ApplyReport, ConcurrentApplier, UserMode};
pub use cprof_scanner::{ClaudePaths, Scope};
pub use diff::ProfileDiff;
pub use profile::Profile;
