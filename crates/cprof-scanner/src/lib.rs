//! cprof Scanner - live Claude Code configuration discovery
//!
//! This crate provides read-only scanning of Claude Code configuration
//! across the user, project and local scopes. It never writes.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod error;
pub mod extensions;
pub mod inventory;
pub mod parser;
pub mod paths;
pub mod plugins;
pub mod scan;
pub mod settings;
pub mod types;

pub use error::{ScanError, ScanResult};
pub use inventory::{LiveState, ScopeState};
pub use paths::ClaudePaths;
pub use plugins::{MarketplaceRegistry, MarketplaceSource, RegisteredMarketplace};
pub use scan::Scanner;
pub use types::Scope;
