//! Diff between a saved profile and live state

mod compare;
pub mod display;
pub mod filter;
mod types;

pub use compare::{compare, compare_with_live};
pub use filter::{filter_to_scopes, marketplace_matches_key, plugin_in_marketplaces};
pub use types::*;
