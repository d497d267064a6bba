//! Config file writers
//!
//! Every writer reads the current file, changes only the keys it owns and
//! writes the whole document back. There is no locking: two concurrent
//! writers to the same file can lose one update.

mod document;
mod error;
pub mod mcp;
pub mod record;
pub mod settings;

pub use document::JsonDocument;
pub use error::{SettingsError, SettingsResult};
pub use mcp::write_project_mcp;
pub use record::{AppliedRecord, LocalRegistry, ProfileSource};
pub use settings::{PluginWrite, SettingsDocument};
