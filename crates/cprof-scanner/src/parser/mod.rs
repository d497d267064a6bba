//! Parsers for Claude Code configuration files

pub mod mcp;
pub mod settings;

pub use mcp::{parse_claude_json, parse_mcp_config, ClaudeJsonServers};
pub use settings::parse_settings;
