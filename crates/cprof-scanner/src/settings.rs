//! Settings and MCP configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The keys of one scope's settings file that cprof reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    pub path: PathBuf,
    /// `name@marketplace` -> enabled; `false` entries are explicit disables
    #[serde(default)]
    pub enabled_plugins: BTreeMap<String, bool>,
    /// Raw hook groups keyed by event name
    #[serde(default)]
    pub hooks: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub model: Option<String>,
}

impl SettingsFile {
    /// Plugin keys explicitly set to `true`
    pub fn enabled_plugin_keys(&self) -> impl Iterator<Item = &str> {
        self.enabled_plugins
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| key.as_str())
    }
}

/// Servers declared in one `mcpServers` object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub path: PathBuf,
    /// Sorted by name
    #[serde(default)]
    pub servers: Vec<McpServer>,
}

/// One live MCP server entry
///
/// `env` holds resolved secret values; they are never copied into profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    pub transport: McpTransport,
    /// Set for stdio servers
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Set for http and sse servers
    pub url: Option<String>,
}

/// How Claude Code talks to a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    Stdio,
    Http,
    Sse,
}
