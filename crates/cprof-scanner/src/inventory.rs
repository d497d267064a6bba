//! Inventory types for scan results

use crate::extensions::ExtensionItems;
use crate::plugins::MarketplaceRegistry;
use crate::settings::{McpServer, SettingsFile};
use crate::types::Scope;
use serde::{Deserialize, Serialize};

/// Live Claude Code state across all scopes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveState {
    /// User-global scope
    pub user: ScopeState,
    /// Project-shared scope (present when a project directory was given)
    pub project: Option<ScopeState>,
    /// Project-local scope (present when a project directory was given)
    pub local: Option<ScopeState>,
    /// Locally added marketplaces (always user-level)
    pub marketplaces: MarketplaceRegistry,
}

impl LiveState {
    /// State of one scope, if it was scanned
    #[must_use]
    pub fn scope(&self, scope: Scope) -> Option<&ScopeState> {
        match scope {
            Scope::User => Some(&self.user),
            Scope::Project => self.project.as_ref(),
            Scope::Local => self.local.as_ref(),
        }
    }
}

/// Everything configured in a single scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeState {
    /// Settings file, if it exists
    pub settings: Option<SettingsFile>,
    /// MCP servers registered at this scope
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
    /// Enabled extension items
    #[serde(default)]
    pub extensions: ExtensionItems,
}

impl ScopeState {
    /// Plugin keys enabled in this scope's settings file
    #[must_use]
    pub fn enabled_plugins(&self) -> Vec<String> {
        self.settings
            .as_ref()
            .map(|s| s.enabled_plugin_keys().map(String::from).collect())
            .unwrap_or_default()
    }
}
