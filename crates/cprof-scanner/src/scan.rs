//! Main scanner implementation

use crate::error::{ScanError, ScanResult};
use crate::extensions::list_categories;
use crate::inventory::{LiveState, ScopeState};
use crate::parser::{parse_claude_json, parse_mcp_config, parse_settings, ClaudeJsonServers};
use crate::paths::ClaudePaths;
use crate::plugins::MarketplaceRegistry;
use crate::settings::SettingsFile;
use crate::types::Scope;
use std::fs;
use std::path::Path;

/// Reads live Claude Code state for the user scope and, when a project
/// directory is configured, the project and local scopes
#[derive(Debug, Clone)]
pub struct Scanner {
    paths: ClaudePaths,
}

impl Scanner {
    /// Create a new scanner over the given paths
    #[must_use]
    pub fn new(paths: ClaudePaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &ClaudePaths {
        &self.paths
    }

    /// Scan every scope that is reachable from the configured paths
    ///
    /// # Errors
    /// Returns an error if any existing config file cannot be read or parsed
    pub fn scan(&self) -> ScanResult<LiveState> {
        let claude_json = self.read_claude_json()?;
        let user = self.scan_user(&claude_json)?;

        let (project, local) = if self.paths.project_dir().is_some() {
            (
                Some(self.scan_project()?),
                Some(self.scan_local(claude_json.local)?),
            )
        } else {
            (None, None)
        };

        Ok(LiveState {
            user,
            project,
            local,
            marketplaces: self.scan_marketplaces()?,
        })
    }

    /// Read the marketplace registry
    ///
    /// # Errors
    /// Returns an error if the registry exists but is unreadable
    pub fn scan_marketplaces(&self) -> ScanResult<MarketplaceRegistry> {
        MarketplaceRegistry::load(&self.paths.known_marketplaces_path())
    }

    /// Read one scope's settings file, if present
    ///
    /// # Errors
    /// Returns an error if the file exists but is unreadable
    pub fn read_settings(&self, scope: Scope) -> ScanResult<Option<SettingsFile>> {
        let path = self.paths.settings_path(scope)?;
        match read_optional(&path)? {
            Some(content) => parse_settings(&path, &content).map(Some),
            None => Ok(None),
        }
    }

    fn scan_user(&self, claude_json: &ClaudeJsonServers) -> ScanResult<ScopeState> {
        Ok(ScopeState {
            settings: self.read_settings(Scope::User)?,
            mcp_servers: claude_json.user.clone(),
            extensions: list_categories(self.paths.claude_dir()),
        })
    }

    fn scan_project(&self) -> ScanResult<ScopeState> {
        let mcp_path = self.paths.project_mcp_path()?;
        let mcp_servers = match read_optional(&mcp_path)? {
            Some(content) => parse_mcp_config(&mcp_path, &content)?.servers,
            None => Vec::new(),
        };

        Ok(ScopeState {
            settings: self.read_settings(Scope::Project)?,
            mcp_servers,
            extensions: list_categories(&self.paths.scope_claude_dir(Scope::Project)?),
        })
    }

    fn scan_local(&self, servers: Vec<crate::settings::McpServer>) -> ScanResult<ScopeState> {
        // Local scope shares the project's .claude directory for items, so
        // extension items are reported under project only.
        Ok(ScopeState {
            settings: self.read_settings(Scope::Local)?,
            mcp_servers: servers,
            extensions: Default::default(),
        })
    }

    fn read_claude_json(&self) -> ScanResult<ClaudeJsonServers> {
        let path = self.paths.claude_json();
        match read_optional(path)? {
            Some(content) => parse_claude_json(path, &content, self.paths.project_dir()),
            None => Ok(ClaudeJsonServers::default()),
        }
    }
}

fn read_optional(path: &Path) -> ScanResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ScanError::io(path, e)),
    }
}
