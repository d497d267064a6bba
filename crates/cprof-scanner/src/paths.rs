//! File locations for every scope
//!
//! All reads and writes go through `ClaudePaths` so tests can point the
//! whole engine at a temporary home directory.

use std::path::{Path, PathBuf};

use crate::error::{ScanError, ScanResult};
use crate::types::Scope;

/// Environment variable overriding the user Claude directory
pub const CLAUDE_CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";
/// Environment variable overriding the cprof state directory
pub const CPROF_HOME_ENV: &str = "CPROF_HOME";

/// Extension item categories, in the order they are reported
pub const EXTENSION_CATEGORIES: [&str; 6] = [
    "agents",
    "commands",
    "skills",
    "hooks",
    "rules",
    "output-styles",
];

/// Resolved locations of Claude Code and cprof files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudePaths {
    claude_dir: PathBuf,
    claude_json: PathBuf,
    state_dir: PathBuf,
    project_dir: Option<PathBuf>,
}

impl ClaudePaths {
    /// Resolve paths from the environment and the home directory
    pub fn discover(project_dir: Option<PathBuf>) -> ScanResult<Self> {
        let home = dirs::home_dir().ok_or(ScanError::HomeNotFound)?;

        let (claude_dir, claude_json) = match std::env::var_os(CLAUDE_CONFIG_DIR_ENV) {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                let json = dir.join(".claude.json");
                (dir, json)
            }
            None => (home.join(".claude"), home.join(".claude.json")),
        };

        let state_dir = std::env::var_os(CPROF_HOME_ENV)
            .map_or_else(|| home.join(".cprof"), PathBuf::from);

        Ok(Self {
            claude_dir,
            claude_json,
            state_dir,
            project_dir,
        })
    }

    /// Build paths rooted at an explicit home directory
    #[must_use]
    pub fn with_roots(home: &Path, project_dir: Option<PathBuf>) -> Self {
        Self {
            claude_dir: home.join(".claude"),
            claude_json: home.join(".claude.json"),
            state_dir: home.join(".cprof"),
            project_dir,
        }
    }

    /// Same roots, different project
    #[must_use]
    pub fn for_project(&self, project_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    /// Project directory, or an error naming the scope that needed it
    pub fn require_project(&self, scope: Scope) -> ScanResult<&Path> {
        self.project_dir
            .as_deref()
            .ok_or_else(|| ScanError::ProjectRequired(scope.to_string()))
    }

    /// User Claude directory (~/.claude)
    #[must_use]
    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    /// User Claude JSON (~/.claude.json), holds user and local MCP servers
    #[must_use]
    pub fn claude_json(&self) -> &Path {
        &self.claude_json
    }

    /// cprof state directory (~/.cprof)
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// The `.claude` directory a scope writes into
    pub fn scope_claude_dir(&self, scope: Scope) -> ScanResult<PathBuf> {
        match scope {
            Scope::User => Ok(self.claude_dir.clone()),
            Scope::Project | Scope::Local => Ok(self.require_project(scope)?.join(".claude")),
        }
    }

    /// The settings file for a scope
    pub fn settings_path(&self, scope: Scope) -> ScanResult<PathBuf> {
        let dir = self.scope_claude_dir(scope)?;
        Ok(match scope {
            Scope::User | Scope::Project => dir.join("settings.json"),
            Scope::Local => dir.join("settings.local.json"),
        })
    }

    /// Project-shared MCP config (.mcp.json)
    pub fn project_mcp_path(&self) -> ScanResult<PathBuf> {
        Ok(self.require_project(Scope::Project)?.join(".mcp.json"))
    }

    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.claude_dir.join("plugins")
    }

    /// Registry of locally added marketplaces
    #[must_use]
    pub fn known_marketplaces_path(&self) -> PathBuf {
        self.plugins_dir().join("known_marketplaces.json")
    }

    /// Registry of installed plugins
    #[must_use]
    pub fn installed_plugins_path(&self) -> PathBuf {
        self.plugins_dir().join("installed_plugins.json")
    }

    /// Saved profiles
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.state_dir.join("profiles")
    }

    /// Library of local extension items, one subdirectory per category
    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.state_dir.join("local")
    }

    /// Applied-profile record shared with the team
    pub fn project_record_path(&self) -> ScanResult<PathBuf> {
        Ok(self.require_project(Scope::Project)?.join(".cprof.json"))
    }

    /// Last profile applied at user scope
    #[must_use]
    pub fn user_record_path(&self) -> PathBuf {
        self.state_dir.join("applied.json")
    }

    /// Private registry of local-scope applies, keyed by project path
    #[must_use]
    pub fn local_registry_path(&self) -> PathBuf {
        self.state_dir.join("projects.json")
    }
}
