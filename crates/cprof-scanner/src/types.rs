//! Shared types for the cprof scanner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;

/// Configuration scope, ordered by precedence (later scopes override earlier ones)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// User-global (~/.claude/, ~/.claude.json)
    User,
    /// Project-shared (.claude/settings.json, .mcp.json), checked in
    Project,
    /// Project-local private (.claude/settings.local.json), gitignored
    Local,
}

impl Scope {
    /// All scopes in application order
    pub const ALL: [Scope; 3] = [Scope::User, Scope::Project, Scope::Local];

    /// Whether this scope lives inside a project directory
    #[must_use]
    pub fn needs_project(self) -> bool {
        !matches!(self, Self::User)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "global" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "local" => Ok(Self::Local),
            _ => Err(ScanError::InvalidScope(s.to_string())),
        }
    }
}
