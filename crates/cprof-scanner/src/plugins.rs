//! Marketplace registry reader
//!
//! Claude Code records every marketplace it has added in
//! `~/.claude/plugins/known_marketplaces.json`, keyed by the name it
//! assigned locally. Profiles identify marketplaces by repo or URL, so
//! removal has to translate through this registry.

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Locally added marketplaces
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceRegistry {
    /// Registered marketplaces, ordered by local name
    #[serde(default)]
    pub marketplaces: Vec<RegisteredMarketplace>,
}

/// One entry of known_marketplaces.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredMarketplace {
    /// Name assigned by Claude Code
    pub name: String,
    /// Where it was added from
    pub source: MarketplaceSource,
    /// Checkout location on disk
    pub install_location: Option<String>,
    /// Whether auto-update is enabled
    #[serde(default)]
    pub auto_update: bool,
}

/// Marketplace source types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum MarketplaceSource {
    /// GitHub repository (owner/repo)
    GitHub { repo: String },
    /// Git URL
    Git { url: String },
    /// Plain URL to a marketplace.json
    Url { url: String },
    /// Local directory
    Directory { path: String },
    /// A source kind this version doesn't know about
    #[serde(other)]
    Unknown,
}

impl MarketplaceSource {
    /// Source kind as written in profiles
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GitHub { .. } => "github",
            Self::Git { .. } => "git",
            Self::Url { .. } => "url",
            Self::Directory { .. } => "directory",
            Self::Unknown => "unknown",
        }
    }

    /// Repo, URL or path this marketplace was added from
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::GitHub { repo } => Some(repo),
            Self::Git { url } | Self::Url { url } => Some(url),
            Self::Directory { path } => Some(path),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarketplaceEntry {
    source: MarketplaceSource,
    install_location: Option<String>,
    auto_update: Option<bool>,
}

impl MarketplaceRegistry {
    /// Load the registry; a missing file is an empty registry
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(path: &Path) -> ScanResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, RawMarketplaceEntry> =
            serde_json::from_str(&content).map_err(|e| ScanError::json(path, e))?;

        let marketplaces = raw
            .into_iter()
            .map(|(name, entry)| RegisteredMarketplace {
                name,
                source: entry.source,
                install_location: entry.install_location,
                auto_update: entry.auto_update.unwrap_or(false),
            })
            .collect();

        Ok(Self { marketplaces })
    }

    /// Find a marketplace by the repo or URL it was added from
    ///
    /// A trailing `.git` or `/` is ignored on both sides.
    #[must_use]
    pub fn find_by_location(&self, location: &str) -> Option<&RegisteredMarketplace> {
        let wanted = normalize_location(location);
        self.marketplaces.iter().find(|m| {
            m.source
                .location()
                .is_some_and(|loc| normalize_location(loc) == wanted)
        })
    }

    /// Whether a marketplace with this repo or URL is registered
    #[must_use]
    pub fn contains_location(&self, location: &str) -> bool {
        self.find_by_location(location).is_some()
    }

    /// Find a marketplace by its local name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&RegisteredMarketplace> {
        self.marketplaces.iter().find(|m| m.name == name)
    }
}

fn normalize_location(location: &str) -> &str {
    let trimmed = location.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGISTRY: &str = r#"{
        "team-tools": {
            "source": { "source": "github", "repo": "acme/team-tools" },
            "installLocation": "/home/u/.claude/plugins/marketplaces/team-tools",
            "lastUpdated": "2025-01-01T00:00:00Z"
        },
        "internal": {
            "source": { "source": "git", "url": "https://git.acme.dev/plugins.git" },
            "installLocation": "/home/u/.claude/plugins/marketplaces/internal",
            "autoUpdate": true
        },
        "future": {
            "source": { "source": "carrier-pigeon", "coop": "roof" }
        }
    }"#;

    #[test]
    fn test_load_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("known_marketplaces.json");
        fs::write(&path, REGISTRY).unwrap();

        let registry = MarketplaceRegistry::load(&path).unwrap();
        assert_eq!(registry.marketplaces.len(), 3);

        let internal = registry.find_by_name("internal").unwrap();
        assert!(internal.auto_update);
        assert_eq!(internal.source.kind(), "git");
        assert_eq!(
            registry.find_by_name("future").unwrap().source,
            MarketplaceSource::Unknown
        );
    }

    #[test]
    fn test_find_by_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("known_marketplaces.json");
        fs::write(&path, REGISTRY).unwrap();
        let registry = MarketplaceRegistry::load(&path).unwrap();

        assert_eq!(
            registry.find_by_location("acme/team-tools").unwrap().name,
            "team-tools"
        );
        assert_eq!(
            registry
                .find_by_location("https://git.acme.dev/plugins")
                .unwrap()
                .name,
            "internal"
        );
        assert!(!registry.contains_location("acme/other"));
    }

    #[test]
    fn test_missing_registry_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = MarketplaceRegistry::load(&dir.path().join("nope.json")).unwrap();
        assert!(registry.marketplaces.is_empty());
    }
}
