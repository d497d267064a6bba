//! Applied-profile records
//!
//! Project applies write `<project>/.cprof.json` so teammates can sync the
//! same setup. Local applies are private and go to `~/.cprof/projects.json`.

use chrono::{DateTime, Utc};
use cprof_scanner::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::error::{SettingsError, SettingsResult};
use crate::profile::{Marketplace, McpServer, Profile};
use crate::scope::extract_scope;

/// Where an applied profile came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    /// The user's profile store
    #[default]
    Saved,
    /// A profile file given by path
    File,
    /// Shipped with cprof
    Builtin,
}

/// What was applied to a scope, and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRecord {
    pub profile: String,
    #[serde(default)]
    pub source: ProfileSource,
    pub scope: Scope,
    #[serde(default)]
    pub marketplaces: Vec<Marketplace>,
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Private servers each teammate installs with their own secrets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_mcp_servers: Vec<McpServer>,
    pub applied_at: DateTime<Utc>,
}

impl AppliedRecord {
    /// Record a profile's settings for one scope, stamped now
    #[must_use]
    pub fn new(profile: &Profile, source: ProfileSource, scope: Scope) -> Self {
        let settings = extract_scope(profile, scope);
        Self {
            profile: profile.name.clone(),
            source,
            scope,
            marketplaces: settings.marketplaces,
            plugins: settings.plugins,
            local_mcp_servers: extract_scope(profile, Scope::Local).mcp_servers,
            applied_at: Utc::now(),
        }
    }

    /// Load a record; `None` when the file does not exist
    pub fn load(path: &Path) -> SettingsResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| SettingsError::json(path, &e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SettingsError::io(path, &e)),
        }
    }

    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        write_json(path, self)
    }
}

/// Local-scope applies keyed by project path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalRegistry {
    #[serde(default)]
    pub projects: BTreeMap<String, AppliedRecord>,
}

impl LocalRegistry {
    pub fn load(path: &Path) -> SettingsResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(Self::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| SettingsError::json(path, &e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SettingsError::io(path, &e)),
        }
    }

    #[must_use]
    pub fn get(&self, project_dir: &Path) -> Option<&AppliedRecord> {
        self.projects.get(&project_dir.display().to_string())
    }

    pub fn record(&mut self, project_dir: &Path, record: AppliedRecord) {
        self.projects
            .insert(project_dir.display().to_string(), record);
    }

    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        write_json(path, self)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> SettingsResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, &e))?;
    }
    let mut content =
        serde_json::to_string_pretty(value).map_err(|e| SettingsError::json(path, &e))?;
    content.push('\n');
    fs::write(path, content).map_err(|e| SettingsError::io(path, &e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{PerScopeSettings, ScopeSettings};
    use tempfile::TempDir;

    fn team_profile() -> Profile {
        let mut profile = Profile::new("team");
        profile.marketplaces = vec![Marketplace::github("org/mp")];
        profile.per_scope = Some(PerScopeSettings {
            project: Some(ScopeSettings {
                plugins: vec!["lint@mp".into()],
                ..ScopeSettings::default()
            }),
            local: Some(ScopeSettings {
                mcp_servers: vec![McpServer::new("db", "pg-mcp")],
                ..ScopeSettings::default()
            }),
            ..PerScopeSettings::default()
        });
        profile
    }

    #[test]
    fn test_project_record_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".cprof.json");
        assert!(AppliedRecord::load(&path).unwrap().is_none());

        let record = AppliedRecord::new(&team_profile(), ProfileSource::Saved, Scope::Project);
        assert_eq!(record.plugins, vec!["lint@mp"]);
        assert_eq!(record.local_mcp_servers[0].name, "db");
        record.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"appliedAt\""));
        assert!(raw.contains("\"localMcpServers\""));
        assert_eq!(AppliedRecord::load(&path).unwrap().unwrap(), record);
    }

    #[test]
    fn test_local_registry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        let project = dir.path().join("app");

        let mut registry = LocalRegistry::load(&path).unwrap();
        registry.record(
            &project,
            AppliedRecord::new(&team_profile(), ProfileSource::File, Scope::Local),
        );
        registry.save(&path).unwrap();

        let reloaded = LocalRegistry::load(&path).unwrap();
        let record = reloaded.get(&project).unwrap();
        assert_eq!(record.profile, "team");
        assert_eq!(record.source, ProfileSource::File);
        assert_eq!(record.scope, Scope::Local);
    }
}
