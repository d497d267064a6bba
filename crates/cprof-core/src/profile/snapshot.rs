//! Profile snapshot creation from live state

use cprof_scanner::settings::McpServer as LiveMcpServer;
use cprof_scanner::{ClaudePaths, LiveState, MarketplaceSource, RegisteredMarketplace, Scanner, Scope, ScopeState};

use crate::profile::{ExtensionPatterns, Marketplace, McpServer, PerScopeSettings, Profile, ScopeSettings};
use crate::secrets::{restore_placeholders, SecretRef};

/// Build a per-scope profile describing the live configuration
///
/// Only scopes that were scanned appear. Secret values are never kept:
/// each server env key becomes a placeholder with no sources, and its
/// value is turned back into `${KEY}` wherever it shows up in the args.
#[must_use]
pub fn snapshot_from_state(state: &LiveState, name: &str) -> Profile {
    let mut per_scope = PerScopeSettings::default();
    for scope in Scope::ALL {
        if let Some(scope_state) = state.scope(scope) {
            *per_scope.get_mut(scope) = Some(scope_settings(scope, scope_state));
        }
    }

    let mut profile = Profile::new(name);
    profile.per_scope = Some(per_scope);
    profile.marketplaces = state
        .marketplaces
        .marketplaces
        .iter()
        .filter_map(marketplace_from_registry)
        .collect();
    profile
}

/// Scan and snapshot in one step
pub fn snapshot_live(paths: &ClaudePaths, name: &str) -> cprof_scanner::ScanResult<Profile> {
    let state = Scanner::new(paths.clone()).scan()?;
    Ok(snapshot_from_state(&state, name))
}

fn scope_settings(scope: Scope, state: &ScopeState) -> ScopeSettings {
    let mut items = ExtensionPatterns::default();
    for (category, names) in &state.extensions {
        if let Some(list) = items.category_mut(category) {
            list.clone_from(names);
        }
    }

    ScopeSettings {
        plugins: state.enabled_plugins(),
        mcp_servers: state
            .mcp_servers
            .iter()
            .map(|server| server_from_live(server, scope))
            .collect(),
        local_items: (!items.is_empty()).then_some(items),
    }
}

fn server_from_live(server: &LiveMcpServer, scope: Scope) -> McpServer {
    McpServer {
        name: server.name.clone(),
        command: server
            .command
            .clone()
            .or_else(|| server.url.clone())
            .unwrap_or_default(),
        args: restore_placeholders(&server.args, &server.env),
        scope: Some(scope),
        secrets: server
            .env
            .keys()
            .map(|key| (key.clone(), SecretRef::default()))
            .collect(),
    }
}

fn marketplace_from_registry(entry: &RegisteredMarketplace) -> Option<Marketplace> {
    let marketplace = match &entry.source {
        MarketplaceSource::GitHub { repo } => Marketplace::github(repo.clone()),
        MarketplaceSource::Git { url } => Marketplace::git(url.clone()),
        MarketplaceSource::Url { url } => Marketplace {
            source: "url".to_string(),
            repo: None,
            url: Some(url.clone()),
        },
        MarketplaceSource::Directory { path } => Marketplace {
            source: "directory".to_string(),
            repo: None,
            url: Some(path.clone()),
        },
        MarketplaceSource::Unknown => {
            tracing::warn!("Skipping marketplace {} with unknown source", entry.name);
            return None;
        }
    };
    Some(marketplace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cprof_scanner::settings::{McpTransport, SettingsFile};
    use cprof_scanner::MarketplaceRegistry;
    use std::collections::BTreeMap;

    fn live_server(name: &str, env: &[&str]) -> LiveMcpServer {
        LiveMcpServer {
            name: name.into(),
            transport: McpTransport::Stdio,
            command: Some("npx".into()),
            args: vec!["-y".into(), name.into()],
            env: env.iter().map(|k| ((*k).to_string(), format!("${{{k}}}"))).collect(),
            url: None,
        }
    }

    #[test]
    fn test_snapshot_per_scope() {
        let state = LiveState {
            user: ScopeState {
                settings: Some(SettingsFile {
                    enabled_plugins: BTreeMap::from([
                        ("a@mp".to_string(), true),
                        ("off@mp".to_string(), false),
                    ]),
                    ..SettingsFile::default()
                }),
                mcp_servers: vec![live_server("github", &["GITHUB_TOKEN"])],
                extensions: BTreeMap::from([("agents".to_string(), vec!["reviewer.md".to_string()])]),
            },
            project: Some(ScopeState::default()),
            local: None,
            marketplaces: MarketplaceRegistry {
                marketplaces: vec![
                    RegisteredMarketplace {
                        name: "mp".into(),
                        source: MarketplaceSource::GitHub { repo: "org/mp".into() },
                        install_location: None,
                        auto_update: false,
                    },
                    RegisteredMarketplace {
                        name: "odd".into(),
                        source: MarketplaceSource::Unknown,
                        install_location: None,
                        auto_update: false,
                    },
                ],
            },
        };

        let profile = snapshot_from_state(&state, "live");
        let per_scope = profile.per_scope.as_ref().unwrap();
        let user = per_scope.user.as_ref().unwrap();
        assert_eq!(user.plugins, vec!["a@mp"]);
        assert_eq!(user.mcp_servers[0].scope, Some(Scope::User));
        assert!(user.mcp_servers[0].secrets.contains_key("GITHUB_TOKEN"));
        assert_eq!(user.local_items.as_ref().unwrap().agents, vec!["reviewer.md"]);
        assert!(per_scope.project.as_ref().unwrap().is_empty());
        assert!(per_scope.local.is_none());
        assert_eq!(profile.marketplaces, vec![Marketplace::github("org/mp")]);
    }

    #[test]
    fn test_resolved_secret_args_become_placeholders() {
        let mut server = live_server("db", &[]);
        server.args = vec!["--token".into(), "s3cret".into(), "--user=admin".into()];
        server.env = BTreeMap::from([("TOKEN".to_string(), "s3cret".to_string())]);

        let restored = server_from_live(&server, Scope::Local);
        assert_eq!(restored.args, vec!["--token", "${TOKEN}", "--user=admin"]);
        assert!(restored.secrets["TOKEN"].sources.is_empty());
        assert!(!format!("{restored:?}").contains("s3cret"));
    }
}
