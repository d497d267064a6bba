//! Scope model
//!
//! Three views of a profile: normalized per-scope, one extracted scope,
//! and all scopes combined the way Claude Code layers them at runtime.

use cprof_scanner::Scope;
use std::collections::{BTreeMap, BTreeSet};

use crate::profile::{ExtensionPatterns, Marketplace, McpServer, PerScopeSettings, Profile, ScopeSettings};

/// Plugins, servers and marketplaces with no scope structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatProfile {
    pub plugins: Vec<String>,
    pub mcp_servers: Vec<McpServer>,
    pub marketplaces: Vec<Marketplace>,
    pub local_items: ExtensionPatterns,
}

/// Normalize a profile into per-scope form
///
/// `per_scope` wins when present, and the flat fields are ignored.
/// Otherwise the flat fields become the user scope.
#[must_use]
pub fn as_per_scope(profile: &Profile) -> PerScopeSettings {
    if let Some(per_scope) = &profile.per_scope {
        return per_scope.clone();
    }

    PerScopeSettings {
        user: Some(ScopeSettings {
            plugins: profile.plugins.clone(),
            mcp_servers: profile.mcp_servers.clone(),
            local_items: profile.local_items.clone(),
        }),
        project: None,
        local: None,
    }
}

/// One scope's settings plus every marketplace
///
/// An unconfigured scope yields an empty result, never an error.
#[must_use]
pub fn extract_scope(profile: &Profile, scope: Scope) -> FlatProfile {
    let settings = as_per_scope(profile).get(scope).cloned().unwrap_or_default();

    FlatProfile {
        plugins: settings.plugins,
        mcp_servers: settings.mcp_servers,
        marketplaces: profile.marketplaces.clone(),
        local_items: settings.local_items.unwrap_or_default(),
    }
}

/// Union of all scopes: plugins as a set, servers merged by name with
/// local over project over user
#[must_use]
pub fn combine_scopes(profile: &Profile) -> FlatProfile {
    let per_scope = as_per_scope(profile);

    let mut plugins = BTreeSet::new();
    let mut servers: BTreeMap<String, McpServer> = BTreeMap::new();
    let mut local_items = ExtensionPatterns::default();

    for (_, settings) in per_scope.iter() {
        plugins.extend(settings.plugins.iter().cloned());
        for server in &settings.mcp_servers {
            servers.insert(server.name.clone(), server.clone());
        }
        if let Some(items) = &settings.local_items {
            merge_patterns(&mut local_items, items);
        }
    }

    FlatProfile {
        plugins: plugins.into_iter().collect(),
        mcp_servers: servers.into_values().collect(),
        marketplaces: profile.marketplaces.clone(),
        local_items,
    }
}

/// A profile restricted to the given scopes, keeping every marketplace
#[must_use]
pub fn only_scopes(profile: &Profile, scopes: &[Scope]) -> Profile {
    let normalized = as_per_scope(profile);
    let mut kept = PerScopeSettings::default();
    for scope in scopes {
        *kept.get_mut(*scope) = normalized.get(*scope).cloned();
    }

    Profile {
        plugins: Vec::new(),
        mcp_servers: Vec::new(),
        local_items: None,
        per_scope: Some(kept),
        ..profile.clone()
    }
}

/// Scopes a profile configures, in apply order
#[must_use]
pub fn configured_scopes(profile: &Profile) -> Vec<Scope> {
    as_per_scope(profile).iter().map(|(scope, _)| scope).collect()
}

fn merge_patterns(into: &mut ExtensionPatterns, from: &ExtensionPatterns) {
    for (category, patterns) in from.categories() {
        if let Some(target) = into.category_mut(category) {
            for pattern in patterns {
                if !target.contains(pattern) {
                    target.push(pattern.clone());
                }
            }
        }
    }
}
