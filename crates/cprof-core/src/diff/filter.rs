//! Scope filtering and marketplace association
//!
//! Plugin keys name their marketplace by the locally assigned name
//! (`plugin@name`) while profiles identify marketplaces by repo or URL.
//! The two are related by suffix matching only, which can miss renamed
//! marketplaces or match two repos that share a final path segment.

use cprof_scanner::Scope;

use crate::profile::{Marketplace, Profile};
use crate::scope::{combine_scopes, only_scopes};

/// The marketplace part of a `name@marketplace` plugin key
#[must_use]
pub fn plugin_marketplace_key(plugin: &str) -> Option<&str> {
    plugin.rsplit_once('@').map(|(_, key)| key).filter(|k| !k.is_empty())
}

/// Best-effort check that a marketplace is the one a plugin key refers to
#[must_use]
pub fn marketplace_matches_key(marketplace: &Marketplace, key: &str) -> bool {
    let display = marketplace.display_name().trim_end_matches('/');
    if display.is_empty() || key.is_empty() {
        return false;
    }
    if display == key || display.ends_with(&format!("/{key}")) {
        return true;
    }
    let last = display.rsplit('/').next().unwrap_or(display);
    last.trim_end_matches(".git") == key
}

/// Whether a plugin key belongs to any of the given marketplaces
#[must_use]
pub fn plugin_in_marketplaces(plugin: &str, marketplaces: &[Marketplace]) -> bool {
    plugin_marketplace_key(plugin)
        .is_some_and(|key| marketplaces.iter().any(|m| marketplace_matches_key(m, key)))
}

/// Restrict a profile to the given scopes
///
/// Marketplaces not referenced by any plugin in the kept scopes are
/// dropped; see the module docs for the matching rules.
#[must_use]
pub fn filter_to_scopes(profile: &Profile, scopes: &[Scope]) -> Profile {
    let mut filtered = only_scopes(profile, scopes);
    let plugins = combine_scopes(&filtered).plugins;
    filtered.marketplaces.retain(|m| {
        plugins.iter().any(|p| {
            plugin_marketplace_key(p).is_some_and(|key| marketplace_matches_key(m, key))
        })
    });
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{PerScopeSettings, ScopeSettings};

    #[test]
    fn test_marketplace_key_matching() {
        assert!(marketplace_matches_key(&Marketplace::github("org/tools"), "tools"));
        assert!(marketplace_matches_key(&Marketplace::github("org/tools"), "org/tools"));
        assert!(marketplace_matches_key(
            &Marketplace::git("https://git.example.com/org/tools.git"),
            "tools"
        ));
        assert!(!marketplace_matches_key(&Marketplace::github("org/tools"), "other"));
        assert!(!marketplace_matches_key(&Marketplace::github("org/mytools"), "tools"));
    }

    #[test]
    fn test_plugin_marketplace_key() {
        assert_eq!(plugin_marketplace_key("lint@tools"), Some("tools"));
        assert_eq!(plugin_marketplace_key("lint"), None);
        assert_eq!(plugin_marketplace_key("lint@"), None);
    }

    #[test]
    fn test_filter_prunes_unreferenced_marketplaces() {
        let mut profile = Profile::new("p");
        profile.marketplaces = vec![Marketplace::github("org/tools"), Marketplace::github("org/docs")];
        profile.per_scope = Some(PerScopeSettings {
            user: Some(ScopeSettings {
                plugins: vec!["writer@docs".into()],
                ..ScopeSettings::default()
            }),
            project: Some(ScopeSettings {
                plugins: vec!["lint@tools".into()],
                ..ScopeSettings::default()
            }),
            local: None,
        });

        let filtered = filter_to_scopes(&profile, &[Scope::Project]);
        let per_scope = filtered.per_scope.as_ref().unwrap();
        assert!(per_scope.user.is_none());
        assert_eq!(per_scope.project.as_ref().unwrap().plugins, vec!["lint@tools"]);
        assert_eq!(filtered.marketplaces, vec![Marketplace::github("org/tools")]);
    }
}
