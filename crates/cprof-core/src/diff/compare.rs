//! Profile comparison

use cprof_scanner::{LiveState, Scope};
use std::collections::{BTreeMap, BTreeSet};

use crate::diff::{DiffItem, DiffKind, DiffOp, ProfileDiff, ScopeDiff};
use crate::profile::{snapshot_from_state, Marketplace, McpServer, Profile};
use crate::scope::{as_per_scope, configured_scopes, extract_scope, only_scopes};
use crate::secrets::braced_placeholders;

/// Compare a saved profile against a live snapshot, scope by scope
///
/// Items only in `live` are added, items only in `saved` are removed.
#[must_use]
pub fn compare(saved: &Profile, live: &Profile) -> ProfileDiff {
    let description_change = (saved.description != live.description)
        .then(|| (saved.description.clone(), live.description.clone()));

    let mut scopes = Vec::new();
    for scope in Scope::ALL {
        let saved_scope = extract_scope(saved, scope);
        let live_scope = extract_scope(live, scope);
        let mut items = Vec::new();

        if !saved.skip_plugin_diff {
            items.extend(diff_strings(
                &saved_scope.plugins,
                &live_scope.plugins,
                DiffKind::Plugin,
            ));
        }

        items.extend(diff_mcp_servers(
            &saved_scope.mcp_servers,
            &live_scope.mcp_servers,
            scope,
        ));

        let categories = saved_scope
            .local_items
            .categories()
            .into_iter()
            .zip(live_scope.local_items.categories());
        for ((category, saved_patterns), (_, live_patterns)) in categories {
            let saved_names = prefixed(category, saved_patterns);
            let live_names = prefixed(category, live_patterns);
            items.extend(diff_strings(&saved_names, &live_names, DiffKind::Extension));
        }

        // Marketplaces are global: only ever reported under user
        if scope == Scope::User {
            items.extend(diff_marketplaces(
                &saved_scope.marketplaces,
                &live_scope.marketplaces,
            ));
        }

        if !items.is_empty() {
            scopes.push(ScopeDiff { scope, items });
        }
    }

    ProfileDiff {
        description_change,
        scopes,
    }
}

/// Compare a profile with live state in the scopes the profile configures
///
/// Fields a snapshot cannot observe (description, secret sources) are
/// taken from the profile so they never show up as changes. Extension
/// patterns are expanded against the live item names first.
#[must_use]
pub fn compare_with_live(profile: &Profile, state: &LiveState) -> ProfileDiff {
    let scopes = configured_scopes(profile);
    let mut live = only_scopes(&snapshot_from_state(state, &profile.name), &scopes);
    live.preserve_from(profile);
    let saved = expand_patterns(&only_scopes(profile, &scopes), &live);
    compare(&saved, &live)
}

/// Replace each scope's extension patterns with the live names they match
///
/// A pattern matching nothing is kept as written and reports as removed.
fn expand_patterns(saved: &Profile, live: &Profile) -> Profile {
    let live_scopes = as_per_scope(live);
    let mut per_scope = as_per_scope(saved);

    for scope in Scope::ALL {
        let Some(items) = per_scope
            .get_mut(scope)
            .as_mut()
            .and_then(|settings| settings.local_items.as_mut())
        else {
            continue;
        };
        let live_items = live_scopes
            .get(scope)
            .and_then(|settings| settings.local_items.clone())
            .unwrap_or_default();

        for (category, live_names) in live_items.categories() {
            if let Some(patterns) = items.category_mut(category) {
                let expanded = expand_category(patterns, live_names);
                *patterns = expanded;
            }
        }
    }

    let mut expanded = saved.clone();
    expanded.per_scope = Some(per_scope);
    expanded
}

fn expand_category(patterns: &[String], names: &[String]) -> Vec<String> {
    let mut out = BTreeSet::new();
    for pattern in patterns {
        let matched: Vec<&String> = match glob::Pattern::new(pattern) {
            Ok(matcher) => names.iter().filter(|n| matcher.matches(n)).collect(),
            Err(_) => Vec::new(),
        };
        if matched.is_empty() {
            out.insert(pattern.clone());
        } else {
            out.extend(matched.into_iter().cloned());
        }
    }
    out.into_iter().collect()
}

fn prefixed(category: &str, names: &[String]) -> Vec<String> {
    names.iter().map(|n| format!("{category}/{n}")).collect()
}

/// Set difference of identifiers; there is no modified state
fn diff_strings(saved: &[String], live: &[String], kind: DiffKind) -> Vec<DiffItem> {
    let saved_set: BTreeSet<&str> = saved.iter().map(String::as_str).collect();
    let live_set: BTreeSet<&str> = live.iter().map(String::as_str).collect();

    let added = live_set
        .difference(&saved_set)
        .map(|name| DiffItem::new(DiffOp::Added, kind, *name));
    let removed = saved_set
        .difference(&live_set)
        .map(|name| DiffItem::new(DiffOp::Removed, kind, *name));
    added.chain(removed).collect()
}

fn diff_mcp_servers(saved: &[McpServer], live: &[McpServer], scope: Scope) -> Vec<DiffItem> {
    let saved_by_name: BTreeMap<&str, &McpServer> =
        saved.iter().map(|s| (s.name.as_str(), s)).collect();
    let live_by_name: BTreeMap<&str, &McpServer> =
        live.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut items = Vec::new();
    for (name, live_server) in &live_by_name {
        match saved_by_name.get(name) {
            None => items.push(DiffItem::new(DiffOp::Added, DiffKind::McpServer, *name)),
            Some(saved_server) => {
                if let Some(detail) = describe_mcp_change(saved_server, live_server, scope) {
                    items.push(
                        DiffItem::new(DiffOp::Modified, DiffKind::McpServer, *name)
                            .with_detail(detail),
                    );
                }
            }
        }
    }
    for name in saved_by_name.keys() {
        if !live_by_name.contains_key(name) {
            items.push(DiffItem::new(DiffOp::Removed, DiffKind::McpServer, *name));
        }
    }
    items
}

/// Name the changed fields, or `None` when the servers are equivalent
///
/// Secret values are never compared, only which placeholders exist.
fn describe_mcp_change(saved: &McpServer, live: &McpServer, scope: Scope) -> Option<String> {
    let mut changed = Vec::new();
    if saved.command != live.command {
        changed.push(format!("command: {} -> {}", saved.command, live.command));
    }
    // Argument values may carry resolved secrets and are never printed
    let saved_args = braced_placeholders(&saved.args, &saved.secrets);
    let live_args = braced_placeholders(&live.args, &live.secrets);
    if saved_args != live_args {
        changed.push(format!("args: {} -> {} values", saved_args.len(), live_args.len()));
    }
    let (saved_scope, live_scope) = (saved.effective_scope(scope), live.effective_scope(scope));
    if saved_scope != live_scope {
        changed.push(format!("scope: {saved_scope} -> {live_scope}"));
    }

    if !changed.is_empty() {
        return Some(changed.join("; "));
    }

    let saved_keys: BTreeSet<&String> = saved.secrets.keys().collect();
    let live_keys: BTreeSet<&String> = live.secrets.keys().collect();
    (saved_keys != live_keys).then(|| "config changed".to_string())
}

fn diff_marketplaces(saved: &[Marketplace], live: &[Marketplace]) -> Vec<DiffItem> {
    let saved_keys: Vec<String> = saved.iter().map(|m| m.display_name().to_string()).collect();
    let live_keys: Vec<String> = live.iter().map(|m| m.display_name().to_string()).collect();
    diff_strings(&saved_keys, &live_keys, DiffKind::Marketplace)
}
