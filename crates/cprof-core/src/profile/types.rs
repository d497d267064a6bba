//! Profile types

use cprof_scanner::Scope;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::secrets::SecretRef;

/// A declarative description of the desired Claude Code configuration
///
/// A profile carries either the legacy flat fields (implicitly user scope)
/// or a `per_scope` container. When `per_scope` is present the flat
/// plugin, MCP and local item fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile name
    pub name: String,
    /// Human description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Plugin keys (`name@marketplace`), order-significant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    /// MCP server definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServer>,
    /// Marketplace sources; never scoped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marketplaces: Vec<Marketplace>,
    /// Independent settings per scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_scope: Option<PerScopeSettings>,
    /// Local extension item patterns (flat form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_items: Option<ExtensionPatterns>,
    /// Command to run after a successful apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_apply: Option<PostApplyHook>,
    /// Hook groups merged into the scope's settings file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings_hooks: SettingsHooks,
    /// Leave plugins alone entirely (profile owned by another tool)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_plugin_diff: bool,
}

impl Profile {
    /// Create an empty profile with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy this profile under a new name
    #[must_use]
    pub fn clone_as(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Carry over the fields a live snapshot cannot observe
    ///
    /// Used when re-saving a profile from current state: the description,
    /// hooks, secret requirements and flags come from the stored profile.
    pub fn preserve_from(&mut self, previous: &Profile) {
        if self.description.is_empty() {
            self.description.clone_from(&previous.description);
        }
        if self.post_apply.is_none() {
            self.post_apply.clone_from(&previous.post_apply);
        }
        if self.settings_hooks.is_empty() {
            self.settings_hooks.clone_from(&previous.settings_hooks);
        }
        self.skip_plugin_diff = previous.skip_plugin_diff;

        let old_servers = crate::scope::combine_scopes(previous).mcp_servers;
        // Snapshots hold source-less placeholders; fill them from the old profile
        let restore = |servers: &mut Vec<McpServer>| {
            for server in servers.iter_mut() {
                let Some(old) = old_servers.iter().find(|s| s.name == server.name) else {
                    continue;
                };
                if server.secrets.is_empty() {
                    server.secrets.clone_from(&old.secrets);
                    continue;
                }
                for (key, secret) in &mut server.secrets {
                    if secret.sources.is_empty() {
                        if let Some(previous) = old.secrets.get(key) {
                            secret.clone_from(previous);
                        }
                    }
                }
            }
        };
        restore(&mut self.mcp_servers);
        if let Some(per_scope) = self.per_scope.as_mut() {
            for settings in per_scope.iter_mut() {
                restore(&mut settings.mcp_servers);
            }
        }
    }
}

/// Plugins, MCP servers and extension items of exactly one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_items: Option<ExtensionPatterns>,
}

impl ScopeSettings {
    /// Nothing configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
            && self.mcp_servers.is_empty()
            && self.local_items.as_ref().map_or(true, ExtensionPatterns::is_empty)
    }
}

/// Settings for each scope, independently
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerScopeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ScopeSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ScopeSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<ScopeSettings>,
}

impl PerScopeSettings {
    #[must_use]
    pub fn get(&self, scope: Scope) -> Option<&ScopeSettings> {
        match scope {
            Scope::User => self.user.as_ref(),
            Scope::Project => self.project.as_ref(),
            Scope::Local => self.local.as_ref(),
        }
    }

    pub fn get_mut(&mut self, scope: Scope) -> &mut Option<ScopeSettings> {
        match scope {
            Scope::User => &mut self.user,
            Scope::Project => &mut self.project,
            Scope::Local => &mut self.local,
        }
    }

    /// Present scopes in user -> project -> local order
    pub fn iter(&self) -> impl Iterator<Item = (Scope, &ScopeSettings)> {
        Scope::ALL
            .into_iter()
            .filter_map(move |scope| self.get(scope).map(|s| (scope, s)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScopeSettings> {
        [&mut self.user, &mut self.project, &mut self.local]
            .into_iter()
            .filter_map(Option::as_mut)
    }
}

/// MCP server definition
///
/// `name` is the join key; equality for diffing is command, args, scope
/// and the shape of the secrets map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServer {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Declared scope tag; when absent, the scope the server is listed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Secret placeholders (env var name) to their sources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, SecretRef>,
}

impl McpServer {
    /// Create a server with no arguments or secrets
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| (*a).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_secret(mut self, key: impl Into<String>, secret: SecretRef) -> Self {
        self.secrets.insert(key.into(), secret);
        self
    }

    /// Scope tag, falling back to the scope the server is listed under
    #[must_use]
    pub fn effective_scope(&self, listed_under: Scope) -> Scope {
        self.scope.unwrap_or(listed_under)
    }
}

/// A marketplace source; always user-scoped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
    /// Source kind (github, git, url, directory)
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Marketplace {
    /// A GitHub marketplace (`owner/repo`)
    pub fn github(repo: impl Into<String>) -> Self {
        Self {
            source: "github".to_string(),
            repo: Some(repo.into()),
            url: None,
        }
    }

    /// A git or URL marketplace
    pub fn git(url: impl Into<String>) -> Self {
        Self {
            source: "git".to_string(),
            repo: None,
            url: Some(url.into()),
        }
    }

    /// Identity key: repo if present, else URL
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.repo
            .as_deref()
            .filter(|r| !r.is_empty())
            .or(self.url.as_deref())
            .unwrap_or("")
    }
}

/// Local extension item patterns per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtensionPatterns {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_styles: Vec<String>,
}

impl ExtensionPatterns {
    /// Patterns per category, using on-disk category names
    #[must_use]
    pub fn categories(&self) -> [(&'static str, &[String]); 6] {
        [
            ("agents", &self.agents),
            ("commands", &self.commands),
            ("skills", &self.skills),
            ("hooks", &self.hooks),
            ("rules", &self.rules),
            ("output-styles", &self.output_styles),
        ]
    }

    /// Mutable list for an on-disk category name
    pub fn category_mut(&mut self, category: &str) -> Option<&mut Vec<String>> {
        match category {
            "agents" => Some(&mut self.agents),
            "commands" => Some(&mut self.commands),
            "skills" => Some(&mut self.skills),
            "hooks" => Some(&mut self.hooks),
            "rules" => Some(&mut self.rules),
            "output-styles" => Some(&mut self.output_styles),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories().iter().all(|(_, items)| items.is_empty())
    }
}

/// When a post-apply hook runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookCondition {
    #[default]
    Always,
    /// Only when the profile had never been applied to the scope
    FirstRun,
}

/// Shell command run after a successful apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostApplyHook {
    pub command: String,
    #[serde(default)]
    pub condition: HookCondition,
}

/// Hook groups per settings event (e.g. `SessionStart`)
pub type SettingsHooks = BTreeMap<String, Vec<HookGroup>>;

/// A matcher plus the hooks it triggers, as Claude Code stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    pub hooks: Vec<HookCommand>,
}

/// One hook action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    #[serde(rename = "type", default = "default_hook_type")]
    pub hook_type: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_hook_type() -> String {
    "command".to_string()
}
