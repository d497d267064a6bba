//! Scope settings file writes
//!
//! cprof owns `enabledPlugins` and appends to `hooks`. Everything else in
//! the file belongs to the user or to Claude Code.

use cprof_scanner::{ClaudePaths, Scope};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::document::JsonDocument;
use super::error::{SettingsError, SettingsResult};
use crate::profile::SettingsHooks;

const ENABLED_PLUGINS: &str = "enabledPlugins";
const HOOKS: &str = "hooks";

/// How to update `enabledPlugins`
#[derive(Debug, Clone, Copy)]
pub enum PluginWrite<'a> {
    /// The map becomes exactly `enable` set to true plus `disable` set to
    /// false. Claude Code treats absent keys as enabled, so plugins being
    /// removed must be written out explicitly.
    Replace {
        enable: &'a [String],
        disable: &'a [String],
    },
    /// Existing entries are kept and `enable` is set to true
    Merge { enable: &'a [String] },
}

/// A scope's settings.json loaded for modification
#[derive(Debug, Clone)]
pub struct SettingsDocument {
    doc: JsonDocument,
}

impl SettingsDocument {
    pub fn load(path: &Path) -> SettingsResult<Self> {
        Ok(Self {
            doc: JsonDocument::load(path)?,
        })
    }

    /// Load the settings file of a scope
    pub fn for_scope(paths: &ClaudePaths, scope: Scope) -> SettingsResult<Self> {
        Self::load(&paths.settings_path(scope)?)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Current `enabledPlugins`, ignoring non-boolean values
    #[must_use]
    pub fn enabled_plugins(&self) -> BTreeMap<String, bool> {
        self.doc
            .root()
            .get(ENABLED_PLUGINS)
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn write_plugins(&mut self, write: PluginWrite<'_>) {
        let plugins = match write {
            PluginWrite::Replace { enable, disable } => {
                let mut map = Map::new();
                for key in disable {
                    map.insert(key.clone(), Value::Bool(false));
                }
                for key in enable {
                    map.insert(key.clone(), Value::Bool(true));
                }
                map
            }
            PluginWrite::Merge { enable } => {
                let mut map = self.doc.take_object(ENABLED_PLUGINS);
                for key in enable {
                    map.insert(key.clone(), Value::Bool(true));
                }
                map
            }
        };
        self.doc.insert(ENABLED_PLUGINS, Value::Object(plugins));
    }

    /// Append hook groups not already present; returns how many were added
    ///
    /// A group counts as present when every one of its commands is already
    /// registered for the same event.
    pub fn merge_hooks(&mut self, hooks: &SettingsHooks) -> SettingsResult<usize> {
        if hooks.is_empty() {
            return Ok(0);
        }

        let mut events = self.doc.take_object(HOOKS);
        let mut added = 0;

        for (event, groups) in hooks {
            let existing = match events.remove(event) {
                Some(Value::Array(list)) => list,
                _ => Vec::new(),
            };
            let mut known = registered_commands(&existing);
            let mut list = existing;

            for group in groups {
                if group.hooks.iter().all(|h| known.contains(&h.command)) {
                    continue;
                }
                let value = serde_json::to_value(group)
                    .map_err(|e| SettingsError::json(self.doc.path(), &e))?;
                known.extend(group.hooks.iter().map(|h| h.command.clone()));
                list.push(value);
                added += 1;
            }

            events.insert(event.clone(), Value::Array(list));
        }

        self.doc.insert(HOOKS, Value::Object(events));
        Ok(added)
    }

    pub fn save(&self) -> SettingsResult<()> {
        self.doc.save()
    }
}

fn registered_commands(groups: &[Value]) -> BTreeSet<String> {
    groups
        .iter()
        .filter_map(|group| group.get("hooks").and_then(Value::as_array))
        .flatten()
        .filter_map(|hook| hook.get("command").and_then(Value::as_str))
        .map(String::from)
        .collect()
}
