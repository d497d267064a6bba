//! Settings.json parser

use crate::error::{ScanError, ScanResult};
use crate::settings::SettingsFile;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Raw settings.json structure for parsing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    hooks: BTreeMap<String, serde_json::Value>,
    model: Option<String>,
    #[serde(default)]
    enabled_plugins: BTreeMap<String, serde_json::Value>,
}

/// Parse a settings.json file
///
/// Non-boolean `enabledPlugins` values are ignored rather than rejected;
/// the file is owned by Claude Code and may carry shapes we don't model.
///
/// # Errors
/// Returns an error if the content is not a JSON object of the expected shape
pub fn parse_settings(path: &Path, content: &str) -> ScanResult<SettingsFile> {
    if content.trim().is_empty() {
        return Ok(SettingsFile {
            path: path.to_path_buf(),
            ..SettingsFile::default()
        });
    }

    let raw: RawSettings =
        serde_json::from_str(content).map_err(|e| ScanError::json(path, e))?;

    let enabled_plugins = raw
        .enabled_plugins
        .into_iter()
        .filter_map(|(key, value)| value.as_bool().map(|enabled| (key, enabled)))
        .collect();

    Ok(SettingsFile {
        path: path.to_path_buf(),
        enabled_plugins,
        hooks: raw.hooks,
        env: raw.env,
        model: raw.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_settings() {
        let content = r#"{
            "env": { "FOO": "bar" },
            "permissions": { "allow": ["Bash(npm:*)"] },
            "hooks": { "PostToolUse": [] },
            "model": "opus",
            "enabledPlugins": {
                "review@team-tools": true,
                "legacy@team-tools": false,
                "odd@team-tools": "yes"
            }
        }"#;

        let settings = parse_settings(&PathBuf::from("settings.json"), content).unwrap();
        assert_eq!(settings.hooks.len(), 1);
        assert_eq!(settings.model, Some("opus".to_string()));
        assert_eq!(settings.enabled_plugins.len(), 2);
        let enabled: Vec<_> = settings.enabled_plugin_keys().collect();
        assert_eq!(enabled, vec!["review@team-tools"]);
    }

    #[test]
    fn test_parse_empty_settings() {
        let settings = parse_settings(&PathBuf::from("settings.json"), "  \n").unwrap();
        assert!(settings.enabled_plugins.is_empty());
    }

    #[test]
    fn test_parse_invalid_settings() {
        let result = parse_settings(&PathBuf::from("settings.json"), "[1, 2]");
        assert!(matches!(result, Err(ScanError::JsonParse { .. })));
    }
}
