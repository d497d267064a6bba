//! Read-modify-write JSON documents

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{SettingsError, SettingsResult};

/// A JSON object file loaded for modification
///
/// Keys the caller does not touch are written back unchanged.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
    root: Map<String, Value>,
}

impl JsonDocument {
    /// Load a document; a missing or empty file is an empty object
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let root = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => {
                let value: Value =
                    serde_json::from_str(&content).map_err(|e| SettingsError::json(path, &e))?;
                match value {
                    Value::Object(map) => map,
                    _ => {
                        return Err(SettingsError::NotAnObject {
                            path: path.to_path_buf(),
                        })
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(SettingsError::io(path, &e)),
        };

        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Remove and return the object under `key`; a missing or non-object
    /// value yields an empty map
    pub fn take_object(&mut self, key: &str) -> Map<String, Value> {
        match self.root.remove(key) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_string(), value);
    }

    /// Write back as pretty JSON, creating parent directories
    pub fn save(&self) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, &e))?;
        }

        let mut content = serde_json::to_string_pretty(&Value::Object(self.root.clone()))
            .map_err(|e| SettingsError::json(&self.path, &e))?;
        content.push('\n');
        fs::write(&self.path, content).map_err(|e| SettingsError::io(&self.path, &e))?;

        tracing::debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let doc = JsonDocument::load(&dir.path().join("none.json")).unwrap();
        assert!(doc.root().is_empty());
    }

    #[test]
    fn test_non_object_root() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            JsonDocument::load(&path),
            Err(SettingsError::NotAnObject { .. })
        ));
    }

    #[test]
    fn test_preserves_unrelated_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"model": "opus", "permissions": {"allow": ["Bash"]}}"#).unwrap();

        let mut doc = JsonDocument::load(&path).unwrap();
        let mut plugins = doc.take_object("enabledPlugins");
        plugins.insert("a@mp".into(), json!(true));
        doc.insert("enabledPlugins", Value::Object(plugins));
        doc.save().unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["model"], "opus");
        assert_eq!(written["permissions"]["allow"][0], "Bash");
        assert_eq!(written["enabledPlugins"]["a@mp"], true);
    }
}
