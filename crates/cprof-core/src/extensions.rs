//! Local extension item enablement
//!
//! Items live in the cprof library (`~/.cprof/local/<category>/<item>`) and
//! are enabled by linking them into a scope's `.claude/<category>/`.

use cprof_scanner::extensions::list_items;
use std::fs;
use std::path::Path;

use crate::config::{SettingsError, SettingsResult};
use crate::profile::ExtensionPatterns;

/// Outcome of enabling a set of patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnableReport {
    /// Newly linked items, as `category/item`
    pub enabled: Vec<String>,
    /// Items that were already present in the target
    pub already_enabled: Vec<String>,
    /// Patterns that were invalid or matched nothing
    pub warnings: Vec<String>,
}

/// Link every library item matching the patterns into `target`
///
/// `target` is the scope's `.claude` directory.
pub fn enable_items(
    library: &Path,
    target: &Path,
    patterns: &ExtensionPatterns,
) -> SettingsResult<EnableReport> {
    let mut report = EnableReport::default();

    for (category, category_patterns) in patterns.categories() {
        if category_patterns.is_empty() {
            continue;
        }
        let available = list_items(&library.join(category));

        for pattern in category_patterns {
            let matcher = match glob::Pattern::new(pattern) {
                Ok(m) => m,
                Err(e) => {
                    report
                        .warnings
                        .push(format!("Invalid {category} pattern '{pattern}': {e}"));
                    continue;
                }
            };

            let matches: Vec<&String> = available.iter().filter(|n| matcher.matches(n)).collect();
            if matches.is_empty() {
                report
                    .warnings
                    .push(format!("{category} pattern '{pattern}' matched no library items"));
                continue;
            }

            for name in matches {
                let label = format!("{category}/{name}");
                if report.enabled.contains(&label) || report.already_enabled.contains(&label) {
                    continue;
                }
                let source = library.join(category).join(name);
                let dest = target.join(category).join(name);
                if fs::symlink_metadata(&dest).is_ok() {
                    report.already_enabled.push(label);
                    continue;
                }
                link_item(&source, &dest)?;
                tracing::debug!("Enabled {label} in {}", target.display());
                report.enabled.push(label);
            }
        }
    }

    Ok(report)
}

#[cfg(unix)]
fn link_item(source: &Path, dest: &Path) -> SettingsResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, &e))?;
    }
    std::os::unix::fs::symlink(source, dest).map_err(|e| SettingsError::io(dest, &e))
}

#[cfg(not(unix))]
fn link_item(source: &Path, dest: &Path) -> SettingsResult<()> {
    use walkdir::WalkDir;

    if source.is_file() {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, &e))?;
        }
        fs::copy(source, dest).map_err(|e| SettingsError::io(dest, &e))?;
        return Ok(());
    }

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| SettingsError::Io {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| SettingsError::io(&target, &e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| SettingsError::io(&target, &e))?;
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library(root: &Path) {
        let agents = root.join("agents");
        fs::create_dir_all(&agents).unwrap();
        fs::write(agents.join("reviewer.md"), "# reviewer").unwrap();
        fs::write(agents.join("release-notes.md"), "# notes").unwrap();
        fs::write(agents.join("architect.md"), "# architect").unwrap();
        fs::create_dir_all(root.join("skills").join("pdf")).unwrap();
    }

    #[test]
    fn test_enable_glob_patterns() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib");
        let target = dir.path().join("proj").join(".claude");
        library(&lib);

        let patterns = ExtensionPatterns {
            agents: vec!["re*".into()],
            skills: vec!["*".into()],
            rules: vec!["nothing".into()],
            ..Default::default()
        };
        let report = enable_items(&lib, &target, &patterns).unwrap();

        assert_eq!(
            report.enabled,
            vec!["agents/release-notes.md", "agents/reviewer.md", "skills/pdf"]
        );
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("rules"));
        assert!(fs::symlink_metadata(target.join("agents/reviewer.md"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert!(!target.join("agents/architect.md").exists());
    }

    #[test]
    fn test_enable_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib");
        let target = dir.path().join(".claude");
        library(&lib);

        let patterns = ExtensionPatterns {
            agents: vec!["architect.md".into()],
            ..Default::default()
        };
        enable_items(&lib, &target, &patterns).unwrap();
        let second = enable_items(&lib, &target, &patterns).unwrap();
        assert!(second.enabled.is_empty());
        assert_eq!(second.already_enabled, vec!["agents/architect.md"]);
    }
}
