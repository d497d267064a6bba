//! Extension item listing
//!
//! Agents, commands, skills, hooks, rules and output styles are plain
//! files or directories under `<claude dir>/<category>/`. The same layout
//! is used by the cprof library, so one lister serves both.

use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::paths::EXTENSION_CATEGORIES;

/// Item names per category; categories with no items are omitted
pub type ExtensionItems = BTreeMap<String, Vec<String>>;

/// List the direct children of `dir`, sorted by name
///
/// Hidden entries are skipped. A missing directory has no items.
#[must_use]
pub fn list_items(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut items: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to read entry in {}: {}", dir.display(), e);
                None
            }
        })
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| !name.starts_with('.'))
        .collect();

    items.sort();
    items
}

/// List items of every category under a root directory
#[must_use]
pub fn list_categories(root: &Path) -> ExtensionItems {
    EXTENSION_CATEGORIES
        .iter()
        .filter_map(|category| {
            let items = list_items(&root.join(category));
            (!items.is_empty()).then(|| ((*category).to_string(), items))
        })
        .collect()
}
