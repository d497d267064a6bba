//! CLI command handlers
//!
//! `apply` holds the commands that drive the claude CLI, `profile` the
//! ones that only read or write the profile store.

pub mod apply;
pub mod profile;

use anyhow::Context as _;
use cprof_core::config::ProfileSource;
use cprof_core::profile::{load_file, ProfileStore};
use cprof_core::{ClaudePaths, Profile};
use std::path::{Path, PathBuf};

/// Paths and profile store shared by every command
pub struct Context {
    pub paths: ClaudePaths,
    pub store: ProfileStore,
}

impl Context {
    pub fn discover(project: Option<PathBuf>) -> anyhow::Result<Self> {
        let paths = ClaudePaths::discover(project)?;
        let store = ProfileStore::new(paths.profiles_dir());
        Ok(Self { paths, store })
    }

    /// Load a profile from a file path if one exists, else from the store
    pub fn resolve_profile(&self, reference: &str) -> anyhow::Result<(Profile, ProfileSource)> {
        let path = Path::new(reference);
        if path.is_file() {
            let profile = load_file(path)
                .with_context(|| format!("Failed to load profile file {}", path.display()))?;
            return Ok((profile, ProfileSource::File));
        }
        Ok((self.store.load(reference)?, ProfileSource::Saved))
    }
}
