//! Profile file storage
//!
//! Profiles are stored as pretty JSON at `~/.cprof/profiles/<name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Profile, ProfileError, ProfileResult};

/// Directory of saved profiles
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> ProfileResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Whether a profile with this name is stored
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|p| p.is_file())
    }

    /// Load a stored profile by name
    pub fn load(&self, name: &str) -> ProfileResult<Profile> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(ProfileError::NotFound(name.to_string()));
        }
        load_file(&path)
    }

    /// Write a profile, replacing any existing one with the same name
    pub fn save(&self, profile: &Profile) -> ProfileResult<PathBuf> {
        let path = self.path_for(&profile.name)?;
        fs::create_dir_all(&self.dir).map_err(|e| ProfileError::io(&self.dir, &e))?;

        let mut content = serde_json::to_string_pretty(profile)
            .map_err(|e| ProfileError::json(&path, &e))?;
        content.push('\n');
        fs::write(&path, content).map_err(|e| ProfileError::io(&path, &e))?;

        tracing::debug!("Saved profile {} to {}", profile.name, path.display());
        Ok(path)
    }

    /// Names of all stored profiles, sorted
    pub fn list(&self) -> ProfileResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| ProfileError::io(&self.dir, &e))?;
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Store a copy of an existing profile under a new name
    pub fn clone_profile(&self, from: &str, to: &str) -> ProfileResult<Profile> {
        if self.exists(to) {
            return Err(ProfileError::AlreadyExists(to.to_string()));
        }
        let copy = self.load(from)?.clone_as(to);
        self.save(&copy)?;
        Ok(copy)
    }
}

/// Load a profile from an explicit file path
pub fn load_file(path: &Path) -> ProfileResult<Profile> {
    let content = fs::read_to_string(path).map_err(|e| ProfileError::io(path, &e))?;
    serde_json::from_str(&content).map_err(|e| ProfileError::json(path, &e))
}

fn validate_name(name: &str) -> ProfileResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ProfileError::InvalidName(name.to_string()))
    }
}
