//! Apply result reporting

use cprof_scanner::Scope;
use serde::Serialize;

use crate::diff::DiffKind;
use crate::exec::Outcome;

/// One item that failed; the rest of the run continued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub kind: DiffKind,
    pub name: String,
    pub message: String,
}

/// Outcome lists for one category of item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryOutcome {
    pub installed: Vec<String>,
    pub already_installed: Vec<String>,
    pub removed: Vec<String>,
    pub already_removed: Vec<String>,
}

impl CategoryOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
            && self.already_installed.is_empty()
            && self.removed.is_empty()
            && self.already_removed.is_empty()
    }

    fn extend(&mut self, other: CategoryOutcome) {
        self.installed.extend(other.installed);
        self.already_installed.extend(other.already_installed);
        self.removed.extend(other.removed);
        self.already_removed.extend(other.already_removed);
    }

    fn sort(&mut self) {
        self.installed.sort();
        self.already_installed.sort();
        self.removed.sort();
        self.already_removed.sort();
    }
}

/// Everything an apply, reset or sync did
///
/// Returned even when some items failed, so partial runs stay inspectable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Scopes that were processed, in order
    pub scopes: Vec<Scope>,
    pub plugins: CategoryOutcome,
    pub mcp_servers: CategoryOutcome,
    pub marketplaces: CategoryOutcome,
    pub extensions: CategoryOutcome,
    /// Hook groups merged into settings files
    pub hooks_merged: usize,
    pub errors: Vec<ItemError>,
    pub warnings: Vec<String>,
    /// Nothing was executed or written
    pub dry_run: bool,
}

/// Whether an item was being added or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Install,
    Remove,
}

impl ApplyReport {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// No item failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn category_mut(&mut self, kind: DiffKind) -> Option<&mut CategoryOutcome> {
        match kind {
            DiffKind::Plugin => Some(&mut self.plugins),
            DiffKind::McpServer => Some(&mut self.mcp_servers),
            DiffKind::Marketplace => Some(&mut self.marketplaces),
            DiffKind::Extension => Some(&mut self.extensions),
            DiffKind::Settings => None,
        }
    }

    /// File a classified outcome under the right list
    pub fn record(&mut self, kind: DiffKind, name: &str, direction: Direction, outcome: Outcome) {
        if let Outcome::Failed(message) = outcome {
            tracing::warn!("{kind} {name}: {message}");
            self.errors.push(ItemError {
                kind,
                name: name.to_string(),
                message,
            });
            return;
        }

        let Some(category) = self.category_mut(kind) else {
            return;
        };
        let list = match (direction, outcome) {
            (Direction::Install, Outcome::AlreadyDone) => &mut category.already_installed,
            (Direction::Install, _) => &mut category.installed,
            (Direction::Remove, Outcome::AlreadyDone) => &mut category.already_removed,
            (Direction::Remove, _) => &mut category.removed,
        };
        list.push(name.to_string());
    }

    pub fn error(&mut self, kind: DiffKind, name: &str, message: impl Into<String>) {
        self.record(kind, name, Direction::Install, Outcome::Failed(message.into()));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: ApplyReport) {
        for scope in other.scopes {
            if !self.scopes.contains(&scope) {
                self.scopes.push(scope);
            }
        }
        self.plugins.extend(other.plugins);
        self.mcp_servers.extend(other.mcp_servers);
        self.marketplaces.extend(other.marketplaces);
        self.extensions.extend(other.extensions);
        self.hooks_merged += other.hooks_merged;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.dry_run |= other.dry_run;
    }

    /// Sort every list so results do not depend on execution order
    pub fn sort(&mut self) {
        self.plugins.sort();
        self.mcp_servers.sort();
        self.marketplaces.sort();
        self.extensions.sort();
        self.errors
            .sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
    }
}
