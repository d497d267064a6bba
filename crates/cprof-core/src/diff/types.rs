//! Diff result types

use cprof_scanner::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    /// Present in live, not in the saved profile
    Added,
    /// Present in the saved profile, not in live
    Removed,
    /// Present in both with different configuration
    Modified,
}

impl DiffOp {
    /// One-character marker used in terminal output
    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Modified => '~',
        }
    }
}

/// Category of a diffed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Plugin,
    McpServer,
    Extension,
    Marketplace,
    /// A scope settings file; only apply reports use it
    Settings,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plugin => "plugin",
            Self::McpServer => "mcp-server",
            Self::Extension => "extension",
            Self::Marketplace => "marketplace",
            Self::Settings => "settings",
        })
    }
}

/// A single difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffItem {
    pub op: DiffOp,
    pub kind: DiffKind,
    pub name: String,
    /// Which sub-fields changed, for modified items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DiffItem {
    pub fn new(op: DiffOp, kind: DiffKind, name: impl Into<String>) -> Self {
        Self {
            op,
            kind,
            name: name.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Differences within one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDiff {
    pub scope: Scope,
    pub items: Vec<DiffItem>,
}

impl ScopeDiff {
    /// Items of one operation and kind
    pub fn filter(&self, op: DiffOp, kind: DiffKind) -> impl Iterator<Item = &DiffItem> {
        self.items
            .iter()
            .filter(move |item| item.op == op && item.kind == kind)
    }

    /// Names of items of one operation and kind
    #[must_use]
    pub fn names(&self, op: DiffOp, kind: DiffKind) -> Vec<&str> {
        self.filter(op, kind).map(|item| item.name.as_str()).collect()
    }
}

/// Differences between a saved profile and live state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDiff {
    /// (saved, live) descriptions when they differ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_change: Option<(String, String)>,
    /// Scopes with at least one item, in user, project, local order
    pub scopes: Vec<ScopeDiff>,
}

impl ProfileDiff {
    /// No description change and no items in any scope
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description_change.is_none() && self.scopes.iter().all(|s| s.items.is_empty())
    }

    /// The diff for one scope, if it has any items
    #[must_use]
    pub fn scope(&self, scope: Scope) -> Option<&ScopeDiff> {
        self.scopes.iter().find(|s| s.scope == scope)
    }

    /// Tallies across every scope
    #[must_use]
    pub fn counts(&self) -> DiffCounts {
        let mut counts = DiffCounts::default();
        for item in self.scopes.iter().flat_map(|s| &s.items) {
            match item.op {
                DiffOp::Added => counts.added += 1,
                DiffOp::Removed => counts.removed += 1,
                DiffOp::Modified => counts.modified += 1,
            }
        }
        counts
    }
}

/// Aggregate counts for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DiffCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }

    /// Format as a one-line summary
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{} added, {} removed, {} modified",
            self.added, self.removed, self.modified
        )
    }
}
