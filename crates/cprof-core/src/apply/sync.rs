//! Team sync from a project's applied-profile record

use cprof_scanner::Scope;
use std::collections::{BTreeMap, BTreeSet};

use super::report::{ApplyReport, Direction};
use super::{Applier, ApplyError, ApplyResult};
use crate::config::AppliedRecord;
use crate::diff::DiffKind;
use crate::exec::Outcome;
use crate::secrets::substitute_args;

impl Applier<'_> {
    /// Install what the project record lists, for a teammate's machine
    ///
    /// Marketplace and secret problems are warnings: a teammate without
    /// access to one server's credentials still gets everything else.
    pub fn sync_project(&self) -> ApplyResult<ApplyReport> {
        let record_path = self.paths.project_record_path()?;
        let record = AppliedRecord::load(&record_path)?
            .ok_or_else(|| ApplyError::NoRecord(record_path.clone()))?;
        tracing::info!("Syncing project from profile {}", record.profile);

        let state = self.scan(true)?;
        let mut report = ApplyReport::new(self.options.dry_run);
        report.scopes = vec![Scope::Project, Scope::Local];

        for marketplace in &record.marketplaces {
            let key = marketplace.display_name();
            if state.marketplaces.contains_location(key) {
                report.record(DiffKind::Marketplace, key, Direction::Install, Outcome::AlreadyDone);
                continue;
            }
            match self.run(&self.cli.marketplace_add(key)) {
                Outcome::Failed(message) => {
                    report.warn(format!("Could not add marketplace {key}: {message}"));
                }
                outcome => report.record(DiffKind::Marketplace, key, Direction::Install, outcome),
            }
        }

        for plugin in &record.plugins {
            let outcome = self.run(&self.cli.plugin_install(plugin, Scope::Project));
            report.record(DiffKind::Plugin, plugin, Direction::Install, outcome);
        }

        let present: BTreeSet<&str> = state
            .local
            .as_ref()
            .map(|s| s.mcp_servers.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default();

        for server in &record.local_mcp_servers {
            if present.contains(server.name.as_str()) {
                report.record(DiffKind::McpServer, &server.name, Direction::Install, Outcome::AlreadyDone);
                continue;
            }
            let env = if self.options.dry_run {
                BTreeMap::new()
            } else {
                match self.secrets.resolve_all(&server.secrets) {
                    Ok(env) => env,
                    Err(e) => {
                        report.warn(format!("Skipping MCP server {}: {e}", server.name));
                        continue;
                    }
                }
            };
            let args = substitute_args(&server.args, &env);
            let invocation = self
                .cli
                .mcp_add(&server.name, Scope::Local, &env, &server.command, &args);
            let outcome = self.run(&invocation);
            report.record(DiffKind::McpServer, &server.name, Direction::Install, outcome);
        }

        Ok(report)
    }
}
