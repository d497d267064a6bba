//! Profile removal

use cprof_scanner::Scope;

use super::report::{ApplyReport, Direction};
use super::{Applier, ApplyResult};
use crate::diff::{plugin_in_marketplaces, DiffKind};
use crate::exec::Outcome;
use crate::profile::Profile;
use crate::scope::as_per_scope;

impl Applier<'_> {
    /// Remove what a profile installed
    ///
    /// Uninstalls every enabled plugin that comes from one of the profile's
    /// marketplaces, removes the profile's MCP servers, then the
    /// marketplaces themselves. Items already gone count as no-ops.
    pub fn reset(&self, profile: &Profile) -> ApplyResult<ApplyReport> {
        let has_project = self.paths.project_dir().is_some();
        let state = self.scan(has_project)?;
        let mut report = ApplyReport::new(self.options.dry_run);

        for scope in Scope::ALL {
            let Some(scope_state) = state.scope(scope) else {
                continue;
            };
            report.scopes.push(scope);
            for key in scope_state.enabled_plugins() {
                if plugin_in_marketplaces(&key, &profile.marketplaces) {
                    let outcome = self.run(&self.cli.plugin_uninstall(&key, scope));
                    report.record(DiffKind::Plugin, &key, Direction::Remove, outcome);
                }
            }
        }

        for (listed_under, settings) in as_per_scope(profile).iter() {
            for server in &settings.mcp_servers {
                let target = server.effective_scope(listed_under);
                if target.needs_project() && !has_project {
                    report.warn(format!(
                        "Skipping MCP server {}: {target} scope needs a project directory",
                        server.name
                    ));
                    continue;
                }
                let outcome = self.run(&self.cli.mcp_remove(&server.name, target));
                report.record(DiffKind::McpServer, &server.name, Direction::Remove, outcome);
            }
        }

        for marketplace in &profile.marketplaces {
            let key = marketplace.display_name();
            match state.marketplaces.find_by_location(key) {
                Some(registered) => {
                    let outcome = self.run(&self.cli.marketplace_remove(&registered.name));
                    report.record(DiffKind::Marketplace, key, Direction::Remove, outcome);
                }
                None => {
                    report.record(DiffKind::Marketplace, key, Direction::Remove, Outcome::AlreadyDone);
                }
            }
        }

        Ok(report)
    }
}
