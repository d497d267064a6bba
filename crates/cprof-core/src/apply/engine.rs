//! Sequential apply engine
//!
//! Every apply is planned in full before anything runs: live state is
//! scanned, the settings files are parsed and all secrets are resolved.
//! Only then are commands issued, in a fixed order per scope:
//! removals, marketplaces, plugins, MCP servers, and finally the settings
//! write, record and extension items.

use cprof_scanner::{ClaudePaths, LiveState, Scanner, Scope};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::hooks::run_post_apply;
use super::report::{ApplyReport, Direction};
use super::ApplyResult;
use crate::config::{
    write_project_mcp, AppliedRecord, LocalRegistry, PluginWrite, ProfileSource, SettingsDocument,
    SettingsError, SettingsResult,
};
use crate::diff::{compare, compare_with_live, DiffKind, DiffOp, ProfileDiff};
use crate::exec::{classify_outcome, ClaudeCli, Executor, Invocation, Outcome};
use crate::extensions::enable_items;
use crate::profile::{snapshot_from_state, ExtensionPatterns, McpServer, Profile};
use crate::scope::{configured_scopes, extract_scope, only_scopes, FlatProfile};
use crate::secrets::{substitute_args, SecretChain};

/// How the user scope is reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserMode {
    /// Remove what the profile does not list, then replace `enabledPlugins`
    #[default]
    Declarative,
    /// Only add; existing plugins stay enabled
    Additive,
}

/// Caller-selected apply behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Plan and report without running commands or writing files
    pub dry_run: bool,
    pub user_mode: UserMode,
    /// Recorded in the applied-profile record
    pub source: ProfileSource,
}

/// An MCP server with secrets resolved, ready for `mcp add`
#[derive(Debug, Clone)]
pub(crate) struct PreparedServer {
    pub server: McpServer,
    pub env: BTreeMap<String, String>,
    pub args: Vec<String>,
}

/// What happens to `enabledPlugins`
#[derive(Debug, Clone)]
pub(crate) enum PluginPlan {
    Replace {
        enable: Vec<String>,
        disable: Vec<String>,
    },
    Merge {
        enable: Vec<String>,
    },
    Skip,
}

/// Which optional parts a scope step handles
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepFlags {
    pub marketplaces: bool,
    pub hooks: bool,
    /// Re-add marketplaces the registry already knows
    pub reinstall: bool,
}

/// Everything one scope step will do
#[derive(Debug, Clone)]
pub(crate) struct ScopePlan {
    pub scope: Scope,
    pub mcp_remove: Vec<String>,
    /// Display key plus registered name, when the registry knows it
    pub marketplace_remove: Vec<(String, Option<String>)>,
    pub marketplace_add: Vec<String>,
    pub marketplace_present: Vec<String>,
    pub plugin_install: Vec<String>,
    pub plugins: PluginPlan,
    pub mcp_add: Vec<PreparedServer>,
    pub mcp_present: Vec<String>,
    /// Servers written to `.mcp.json` instead of installed
    pub project_mcp: Vec<McpServer>,
    pub items: ExtensionPatterns,
    pub merge_hooks: bool,
}

impl ScopePlan {
    fn new(scope: Scope, desired: &FlatProfile, flags: StepFlags) -> Self {
        Self {
            scope,
            mcp_remove: Vec::new(),
            marketplace_remove: Vec::new(),
            marketplace_add: Vec::new(),
            marketplace_present: Vec::new(),
            plugin_install: Vec::new(),
            plugins: PluginPlan::Skip,
            mcp_add: Vec::new(),
            mcp_present: Vec::new(),
            project_mcp: Vec::new(),
            items: desired.local_items.clone(),
            merge_hooks: flags.hooks,
        }
    }
}

/// One external install command
#[derive(Debug, Clone)]
pub(crate) struct InstallTask {
    pub kind: DiffKind,
    pub name: String,
    pub invocation: Invocation,
}

/// Applies profiles through the claude CLI
pub struct Applier<'a> {
    pub(crate) paths: ClaudePaths,
    pub(crate) executor: &'a dyn Executor,
    pub(crate) cli: ClaudeCli,
    pub(crate) secrets: SecretChain<'a>,
    pub(crate) options: ApplyOptions,
}

impl<'a> Applier<'a> {
    pub fn new(paths: ClaudePaths, executor: &'a dyn Executor) -> Self {
        let cli = ClaudeCli::new(paths.project_dir().map(Path::to_path_buf));
        Self {
            paths,
            executor,
            cli,
            secrets: SecretChain::new(executor),
            options: ApplyOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_secrets(mut self, secrets: SecretChain<'a>) -> Self {
        self.secrets = secrets;
        self
    }

    #[must_use]
    pub fn with_cli(mut self, cli: ClaudeCli) -> Self {
        self.cli = cli;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &ClaudePaths {
        &self.paths
    }

    #[must_use]
    pub fn options(&self) -> ApplyOptions {
        self.options
    }

    /// Diff a profile against live state in the scopes it configures
    pub fn compare_with_current(&self, profile: &Profile) -> ApplyResult<ProfileDiff> {
        let scopes = configured_scopes(profile);
        let state = self.scan(scopes.iter().any(|s| s.needs_project()))?;
        Ok(compare_with_live(profile, &state))
    }

    /// Reconcile the user scope
    pub fn apply_user(&self, profile: &Profile) -> ApplyResult<ApplyReport> {
        self.apply_steps(profile, &[Scope::User])
    }

    /// Apply a single scope
    pub fn apply_scope(&self, profile: &Profile, scope: Scope) -> ApplyResult<ApplyReport> {
        self.apply_steps(profile, &[scope])
    }

    /// Apply every scope the profile configures, user then project then local
    pub fn apply_all(&self, profile: &Profile) -> ApplyResult<ApplyReport> {
        self.apply_steps(profile, &configured_scopes(profile))
    }

    fn apply_steps(&self, profile: &Profile, scopes: &[Scope]) -> ApplyResult<ApplyReport> {
        for scope in scopes {
            if scope.needs_project() {
                self.paths.require_project(*scope)?;
            }
        }

        let needs_project = scopes.iter().any(|s| s.needs_project());
        let state = self.scan(needs_project)?;
        let hook_scope = hook_scope(scopes);

        let plans = scopes
            .iter()
            .enumerate()
            .map(|(index, scope)| {
                let flags = StepFlags {
                    marketplaces: index == 0,
                    hooks: Some(*scope) == hook_scope,
                    reinstall: false,
                };
                self.plan_step(profile, &state, *scope, flags)
            })
            .collect::<ApplyResult<Vec<_>>>()?;

        let first_run = scopes.iter().all(|s| self.is_first_run(*s));
        let mut report = ApplyReport::new(self.options.dry_run);

        for plan in &plans {
            tracing::info!("Applying profile {} to {} scope", profile.name, plan.scope);
            report.scopes.push(plan.scope);
            self.execute_removals(plan, &mut report);
            for task in self.install_tasks(plan) {
                let outcome = self.run(&task.invocation);
                report.record(task.kind, &task.name, Direction::Install, outcome);
            }
            self.finish(plan, profile, &mut report);
        }

        let cwd = if needs_project {
            self.paths.project_dir()
        } else {
            None
        };
        run_post_apply(
            self.executor,
            profile.post_apply.as_ref(),
            first_run,
            cwd,
            &mut report,
        );
        Ok(report)
    }

    pub(crate) fn scan(&self, include_project: bool) -> ApplyResult<LiveState> {
        let paths = if include_project {
            self.paths.clone()
        } else {
            self.paths.for_project(None)
        };
        Ok(Scanner::new(paths).scan()?)
    }

    /// Run a command, or pretend to in dry-run mode
    pub(crate) fn run(&self, invocation: &Invocation) -> Outcome {
        if self.options.dry_run {
            tracing::info!("Would run {invocation}");
            return Outcome::Success;
        }
        classify_outcome(&self.executor.run_with_output(invocation))
    }

    pub(crate) fn is_first_run(&self, scope: Scope) -> bool {
        match scope {
            Scope::User => !self.paths.user_record_path().exists(),
            Scope::Project => self
                .paths
                .project_record_path()
                .map_or(true, |path| !path.exists()),
            Scope::Local => match (
                self.paths.project_dir(),
                LocalRegistry::load(&self.paths.local_registry_path()),
            ) {
                (Some(dir), Ok(registry)) => registry.get(dir).is_none(),
                _ => true,
            },
        }
    }

    fn plan_step(
        &self,
        profile: &Profile,
        state: &LiveState,
        scope: Scope,
        flags: StepFlags,
    ) -> ApplyResult<ScopePlan> {
        // Surface a malformed settings file before anything is mutated
        SettingsDocument::for_scope(&self.paths, scope)?;

        match scope {
            Scope::User => self.plan_user(profile, state, self.options.user_mode, flags),
            Scope::Project | Scope::Local => self.plan_shared(profile, state, scope, flags),
        }
    }

    fn plan_user(
        &self,
        profile: &Profile,
        state: &LiveState,
        mode: UserMode,
        flags: StepFlags,
    ) -> ApplyResult<ScopePlan> {
        let desired = extract_scope(profile, Scope::User);
        let mut plan = ScopePlan::new(Scope::User, &desired, flags);

        if mode == UserMode::Additive {
            self.plan_additive(&mut plan, &desired, state, flags)?;
            if !profile.skip_plugin_diff {
                plan.plugin_install.clone_from(&desired.plugins);
                plan.plugins = PluginPlan::Merge {
                    enable: desired.plugins,
                };
            }
            return Ok(plan);
        }

        let live = snapshot_from_state(state, &profile.name);
        let diff = compare(
            &only_scopes(profile, &[Scope::User]),
            &only_scopes(&live, &[Scope::User]),
        );
        let items = diff
            .scope(Scope::User)
            .map(|s| s.items.as_slice())
            .unwrap_or_default();

        let mut disable = Vec::new();
        let mut readd = BTreeSet::new();
        let mut missing_marketplaces = BTreeSet::new();
        for item in items {
            let name = item.name.clone();
            match (item.kind, item.op) {
                (DiffKind::Plugin, DiffOp::Added) => disable.push(name),
                (DiffKind::McpServer, DiffOp::Added) => plan.mcp_remove.push(name),
                (DiffKind::McpServer, DiffOp::Modified) => {
                    plan.mcp_remove.push(name.clone());
                    readd.insert(name);
                }
                (DiffKind::McpServer, DiffOp::Removed) => {
                    readd.insert(name);
                }
                (DiffKind::Marketplace, DiffOp::Added) if flags.marketplaces => {
                    let registered = state
                        .marketplaces
                        .find_by_location(&name)
                        .map(|m| m.name.clone());
                    plan.marketplace_remove.push((name, registered));
                }
                (DiffKind::Marketplace, DiffOp::Removed) if flags.marketplaces => {
                    missing_marketplaces.insert(name);
                }
                _ => {}
            }
        }

        if flags.marketplaces {
            for marketplace in &desired.marketplaces {
                let key = marketplace.display_name().to_string();
                if missing_marketplaces.contains(&key) {
                    plan.marketplace_add.push(key);
                } else {
                    plan.marketplace_present.push(key);
                }
            }
        }

        let (to_add, present): (Vec<McpServer>, Vec<McpServer>) = desired
            .mcp_servers
            .iter()
            .cloned()
            .partition(|s| readd.contains(&s.name));
        plan.mcp_present = present.into_iter().map(|s| s.name).collect();
        plan.mcp_add = self.prepare_servers(&to_add)?;

        if !profile.skip_plugin_diff {
            plan.plugin_install.clone_from(&desired.plugins);
            plan.plugins = PluginPlan::Replace {
                enable: desired.plugins,
                disable,
            };
        }
        Ok(plan)
    }

    pub(crate) fn plan_shared(
        &self,
        profile: &Profile,
        state: &LiveState,
        scope: Scope,
        flags: StepFlags,
    ) -> ApplyResult<ScopePlan> {
        let desired = extract_scope(profile, scope);
        let mut plan = ScopePlan::new(scope, &desired, flags);

        if scope == Scope::Project {
            if flags.marketplaces {
                self.plan_marketplaces(&mut plan, &desired, state, flags.reinstall);
            }
            plan.project_mcp.clone_from(&desired.mcp_servers);
        } else {
            self.plan_additive(&mut plan, &desired, state, flags)?;
        }

        if !profile.skip_plugin_diff {
            plan.plugin_install.clone_from(&desired.plugins);
            plan.plugins = PluginPlan::Replace {
                enable: desired.plugins,
                disable: Vec::new(),
            };
        }
        Ok(plan)
    }

    /// Add missing marketplaces and MCP servers, never remove
    fn plan_additive(
        &self,
        plan: &mut ScopePlan,
        desired: &FlatProfile,
        state: &LiveState,
        flags: StepFlags,
    ) -> ApplyResult<()> {
        if flags.marketplaces {
            self.plan_marketplaces(plan, desired, state, flags.reinstall);
        }

        let live: BTreeSet<&str> = state
            .scope(plan.scope)
            .map(|s| s.mcp_servers.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default();
        let (present, to_add): (Vec<McpServer>, Vec<McpServer>) = desired
            .mcp_servers
            .iter()
            .cloned()
            .partition(|s| live.contains(s.name.as_str()));
        plan.mcp_present = present.into_iter().map(|s| s.name).collect();
        plan.mcp_add = self.prepare_servers(&to_add)?;
        Ok(())
    }

    fn plan_marketplaces(
        &self,
        plan: &mut ScopePlan,
        desired: &FlatProfile,
        state: &LiveState,
        reinstall: bool,
    ) {
        for marketplace in &desired.marketplaces {
            let key = marketplace.display_name().to_string();
            if !reinstall && state.marketplaces.contains_location(&key) {
                plan.marketplace_present.push(key);
            } else {
                plan.marketplace_add.push(key);
            }
        }
    }

    /// Resolve secrets for servers about to be added
    ///
    /// Any unresolved secret fails the whole apply before it starts.
    fn prepare_servers(&self, servers: &[McpServer]) -> ApplyResult<Vec<PreparedServer>> {
        servers
            .iter()
            .map(|server| {
                let env = if self.options.dry_run {
                    BTreeMap::new()
                } else {
                    self.secrets.resolve_all(&server.secrets)?
                };
                let args = substitute_args(&server.args, &env);
                Ok(PreparedServer {
                    server: server.clone(),
                    env,
                    args,
                })
            })
            .collect()
    }

    pub(crate) fn execute_removals(&self, plan: &ScopePlan, report: &mut ApplyReport) {
        // Disabled in the settings write rather than uninstalled: the same
        // plugin may be installed at another scope.
        if let PluginPlan::Replace { disable, .. } = &plan.plugins {
            for key in disable {
                report.record(DiffKind::Plugin, key, Direction::Remove, Outcome::Success);
            }
        }

        for name in &plan.mcp_remove {
            let outcome = self.run(&self.cli.mcp_remove(name, plan.scope));
            report.record(DiffKind::McpServer, name, Direction::Remove, outcome);
        }

        for (key, registered) in &plan.marketplace_remove {
            match registered {
                Some(name) => {
                    let outcome = self.run(&self.cli.marketplace_remove(name));
                    report.record(DiffKind::Marketplace, key, Direction::Remove, outcome);
                }
                None => report.warn(format!(
                    "Marketplace {key} is not in the local registry, skipping removal"
                )),
            }
        }

        for key in &plan.marketplace_present {
            report.record(DiffKind::Marketplace, key, Direction::Install, Outcome::AlreadyDone);
        }
        for name in &plan.mcp_present {
            report.record(DiffKind::McpServer, name, Direction::Install, Outcome::AlreadyDone);
        }
    }

    /// Install commands in phase order: marketplaces, plugins, MCP servers
    pub(crate) fn install_tasks(&self, plan: &ScopePlan) -> Vec<InstallTask> {
        let marketplaces = plan.marketplace_add.iter().map(|key| InstallTask {
            kind: DiffKind::Marketplace,
            name: key.clone(),
            invocation: self.cli.marketplace_add(key),
        });
        let plugins = plan.plugin_install.iter().map(|key| InstallTask {
            kind: DiffKind::Plugin,
            name: key.clone(),
            invocation: self.cli.plugin_install(key, plan.scope),
        });
        let servers = plan.mcp_add.iter().map(|prepared| InstallTask {
            kind: DiffKind::McpServer,
            name: prepared.server.name.clone(),
            invocation: self.cli.mcp_add(
                &prepared.server.name,
                plan.scope,
                &prepared.env,
                &prepared.server.command,
                &prepared.args,
            ),
        });
        marketplaces.chain(plugins).chain(servers).collect()
    }

    /// Serial steps after every install has completed
    pub(crate) fn finish(&self, plan: &ScopePlan, profile: &Profile, report: &mut ApplyReport) {
        if !plan.project_mcp.is_empty() {
            self.write_project_servers(plan, report);
        }
        if self.options.dry_run {
            return;
        }
        self.write_settings(plan, profile, report);
        self.write_record(plan.scope, profile, report);
        self.enable_extensions(plan, report);
    }

    fn write_project_servers(&self, plan: &ScopePlan, report: &mut ApplyReport) {
        let result = if self.options.dry_run {
            Ok(plan.project_mcp.len())
        } else {
            self.paths
                .project_mcp_path()
                .map_err(SettingsError::from)
                .and_then(|path| write_project_mcp(&path, &plan.project_mcp))
        };

        for server in &plan.project_mcp {
            let outcome = match &result {
                Ok(_) => Outcome::Success,
                Err(e) => Outcome::Failed(e.to_string()),
            };
            report.record(DiffKind::McpServer, &server.name, Direction::Install, outcome);
        }
    }

    fn write_settings(&self, plan: &ScopePlan, profile: &Profile, report: &mut ApplyReport) {
        let hooks = plan.merge_hooks && !profile.settings_hooks.is_empty();
        if matches!(plan.plugins, PluginPlan::Skip) && !hooks {
            return;
        }

        match self.save_settings(plan, profile, hooks) {
            Ok(merged) => report.hooks_merged += merged,
            Err(e) => {
                let name = self
                    .paths
                    .settings_path(plan.scope)
                    .map_or_else(|_| plan.scope.to_string(), |p| p.display().to_string());
                report.error(DiffKind::Settings, &name, e.to_string());
            }
        }
    }

    /// Reload right before writing so changes made by the CLI survive
    fn save_settings(&self, plan: &ScopePlan, profile: &Profile, hooks: bool) -> SettingsResult<usize> {
        let mut settings = SettingsDocument::for_scope(&self.paths, plan.scope)?;
        match &plan.plugins {
            PluginPlan::Replace { enable, disable } => {
                settings.write_plugins(PluginWrite::Replace { enable, disable });
            }
            PluginPlan::Merge { enable } => settings.write_plugins(PluginWrite::Merge { enable }),
            PluginPlan::Skip => {}
        }
        let merged = if hooks {
            settings.merge_hooks(&profile.settings_hooks)?
        } else {
            0
        };
        settings.save()?;
        Ok(merged)
    }

    fn write_record(&self, scope: Scope, profile: &Profile, report: &mut ApplyReport) {
        let record = AppliedRecord::new(profile, self.options.source, scope);
        let result = match scope {
            Scope::User => record.save(&self.paths.user_record_path()),
            Scope::Project => self
                .paths
                .project_record_path()
                .map_err(SettingsError::from)
                .and_then(|path| record.save(&path)),
            Scope::Local => self.record_local(record),
        };
        if let Err(e) = result {
            report.warn(format!("Failed to write applied-profile record: {e}"));
        }
    }

    fn record_local(&self, record: AppliedRecord) -> SettingsResult<()> {
        let project_dir = self.paths.require_project(Scope::Local)?;
        let path = self.paths.local_registry_path();
        let mut registry = LocalRegistry::load(&path)?;
        registry.record(project_dir, record);
        registry.save(&path)
    }

    fn enable_extensions(&self, plan: &ScopePlan, report: &mut ApplyReport) {
        if plan.items.is_empty() {
            return;
        }
        if plan.scope == Scope::Local {
            report.warn("Extension items are not supported at local scope; apply them at project scope");
            return;
        }

        let enabled = self
            .paths
            .scope_claude_dir(plan.scope)
            .map_err(SettingsError::from)
            .and_then(|target| enable_items(&self.paths.library_dir(), &target, &plan.items));

        match enabled {
            Ok(result) => {
                for name in &result.enabled {
                    report.record(DiffKind::Extension, name, Direction::Install, Outcome::Success);
                }
                for name in &result.already_enabled {
                    report.record(DiffKind::Extension, name, Direction::Install, Outcome::AlreadyDone);
                }
                for warning in result.warnings {
                    report.warn(warning);
                }
            }
            Err(e) => report.error(DiffKind::Extension, &plan.scope.to_string(), e.to_string()),
        }
    }
}

/// Settings hooks go to the project when it is applied, else the first scope
fn hook_scope(scopes: &[Scope]) -> Option<Scope> {
    if scopes.contains(&Scope::Project) {
        Some(Scope::Project)
    } else {
        scopes.first().copied()
    }
}
