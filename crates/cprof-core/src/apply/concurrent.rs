//! Parallel additive apply for project and local scopes
//!
//! Install commands run on a bounded rayon pool, one phase at a time:
//! marketplaces, then plugins, then MCP servers. Each phase finishes before
//! the next starts since plugins need their marketplace. Settings, records
//! and extension items are written serially once all installs are done.

use cprof_scanner::Scope;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::engine::{InstallTask, StepFlags};
use super::hooks::run_post_apply;
use super::report::{ApplyReport, Direction};
use super::{Applier, ApplyError, ApplyResult};
use crate::diff::DiffKind;
use crate::exec::Outcome;
use crate::profile::Profile;

/// Worker count when none is configured
pub const DEFAULT_WORKERS: usize = 4;

/// Install phases, in execution order
const PHASES: [DiffKind; 3] = [DiffKind::Marketplace, DiffKind::Plugin, DiffKind::McpServer];

/// Progress notifications, delivered from worker threads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A phase is starting with this many commands
    Phase { kind: DiffKind, total: usize },
    Started { kind: DiffKind, name: String },
    Finished {
        kind: DiffKind,
        name: String,
        outcome: Outcome,
    },
}

/// Additive apply with a bounded worker pool
pub struct ConcurrentApplier<'a> {
    applier: Applier<'a>,
    workers: usize,
    reinstall: bool,
}

impl<'a> ConcurrentApplier<'a> {
    #[must_use]
    pub fn new(applier: Applier<'a>) -> Self {
        Self {
            applier,
            workers: DEFAULT_WORKERS,
            reinstall: false,
        }
    }

    /// Maximum number of commands in flight at once
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Re-add marketplaces that are already registered
    #[must_use]
    pub fn with_reinstall(mut self, reinstall: bool) -> Self {
        self.reinstall = reinstall;
        self
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply a profile's project or local settings
    ///
    /// Secrets are resolved before the pool starts; a missing secret fails
    /// the call with nothing executed. Results are sorted by name.
    pub fn apply(
        &self,
        profile: &Profile,
        scope: Scope,
        progress: &(dyn Fn(ProgressEvent) + Sync),
    ) -> ApplyResult<ApplyReport> {
        if scope == Scope::User {
            return Err(ApplyError::InvalidScope(
                "user (parallel apply supports project and local only)".to_string(),
            ));
        }
        let applier = &self.applier;
        applier.paths.require_project(scope)?;

        let state = applier.scan(true)?;
        let flags = StepFlags {
            marketplaces: true,
            hooks: true,
            reinstall: self.reinstall,
        };
        let plan = applier.plan_shared(profile, &state, scope, flags)?;
        let first_run = applier.is_first_run(scope);

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| ApplyError::WorkerPool(e.to_string()))?;

        let mut report = ApplyReport::new(applier.options.dry_run);
        report.scopes.push(scope);
        applier.execute_removals(&plan, &mut report);

        let tasks = applier.install_tasks(&plan);
        for kind in PHASES {
            let phase: Vec<&InstallTask> = tasks.iter().filter(|t| t.kind == kind).collect();
            if phase.is_empty() {
                continue;
            }
            tracing::debug!("Running {} {kind} installs on {} workers", phase.len(), self.workers);
            progress(ProgressEvent::Phase {
                kind,
                total: phase.len(),
            });

            let outcomes: Vec<(&InstallTask, Outcome)> = pool.install(|| {
                phase
                    .par_iter()
                    .map(|task| {
                        progress(ProgressEvent::Started {
                            kind,
                            name: task.name.clone(),
                        });
                        let outcome = applier.run(&task.invocation);
                        progress(ProgressEvent::Finished {
                            kind,
                            name: task.name.clone(),
                            outcome: outcome.clone(),
                        });
                        (*task, outcome)
                    })
                    .collect()
            });

            for (task, outcome) in outcomes {
                report.record(task.kind, &task.name, Direction::Install, outcome);
            }
        }

        applier.finish(&plan, profile, &mut report);
        run_post_apply(
            applier.executor,
            profile.post_apply.as_ref(),
            first_run,
            applier.paths.project_dir(),
            &mut report,
        );
        report.sort();
        Ok(report)
    }
}
