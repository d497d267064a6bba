//! Post-apply hook execution

use std::path::Path;

use super::ApplyReport;
use crate::exec::{Executor, Invocation};
use crate::profile::{HookCondition, PostApplyHook};

#[cfg(unix)]
fn shell_invocation(command: &str) -> Invocation {
    Invocation::new("sh", ["-c", command])
}

#[cfg(not(unix))]
fn shell_invocation(command: &str) -> Invocation {
    Invocation::new("cmd", ["/C", command])
}

/// Run the profile's post-apply hook if its condition holds
///
/// Skipped when any item failed. A failing hook is only a warning.
pub(crate) fn run_post_apply(
    executor: &dyn Executor,
    hook: Option<&PostApplyHook>,
    first_run: bool,
    cwd: Option<&Path>,
    report: &mut ApplyReport,
) {
    let Some(hook) = hook else {
        return;
    };
    if report.dry_run {
        return;
    }
    if hook.condition == HookCondition::FirstRun && !first_run {
        tracing::debug!("Skipping first-run hook: profile was applied before");
        return;
    }
    if !report.is_success() {
        report.warn("Post-apply hook skipped because some items failed");
        return;
    }

    tracing::info!("Running post-apply hook: {}", hook.command);
    let invocation = shell_invocation(&hook.command).in_dir(cwd);
    if let Err(e) = executor.run(&invocation) {
        report.warn(format!("Post-apply hook failed: {e}"));
    }
}
