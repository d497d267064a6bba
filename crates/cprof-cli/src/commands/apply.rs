//! Apply, diff, reset and sync commands
//!
//! Handles: cprof apply/diff/reset/sync

use anyhow::bail;
use clap::Args;
use cprof_core::apply::{CategoryOutcome, ProgressEvent, DEFAULT_WORKERS};
use cprof_core::diff::display::format_diff_terminal;
use cprof_core::exec::{Outcome, ProcessExecutor};
use cprof_core::{
    Applier, ApplyOptions, ApplyReport, ConcurrentApplier, Profile, Scope, UserMode,
};
use indicatif::{ProgressBar, ProgressStyle};

use super::Context;

/// Output flags shared by commands that produce an apply report
#[derive(Args)]
pub struct ReportArgs {
    /// Show what would run without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cprof apply`
#[derive(Args)]
pub struct ApplyArgs {
    /// Profile name, or path to a profile JSON file
    pub profile: String,

    /// Scope to apply (user, project, local); every configured scope if omitted
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Keep existing user plugins enabled instead of replacing them
    #[arg(long)]
    pub additive: bool,

    /// Install project or local items on a worker pool with progress
    #[arg(long)]
    pub parallel: bool,

    /// Worker count for --parallel
    #[arg(long, default_value_t = DEFAULT_WORKERS, requires = "parallel")]
    pub workers: usize,

    /// Re-add marketplaces that are already registered
    #[arg(long, requires = "parallel")]
    pub reinstall: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Execute `cprof apply`
pub fn execute_apply(ctx: &Context, args: &ApplyArgs) -> anyhow::Result<()> {
    let (profile, source) = ctx.resolve_profile(&args.profile)?;
    let executor = ProcessExecutor;
    let options = ApplyOptions {
        dry_run: args.report.dry_run,
        user_mode: if args.additive {
            UserMode::Additive
        } else {
            UserMode::Declarative
        },
        source,
    };
    let applier = Applier::new(ctx.paths.clone(), &executor).with_options(options);

    let report = if args.parallel {
        let scope = args.scope.unwrap_or(Scope::Project);
        apply_parallel(applier, &profile, scope, args)?
    } else {
        match args.scope {
            None => applier.apply_all(&profile)?,
            Some(Scope::User) => applier.apply_user(&profile)?,
            Some(scope) => applier.apply_scope(&profile, scope)?,
        }
    };

    finish_report(&report, &format!("Applied profile '{}'", profile.name), args.report.json)
}

fn apply_parallel(
    applier: Applier<'_>,
    profile: &Profile,
    scope: Scope,
    args: &ApplyArgs,
) -> anyhow::Result<ApplyReport> {
    let bar = if args.report.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("━╸━"),
        );
        bar
    };

    let concurrent = ConcurrentApplier::new(applier)
        .with_workers(args.workers)
        .with_reinstall(args.reinstall);
    let report = concurrent.apply(profile, scope, &|event| show_progress(&bar, event));
    bar.finish_and_clear();
    Ok(report?)
}

fn show_progress(bar: &ProgressBar, event: ProgressEvent) {
    match event {
        ProgressEvent::Phase { kind, total } => {
            bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
            bar.set_position(0);
            bar.set_prefix(format!("{kind}s"));
        }
        ProgressEvent::Started { name, .. } => bar.set_message(name),
        ProgressEvent::Finished { name, outcome, .. } => {
            if let Outcome::Failed(message) = outcome {
                bar.println(format!("  failed {name}: {message}"));
            }
            bar.inc(1);
        }
    }
}

/// Execute `cprof diff`
pub fn execute_diff(ctx: &Context, reference: &str, json: bool) -> anyhow::Result<()> {
    let (profile, _) = ctx.resolve_profile(reference)?;
    let executor = ProcessExecutor;
    let diff = Applier::new(ctx.paths.clone(), &executor).compare_with_current(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        print!("{}", format_diff_terminal(&diff));
    }
    Ok(())
}

/// Execute `cprof reset`
pub fn execute_reset(ctx: &Context, reference: &str, args: &ReportArgs) -> anyhow::Result<()> {
    let (profile, _) = ctx.resolve_profile(reference)?;
    let executor = ProcessExecutor;
    let options = ApplyOptions {
        dry_run: args.dry_run,
        ..ApplyOptions::default()
    };
    let report = Applier::new(ctx.paths.clone(), &executor)
        .with_options(options)
        .reset(&profile)?;

    finish_report(&report, &format!("Reset profile '{}'", profile.name), args.json)
}

/// Execute `cprof sync`
pub fn execute_sync(ctx: &Context, args: &ReportArgs) -> anyhow::Result<()> {
    let executor = ProcessExecutor;
    let options = ApplyOptions {
        dry_run: args.dry_run,
        ..ApplyOptions::default()
    };
    let report = Applier::new(ctx.paths.clone(), &executor)
        .with_options(options)
        .sync_project()?;

    finish_report(&report, "Synced project", args.json)
}

fn finish_report(report: &ApplyReport, headline: &str, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report, headline);
    }

    if !report.is_success() {
        bail!("{} item(s) failed", report.errors.len());
    }
    Ok(())
}

fn print_report(report: &ApplyReport, headline: &str) {
    if report.dry_run {
        println!("Dry run - no changes made.");
    } else {
        let scopes: Vec<String> = report.scopes.iter().map(ToString::to_string).collect();
        if scopes.is_empty() {
            println!("{headline}");
        } else {
            println!("{headline} ({})", scopes.join(", "));
        }
    }

    print_category("Marketplaces", &report.marketplaces);
    print_category("Plugins", &report.plugins);
    print_category("MCP servers", &report.mcp_servers);
    print_category("Extensions", &report.extensions);
    if report.hooks_merged > 0 {
        println!("Hook groups merged: {}", report.hooks_merged);
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  {warning}");
        }
    }
    if !report.errors.is_empty() {
        println!("\nErrors:");
        for err in &report.errors {
            println!("  {} {}: {}", err.kind, err.name, err.message);
        }
    }
}

fn print_category(label: &str, outcome: &CategoryOutcome) {
    if outcome.is_empty() {
        return;
    }
    println!("{label}:");
    for (marker, names) in [
        ('+', &outcome.installed),
        ('=', &outcome.already_installed),
        ('-', &outcome.removed),
        ('=', &outcome.already_removed),
    ] {
        for name in names {
            println!("  {marker} {name}");
        }
    }
}
