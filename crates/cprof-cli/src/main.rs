//! cprof CLI - Command-line interface for cprof
//!
//! Provides `cprof apply`, `cprof diff`, `cprof reset`, `cprof sync` and
//! the profile commands.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::apply::{ApplyArgs, ReportArgs};
use commands::profile::ProfileCommands;
use commands::Context;

#[derive(Parser)]
#[command(name = "cprof")]
#[command(about = "cprof - Claude Code profile manager")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a profile to one scope or every scope it configures
    Apply(ApplyArgs),
    /// Show how live configuration differs from a profile
    Diff {
        /// Profile name, or path to a profile JSON file
        profile: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a profile's plugins, MCP servers and marketplaces
    Reset {
        /// Profile name, or path to a profile JSON file
        profile: String,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Install what the project's applied-profile record lists
    Sync {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Manage saved profiles
    #[command(flatten)]
    Profile(ProfileCommands),
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let project = cli.project.or_else(|| std::env::current_dir().ok());
    let ctx = Context::discover(project)?;

    match cli.command {
        Commands::Apply(args) => commands::apply::execute_apply(&ctx, &args),
        Commands::Diff { profile, json } => commands::apply::execute_diff(&ctx, &profile, json),
        Commands::Reset { profile, report } => {
            commands::apply::execute_reset(&ctx, &profile, &report)
        }
        Commands::Sync { report } => commands::apply::execute_sync(&ctx, &report),
        Commands::Profile(action) => commands::profile::execute(&ctx, action),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
