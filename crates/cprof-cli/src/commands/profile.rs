//! Profile store commands
//!
//! Handles: cprof list/show/snapshot/clone

use anyhow::bail;
use clap::Subcommand;
use cprof_core::profile::{snapshot_live, HookCondition};
use cprof_core::scope::as_per_scope;
use cprof_core::Profile;

use super::Context;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List saved profiles
    List,
    /// Show profile details
    Show {
        /// Profile name, or path to a profile JSON file
        profile: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save live configuration as a profile
    Snapshot {
        /// Profile name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// Replace an existing profile, keeping its secret sources and hooks
        #[arg(short, long)]
        force: bool,
    },
    /// Copy a saved profile under a new name
    Clone {
        /// Existing profile name
        from: String,
        /// New profile name
        to: String,
    },
}

/// Execute a profile store command
pub fn execute(ctx: &Context, action: ProfileCommands) -> anyhow::Result<()> {
    match action {
        ProfileCommands::List => {
            let names = ctx.store.list()?;
            if names.is_empty() {
                println!("No profiles found.");
            } else {
                println!("Profiles:");
                for name in names {
                    println!("  {name}");
                }
            }
        }
        ProfileCommands::Show { profile, json } => {
            let (profile, _) = ctx.resolve_profile(&profile)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                print_profile(&profile);
            }
        }
        ProfileCommands::Snapshot {
            name,
            description,
            force,
        } => {
            let existing = ctx.store.exists(&name);
            if existing && !force {
                bail!("Profile '{name}' already exists (use --force to replace it)");
            }

            let mut profile = snapshot_live(&ctx.paths, &name)?;
            if existing {
                profile.preserve_from(&ctx.store.load(&name)?);
            }
            if let Some(desc) = description {
                profile.description = desc;
            }
            let path = ctx.store.save(&profile)?;
            println!("Saved profile '{name}' to {}", path.display());
        }
        ProfileCommands::Clone { from, to } => {
            ctx.store.clone_profile(&from, &to)?;
            println!("Cloned profile '{from}' to '{to}'");
        }
    }

    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Profile: {}", profile.name);
    if !profile.description.is_empty() {
        println!("Description: {}", profile.description);
    }

    if !profile.marketplaces.is_empty() {
        println!("\nMarketplaces:");
        for marketplace in &profile.marketplaces {
            println!("  {} ({})", marketplace.display_name(), marketplace.source);
        }
    }

    for (scope, settings) in as_per_scope(profile).iter() {
        println!("\n[{scope}]");
        for plugin in &settings.plugins {
            println!("  plugin: {plugin}");
        }
        for server in &settings.mcp_servers {
            let secrets: Vec<&str> = server.secrets.keys().map(String::as_str).collect();
            if secrets.is_empty() {
                println!("  mcp-server: {} ({})", server.name, server.command);
            } else {
                println!(
                    "  mcp-server: {} ({}) secrets: {}",
                    server.name,
                    server.command,
                    secrets.join(", ")
                );
            }
        }
        if let Some(items) = &settings.local_items {
            for (category, patterns) in items.categories() {
                for pattern in patterns {
                    println!("  {category}: {pattern}");
                }
            }
        }
    }

    if let Some(hook) = &profile.post_apply {
        let when = match hook.condition {
            HookCondition::Always => "always",
            HookCondition::FirstRun => "first run",
        };
        println!("\nPost-apply ({when}): {}", hook.command);
    }
    if !profile.settings_hooks.is_empty() {
        let events: Vec<&str> = profile.settings_hooks.keys().map(String::as_str).collect();
        println!("Settings hooks: {}", events.join(", "));
    }
}
