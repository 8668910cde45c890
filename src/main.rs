// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Bartek Kus
// Feature: FEATUREADMIN_CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Target;
use featureadmin::activation::{
    Action, AdminError, FeatureLocationSet, Location, OperationOutcome, ScopeLevel,
};
use featureadmin::admin_tools::{AdminTools, FeatureListing, ScanReport};
use featureadmin::config::AdminConfig;
use featureadmin::farm::{FarmStore, MemoryFarm};
use featureadmin::log_sink::LogSink;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output results in JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (falls back to $FEATUREADMIN_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Farm snapshot file, overriding the config
    #[arg(long, global = true)]
    farm: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the farm and summarize what was found
    Scan,
    /// List installed features with activation counts
    Features {
        /// Only features whose definition is missing
        #[arg(long)]
        faulty: bool,
    },
    /// Show where features are active
    Locate {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Activate features at a scope under a node
    Activate(MutateArgs),
    /// Deactivate features at a scope under a node
    Deactivate(MutateArgs),
    /// Forcibly delete activation records
    Remove {
        /// Site collection scoped feature to remove
        #[arg(long = "site")]
        site: Vec<Uuid>,
        /// Web scoped feature to remove
        #[arg(long = "web")]
        web: Vec<Uuid>,
        /// Url of the node to start from (default: whole farm)
        #[arg(long)]
        at: Option<String>,
    },
    /// Remove one feature from every node of its scope
    Purge {
        id: Uuid,
        /// Needed when the feature has no definition
        #[arg(long)]
        scope: Option<ScopeLevel>,
    },
    /// List the target scopes allowed for a selection
    Targets {
        #[arg(long)]
        at: Option<String>,
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
}

#[derive(clap::Args, Debug)]
struct MutateArgs {
    /// farm, webapp, site or web
    #[arg(long)]
    scope: ScopeLevel,
    /// Url of the node to start from (default: whole farm)
    #[arg(long)]
    at: Option<String>,
    /// Ignore missing definitions and scope checks in the farm
    #[arg(long)]
    force: bool,
    #[arg(required = true)]
    ids: Vec<Uuid>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let mut config = AdminConfig::load(cli.config.as_deref())?;
    if let Some(farm) = &cli.farm {
        config.farm_file = farm.clone();
    }

    let store = FarmStore::new(&config.farm_file);
    let farm = store.load()?;
    let tools = AdminTools::new(farm, &config);
    let mut sink = LogSink::new(config.timestamp_format.clone());

    let success = match &cli.command {
        Commands::Scan => {
            let report = tools.scan();
            emit(cli.json, &report, print_scan)?;
            report.errors.is_empty()
        }
        Commands::Features { faulty } => {
            let listing = tools.features(*faulty);
            emit(cli.json, &listing, print_features)?;
            true
        }
        Commands::Locate { ids } => {
            let set = tools.locate(ids);
            emit(cli.json, &set, print_locations)?;
            true
        }
        Commands::Activate(args) | Commands::Deactivate(args) => {
            let action = match &cli.command {
                Commands::Activate(_) => Action::Activate,
                _ => Action::Deactivate,
            };
            let at = resolve_at(&tools, args.at.as_deref())?;
            let result = tools.apply(
                action,
                args.scope,
                at.as_ref(),
                &args.ids,
                args.force,
                &mut sink,
            );
            finish(&cli, &store, &tools, result)?
        }
        Commands::Remove { site, web, at } => {
            let at = resolve_at(&tools, at.as_deref())?;
            let site: BTreeSet<Uuid> = site.iter().copied().collect();
            let web: BTreeSet<Uuid> = web.iter().copied().collect();
            let result = tools.remove(&site, &web, at.as_ref(), &mut sink);
            finish(&cli, &store, &tools, result)?
        }
        Commands::Purge { id, scope } => {
            let outcome = tools.remove_everywhere(*id, *scope, &mut sink)?;
            finish(&cli, &store, &tools, Ok(outcome))?
        }
        Commands::Targets { at, ids } => {
            let at = resolve_at(&tools, at.as_deref())?;
            let targets = tools.targets(ids, at.as_ref());
            emit(cli.json, &targets, |t| {
                if t.is_empty() {
                    println!("No target scope is allowed for this selection");
                }
                for scope in t {
                    println!("{}", scope);
                }
            })?;
            !targets.is_empty()
        }
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}

fn resolve_at(tools: &AdminTools<MemoryFarm>, url: Option<&str>) -> Result<Option<Location>> {
    url.map(|u| tools.find_location(u)).transpose()
}

/// Reports a mutation and saves the farm if anything changed.
fn finish(
    cli: &Cli,
    store: &FarmStore,
    tools: &AdminTools<MemoryFarm>,
    result: Result<OperationOutcome, AdminError>,
) -> Result<bool> {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("{}", e);
            return Ok(false);
        }
    };

    if tools.provider().is_changed() {
        store
            .save(tools.provider())
            .context("Failed to save farm after mutation")?;
    }

    emit(cli.json, &outcome, print_outcome)?;
    Ok(outcome.is_clean())
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn print_scan(report: &ScanReport) {
    println!("Fingerprint: {}", report.fingerprint);
    println!("Locations visited: {}", report.locations_visited);
    println!("Activations: {}", report.total_activations);
    println!("Faulty features: {}", report.faulty_features);
    for err in &report.errors {
        println!("  ! {}", err);
    }
}

fn print_features(listing: &FeatureListing) {
    for feature in &listing.features {
        println!(
            "{} {} [{} activation(s)]{}",
            feature.id,
            feature.summary("{Name} ({Scope})"),
            feature.activation_count.unwrap_or(0),
            if feature.faulty { " FAULTY" } else { "" }
        );
    }
    println!("{} features installed", listing.installed);
}

fn print_locations(set: &FeatureLocationSet) {
    if set.is_empty() {
        println!("No activations found");
        return;
    }
    for entry in &set.entries {
        println!("{}", entry.feature.summary("{Name} ({Scope}) {Id}"));
        for location in &entry.locations {
            println!("  {}", location);
        }
    }
    println!("{} location(s) in total", set.total_location_count());
}

fn print_outcome(outcome: &OperationOutcome) {
    println!(
        "{} succeeded, {} already absent, {} failed, {} attempted",
        outcome.succeeded,
        outcome.already_absent,
        outcome.failures.len(),
        outcome.attempted
    );
    for failure in &outcome.failures {
        println!("  ! {}: {}", failure.location, failure.message);
    }
    if outcome.cancelled {
        println!("Cancelled before completion");
    }
}
