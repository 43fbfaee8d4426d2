//! # verity CLI entry point
//!
//! Parses command-line arguments, loads the optional configuration file,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use verity_cli::catalog::{run_catalog, CatalogArgs};
use verity_cli::config::{run_config, CliConfig, ConfigArgs};
use verity_cli::expand::{run_expand, ExpandArgs};
use verity_cli::presets::{run_presets, PresetsArgs};
use verity_cli::resolve::{run_resolve, ResolveArgs};

/// verity: document-type resolution for markup conformance checking.
///
/// Inspects the preset table, dry-runs which schema set a document would be
/// validated against, and shows how locator lists expand.
#[derive(Parser, Debug)]
#[command(name = "verity", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the preset table.
    Presets(PresetsArgs),

    /// Dry-run document-type resolution.
    Resolve(ResolveArgs),

    /// Expand a locator list and show event delivery order.
    Expand(ExpandArgs),

    /// Map locators onto the local grammar catalog.
    Catalog(CatalogArgs),

    /// Print the effective configuration.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "verity CLI starting");

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Commands::Presets(args) => run_presets(&args, &config),
        Commands::Resolve(args) => run_resolve(&args, &config),
        Commands::Expand(args) => run_expand(&args, &config),
        Commands::Catalog(args) => run_catalog(&args, &config),
        Commands::Config(args) => run_config(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
