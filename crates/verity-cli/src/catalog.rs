//! # Catalog Subcommand
//!
//! Maps locators onto the local grammar catalog and, with `--check`, reads
//! each file through the same transport the grammar cache uses. Checker
//! locators and aggregate tokens are reported as built in.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use verity_grammar::transport::media_type_for;
use verity_grammar::{expand_tokens, LocalCatalog, ReaderKind, Transport};

use crate::config::CliConfig;

/// Arguments for `verity catalog`.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog root; overrides `catalog_root` from the config.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Locators to look up. Aggregate tokens are expanded.
    #[arg(value_name = "LOCATOR", required = true)]
    pub locators: Vec<String>,

    /// Read every file and fail if any is missing.
    #[arg(long)]
    pub check: bool,

    /// Print JSON.
    #[arg(long)]
    pub json: bool,
}

/// Where one locator lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// The locator.
    pub locator: String,
    /// File it maps to; `None` for built-in checkers.
    pub path: Option<PathBuf>,
    /// Media type implied by the file extension.
    pub media_type: Option<String>,
    /// Reader the cache would select.
    pub reader: Option<String>,
    /// `built-in`, `mapped`, `ok`, or the fetch error.
    pub status: String,
}

/// Look up `locators` in `catalog`, fetching each when `check` is set.
pub fn inspect(catalog: &LocalCatalog, locators: &[String], check: bool) -> Vec<CatalogEntry> {
    let joined = locators.join(" ");
    let mut entries = Vec::new();
    for locator in expand_tokens(&joined) {
        let Some(path) = catalog.path_for(locator) else {
            entries.push(CatalogEntry {
                locator: locator.to_string(),
                path: None,
                media_type: None,
                reader: None,
                status: "built-in".to_string(),
            });
            continue;
        };
        let media_type = media_type_for(&path);
        let status = if !check {
            "mapped".to_string()
        } else {
            match catalog.fetch(locator) {
                Ok(_) => "ok".to_string(),
                Err(e) => e.to_string(),
            }
        };
        entries.push(CatalogEntry {
            locator: locator.to_string(),
            path: Some(path),
            media_type: media_type.map(str::to_string),
            reader: Some(format!("{:?}", ReaderKind::for_media_type(media_type))),
            status,
        });
    }
    entries
}

/// Execute the catalog subcommand. Exit code 1 when `--check` finds a file
/// that cannot be read.
pub fn run_catalog(args: &CatalogArgs, config: &CliConfig) -> Result<u8> {
    let root = args
        .root
        .clone()
        .or_else(|| config.catalog_root.clone())
        .context("no catalog root: pass --root or set catalog_root in the config")?;
    let catalog = LocalCatalog::new(root);

    let entries = inspect(&catalog, &args.locators, args.check);
    let failed = entries
        .iter()
        .filter(|e| !matches!(e.status.as_str(), "ok" | "mapped" | "built-in"))
        .count();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            match &entry.path {
                Some(path) => println!("{}  {}  [{}]", entry.locator, path.display(), entry.status),
                None => println!("{}  [{}]", entry.locator, entry.status),
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, root = %catalog.root().display(), "catalog is incomplete");
        return Ok(1);
    }
    Ok(0)
}
