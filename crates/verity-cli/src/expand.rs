//! # Expand Subcommand
//!
//! Shows how a locator list is expanded and in which order the combined
//! validator would deliver events.

use std::collections::HashSet;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use verity_grammar::{delivery_order, expand_tokens};

use crate::config::CliConfig;

/// Arguments for `verity expand`.
#[derive(Args, Debug)]
pub struct ExpandArgs {
    /// Locators, highest priority first. Aggregate tokens are expanded.
    #[arg(value_name = "LOCATORS", required = true)]
    pub locators: Vec<String>,

    /// Print JSON.
    #[arg(long)]
    pub json: bool,
}

/// Expansion of one list.
#[derive(Debug, Serialize)]
pub struct Expansion {
    /// Concrete locators in declaration order.
    pub expanded: Vec<String>,
    /// Locators in delivery order, one per validator.
    pub delivery_order: Vec<String>,
    /// Locators named more than once; each occurrence is its own validator.
    pub repeated: Vec<String>,
}

impl Expansion {
    /// Expand `list`.
    pub fn of(list: &str) -> Self {
        let expanded = expand_tokens(list);
        let mut seen = HashSet::new();
        let mut repeated = Vec::new();
        for locator in &expanded {
            if !seen.insert(*locator) && !repeated.contains(locator) {
                repeated.push(*locator);
            }
        }
        Self {
            expanded: expanded.into_iter().map(str::to_string).collect(),
            delivery_order: delivery_order(list).into_iter().map(str::to_string).collect(),
            repeated: repeated.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Execute the expand subcommand.
pub fn run_expand(args: &ExpandArgs, _config: &CliConfig) -> Result<u8> {
    let expansion = Expansion::of(&args.locators.join(" "));
    if args.json {
        println!("{}", serde_json::to_string_pretty(&expansion)?);
        return Ok(0);
    }
    for (i, locator) in expansion.delivery_order.iter().enumerate() {
        println!("{:>2}. {locator}", i + 1);
    }
    for locator in &expansion.repeated {
        println!("note: {locator} is named more than once; each occurrence gets its own validator");
    }
    Ok(0)
}
