//! # Presets Subcommand
//!
//! Lists the preset table in effect: built-in, or the one named by the
//! configuration file.

use anyhow::Result;
use clap::Args;
use verity_core::PresetTable;

use crate::config::CliConfig;

/// Arguments for `verity presets`.
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Execute the presets subcommand.
pub fn run_presets(args: &PresetsArgs, config: &CliConfig) -> Result<u8> {
    let table = config.preset_table()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(table.entries())?);
    } else {
        print!("{}", render(&table));
    }
    Ok(0)
}

/// Human-readable listing, one block per preset.
pub fn render(table: &PresetTable) -> String {
    let mut out = String::new();
    for preset in table.entries() {
        out.push_str(&format!("{:>3}  {}\n", preset.type_id.0, preset.label));
        if !preset.namespace.is_empty() {
            out.push_str(&format!("     namespace: {}\n", preset.namespace));
        }
        for locator in &preset.locators {
            out.push_str(&format!("     - {locator}\n"));
        }
    }
    out
}
