//! # CLI Configuration
//!
//! Optional YAML file given with `--config`. Every key may be omitted:
//!
//! ```yaml
//! presets_file: presets.tsv      # tab-separated rows, or...
//! presets:                       # ...inline rows (not both)
//!   - type_id: 8
//!     label: Atom 1.0
//!     locators: http://s.validator.nu/atom/atom.rnc http://c.validator.nu/nfc/
//!     namespace: http://www.w3.org/2005/Atom
//! catalog_root: grammars/
//! cache:
//!   hot_capacity: 64
//! ```
//!
//! Relative paths are taken relative to the config file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use verity_core::{PresetRow, PresetTable};
use verity_grammar::CacheConfig;

/// Effective CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Tab-separated preset table replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presets_file: Option<PathBuf>,
    /// Inline preset rows replacing the built-in table.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<PresetRow>,
    /// Directory holding bundled grammars, laid out by locator host and path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_root: Option<PathBuf>,
    /// Tuning for the grammar cache `verity resolve` builds.
    pub cache: CacheConfig,
}

impl CliConfig {
    /// Load from `path`, or the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        if config.presets_file.is_some() && !config.presets.is_empty() {
            bail!(
                "config {} sets both presets_file and presets",
                path.display()
            );
        }

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.presets_file = config.presets_file.map(|p| resolve_path(&p, base));
        config.catalog_root = config.catalog_root.map(|p| resolve_path(&p, base));

        tracing::debug!(config = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// The preset table this configuration selects.
    pub fn preset_table(&self) -> Result<PresetTable> {
        if let Some(file) = &self.presets_file {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read presets {}", file.display()))?;
            return PresetTable::parse_rows(&text)
                .with_context(|| format!("invalid preset table {}", file.display()));
        }
        if !self.presets.is_empty() {
            return PresetTable::new(self.presets.iter().cloned())
                .context("invalid inline preset table");
        }
        PresetTable::builtin().context("built-in preset table is invalid")
    }
}

/// Arguments for `verity config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print JSON instead of YAML.
    #[arg(long)]
    pub json: bool,
}

/// Print the effective configuration and the size of the preset table it
/// selects. Fails if that table is invalid.
pub fn run_config(args: &ConfigArgs, config: &CliConfig) -> Result<u8> {
    let table = config.preset_table()?;
    tracing::info!(presets = table.len(), "preset table is valid");
    if args.json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", serde_yaml::to_string(config)?);
    }
    Ok(0)
}

/// `path` if absolute, otherwise `path` under `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
