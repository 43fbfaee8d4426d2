//! # verity-cli — Command-Line Front End
//!
//! Provides the `verity` binary for inspecting and dry-running the
//! document-type resolution layer. Dry runs parse grammars with the
//! structural mock engine, so no schema is compiled.
//!
//! ## Subcommands
//!
//! - `verity presets` — list the preset table in effect.
//! - `verity resolve` — dry-run resolution from a DOCTYPE public identifier
//!   or a root namespace, through the grammar cache the config tunes.
//! - `verity expand` — expand a locator list and show delivery order.
//! - `verity catalog` — map locators onto the local grammar catalog.
//! - `verity config` — print the effective configuration.
//!
//! ```bash
//! verity resolve --public-id "-//W3C//DTD HTML 4.01//EN"
//! verity resolve --namespace http://www.w3.org/2000/svg --content-type application/xhtml+xml
//! verity expand http://s.validator.nu/html5-all.rnc http://c.validator.nu/all/
//! ```
//!
//! Handlers return the process exit code: 0 on success, 1 when the input
//! would fail. Operational errors propagate as `anyhow::Error`.

pub mod catalog;
pub mod config;
pub mod expand;
pub mod presets;
pub mod resolve;
