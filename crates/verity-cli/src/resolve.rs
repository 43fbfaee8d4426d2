//! # Resolve Subcommand
//!
//! Dry-runs document-type resolution from the signals a parser would
//! report. The signals drive a real [`ResolutionController`] over a grammar
//! cache tuned by the configuration; grammars are parsed by the structural
//! mock engine, so no schema is compiled. The outcome is which preset wins,
//! the notes and warnings a document would receive, and the order in which
//! the resulting validators see events.
//!
//! A DOCTYPE signal (`--public-id`, or no `--namespace` at all) resolves
//! through the DOCTYPE table the way an HTML parser's document-mode signal
//! does. Otherwise the root namespace decides. With `catalog_root` set,
//! every grammar the preset names must exist in the catalog.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use verity_core::{DiagnosticLog, Event, Interrupt, PresetTable, TypeId};
use verity_grammar::combine::ALL_CHECKERS;
use verity_grammar::mock::{MockEngine, MockTransport};
use verity_grammar::{GrammarCache, GrammarEngine, LocalCatalog, Transport};
use verity_resolve::{ResolutionController, Resolver};

use crate::config::CliConfig;

/// Arguments for `verity resolve`.
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// DOCTYPE public identifier.
    #[arg(long, value_name = "ID")]
    pub public_id: Option<String>,

    /// Root element namespace ("" for none).
    #[arg(long, value_name = "NS")]
    pub namespace: Option<String>,

    /// Declared media type, checked against the root namespace.
    #[arg(long, value_name = "TYPE")]
    pub content_type: Option<String>,

    /// The HTML parser is reporting HTML4-specific tokenization errors.
    #[arg(long)]
    pub html4: bool,

    /// Print JSON.
    #[arg(long)]
    pub json: bool,
}

/// What triggered resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// DOCTYPE public identifier, or its absence.
    Doctype,
    /// Root element namespace.
    RootNamespace,
}

/// Outcome of a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DryRun {
    /// Preset chosen, if resolution happened.
    pub type_id: Option<TypeId>,
    /// Its label.
    pub label: Option<String>,
    /// Signal that chose it.
    pub trigger: Trigger,
    /// Informational notes a document would receive.
    pub notes: Vec<String>,
    /// Warnings a document would receive.
    pub warnings: Vec<String>,
    /// Concrete locators in event delivery order, one per leaf.
    pub delivery_order: Vec<String>,
    /// Grammars parsed to resolve.
    pub grammars_parsed: usize,
    /// Lazily built grammars the cache still holds afterwards.
    pub grammars_retained: usize,
}

/// Resolve `args` against `table` with the grammar cache `config` describes.
pub fn dry_run(
    args: &ResolveArgs,
    table: &PresetTable,
    config: &CliConfig,
) -> Result<DryRun, Interrupt> {
    let engine = Arc::new(MockEngine::new());
    let transport: Arc<dyn Transport> = match &config.catalog_root {
        Some(root) => Arc::new(LocalCatalog::new(root)),
        None => Arc::new(MockTransport::permissive()),
    };
    let mut builder =
        GrammarCache::builder(transport, Arc::clone(&engine) as Arc<dyn GrammarEngine>)
            .config(config.cache.clone());
    for locator in ALL_CHECKERS {
        builder = builder.register(locator, engine.checker(locator));
    }
    let cache = Arc::new(builder.build()?);
    let resolver = Resolver::new(Arc::new(table.clone()), Arc::clone(&cache))?;

    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = resolver.begin(log.clone(), args.content_type.clone());
    let trigger = signal(&mut ctl, args)?;

    let type_id = ctl.resolved_preset();
    ctl.handle(Event::EndDocument)?;
    let delivery_order = engine.journal().recipients_of(&Event::EndDocument);

    Ok(DryRun {
        type_id,
        label: type_id.and_then(|id| table.label(id)).map(str::to_string),
        trigger,
        notes: log.infos(),
        warnings: log.warnings(),
        delivery_order,
        grammars_parsed: engine.parse_count(),
        grammars_retained: cache.retained_count(),
    })
}

/// Feed the parser signals `args` describe, DOCTYPE first.
fn signal(ctl: &mut ResolutionController, args: &ResolveArgs) -> Result<Trigger, Interrupt> {
    let trigger = if args.public_id.is_some() || args.namespace.is_none() {
        ctl.on_document_mode(args.public_id.as_deref(), None, args.html4)?;
        Trigger::Doctype
    } else {
        Trigger::RootNamespace
    };
    if let Some(namespace) = &args.namespace {
        ctl.on_root_namespace(namespace, None)?;
    }
    Ok(trigger)
}

/// Execute the resolve subcommand. Exit code 1 when the document would be
/// aborted.
pub fn run_resolve(args: &ResolveArgs, config: &CliConfig) -> Result<u8> {
    let table = config.preset_table()?;
    let outcome = match dry_run(args, &table, config) {
        Ok(outcome) => outcome,
        Err(Interrupt::Abort(e)) => {
            eprintln!("error: {e}");
            return Ok(1);
        }
        Err(Interrupt::Fault(f)) => return Err(f.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(0);
    }

    if let (Some(label), Some(type_id)) = (&outcome.label, outcome.type_id) {
        println!("preset: {label} ({type_id})");
    }
    for note in &outcome.notes {
        println!("info: {note}");
    }
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    println!("delivery order:");
    for (i, locator) in outcome.delivery_order.iter().enumerate() {
        println!("  {:>2}. {locator}", i + 1);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_core::preset::{NS_ATOM, NS_SVG, NS_XHTML};
    use verity_core::{ConfigurationFault, DocumentError};
    use verity_grammar::CacheConfig;

    fn table() -> PresetTable {
        PresetTable::builtin().unwrap()
    }

    fn run(args: &ResolveArgs) -> Result<DryRun, Interrupt> {
        dry_run(args, &table(), &CliConfig::default())
    }

    #[test]
    fn no_signals_mean_html() {
        let outcome = run(&ResolveArgs::default()).unwrap();
        assert_eq!(outcome.type_id, Some(TypeId::HTML));
        assert_eq!(outcome.label.as_deref(), Some("HTML"));
        assert_eq!(outcome.trigger, Trigger::Doctype);
        assert_eq!(outcome.notes, vec!["Using the schema for HTML.".to_string()]);
        assert_eq!(outcome.delivery_order.len(), 9);
        assert_eq!(outcome.delivery_order[0], "http://s.validator.nu/html5-all.rnc");
        assert_eq!(outcome.delivery_order[2], "http://c.validator.nu/xml-pi/");
        assert_eq!(outcome.grammars_parsed, 2);
    }

    #[test]
    fn html401_strict() {
        let args = ResolveArgs {
            public_id: Some("-//W3C//DTD HTML 4.01//EN".into()),
            ..ResolveArgs::default()
        };
        let outcome = run(&args).unwrap();
        assert_eq!(outcome.type_id, Some(TypeId::XHTML1_STRICT));
        assert!(outcome.notes[0].contains("XHTML 1.0 Strict"));
        assert_eq!(outcome.delivery_order.len(), 6);
    }

    #[test]
    fn namespace_with_mismatched_type_warns() {
        let args = ResolveArgs {
            namespace: Some(NS_SVG.into()),
            content_type: Some("application/xhtml+xml".into()),
            ..ResolveArgs::default()
        };
        let outcome = run(&args).unwrap();
        assert_eq!(outcome.trigger, Trigger::RootNamespace);
        assert_eq!(outcome.type_id, Some(TypeId(6)));
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.notes[0].ends_with(&format!("based on the root namespace {NS_SVG}")));
    }

    #[test]
    fn doctype_wins_over_namespace() {
        let args = ResolveArgs {
            public_id: Some("-//W3C//DTD XHTML 1.0 Strict//EN".into()),
            namespace: Some(NS_XHTML.into()),
            content_type: Some("application/xhtml+xml".into()),
            ..ResolveArgs::default()
        };
        let outcome = run(&args).unwrap();
        assert_eq!(outcome.type_id, Some(TypeId::XHTML1_STRICT));
        assert_eq!(outcome.notes.len(), 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn doctype_then_mismatched_namespace_still_warns() {
        let args = ResolveArgs {
            public_id: Some("-//W3C//DTD XHTML 1.0 Strict//EN".into()),
            namespace: Some(String::new()),
            content_type: Some("application/xhtml+xml".into()),
            ..ResolveArgs::default()
        };
        let outcome = run(&args).unwrap();
        assert_eq!(outcome.trigger, Trigger::Doctype);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("not in a namespace"));
    }

    #[test]
    fn unknown_namespace_aborts() {
        let args = ResolveArgs {
            namespace: Some("urn:example:unknown".into()),
            ..ResolveArgs::default()
        };
        assert!(matches!(
            run(&args),
            Err(Interrupt::Abort(DocumentError::UnknownNamespace { .. }))
        ));
        assert_eq!(run_resolve(&args, &CliConfig::default()).unwrap(), 1);
    }

    #[test]
    fn hot_capacity_bounds_retained_grammars() {
        let config = CliConfig {
            cache: CacheConfig { hot_capacity: 1 },
            ..CliConfig::default()
        };
        let outcome = dry_run(&ResolveArgs::default(), &table(), &config).unwrap();
        assert_eq!(outcome.grammars_parsed, 2);
        assert_eq!(outcome.grammars_retained, 1);

        let roomy = run(&ResolveArgs::default()).unwrap();
        assert_eq!(roomy.grammars_retained, 2);
    }

    #[test]
    fn catalog_root_supplies_grammars() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            catalog_root: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };
        let args = ResolveArgs {
            namespace: Some(NS_ATOM.into()),
            ..ResolveArgs::default()
        };

        assert!(matches!(
            dry_run(&args, &table(), &config),
            Err(Interrupt::Fault(ConfigurationFault::PresetGrammar { .. }))
        ));

        let grammar = dir.path().join("s.validator.nu/atom/atom.rnc");
        std::fs::create_dir_all(grammar.parent().unwrap()).unwrap();
        std::fs::write(&grammar, "start = element feed { empty }").unwrap();
        let outcome = dry_run(&args, &table(), &config).unwrap();
        assert_eq!(outcome.type_id, Some(TypeId(8)));
        assert_eq!(
            outcome.delivery_order,
            vec!["http://s.validator.nu/atom/atom.rnc", "http://c.validator.nu/nfc/"]
        );
    }

    #[test]
    fn json_output_shape() {
        let args = ResolveArgs {
            namespace: Some(NS_SVG.into()),
            ..ResolveArgs::default()
        };
        let value = serde_json::to_value(run(&args).unwrap()).unwrap();
        assert_eq!(value["type_id"], 6);
        assert_eq!(value["trigger"], "root_namespace");
    }
}
