//! End-to-end resolution against the built-in preset table with the mock
//! grammar engine.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use verity_core::preset::{NS_ATOM, NS_SVG, NS_XHTML};
use verity_core::{
    ConfigurationFault, DiagnosticLog, DocumentError, Event, GrammarLoadError, Interrupt,
    PresetTable, TypeId,
};
use verity_grammar::combine::{AGGREGATE_ALL, ALL_CHECKERS};
use verity_grammar::mock::{MockEngine, MockTransport};
use verity_grammar::{GrammarCache, GrammarEngine, Transport};
use verity_resolve::Resolver;

struct Harness {
    engine: Arc<MockEngine>,
    resolver: Resolver,
}

fn harness_with(engine: MockEngine, preload: bool) -> Harness {
    let engine = Arc::new(engine);
    let presets = Arc::new(PresetTable::builtin().unwrap());
    let mut builder = GrammarCache::builder(
        Arc::new(MockTransport::permissive()) as Arc<dyn Transport>,
        Arc::clone(&engine) as Arc<dyn GrammarEngine>,
    );
    for locator in ALL_CHECKERS {
        builder = builder.register(locator, engine.checker(locator));
    }
    if preload {
        builder = builder.preload_presets(&presets);
    }
    let cache = Arc::new(builder.build().unwrap());
    Harness {
        resolver: Resolver::new(presets, cache).unwrap(),
        engine,
    }
}

fn harness() -> Harness {
    harness_with(MockEngine::new(), true)
}

fn svg_document() -> Vec<Event> {
    vec![
        Event::StartDocument,
        Event::StartPrefixMapping {
            prefix: String::new(),
            uri: NS_SVG.to_string(),
        },
        Event::start_element(NS_SVG, "svg"),
        Event::characters("hello"),
        Event::end_element(NS_SVG, "svg"),
        Event::EndPrefixMapping {
            prefix: String::new(),
        },
        Event::EndDocument,
    ]
}

#[test]
fn svg_document_resolves_by_namespace_without_warnings() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h
        .resolver
        .begin(log.clone(), Some("image/svg+xml".to_string()));

    for event in svg_document() {
        ctl.handle(event).unwrap();
    }

    assert_eq!(ctl.resolved_preset(), Some(TypeId(6)));
    assert!(log.warnings().is_empty());
    assert!(log.errors().is_empty());
    assert_eq!(
        log.infos(),
        vec![format!(
            "Using the preset for SVG 1.1 + URL + XHTML + MathML 3.0 based on the root namespace {NS_SVG}"
        )]
    );

    let locators: Vec<String> = ctl
        .active_locators()
        .unwrap()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(locators.len(), 9);
    let journal = h.engine.journal();
    for locator in &locators {
        assert_eq!(journal.events_for(locator), svg_document(), "{locator}");
    }
}

#[test]
fn buffered_events_replay_in_delivery_order_exactly_once() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log, None);

    ctl.handle(Event::StartDocument).unwrap();
    ctl.handle(Event::Comment {
        text: "before root".into(),
    })
    .unwrap();
    assert!(!ctl.is_resolved());
    ctl.handle(Event::start_element(NS_ATOM, "feed")).unwrap();

    let order: Vec<String> = ctl
        .active_locators()
        .unwrap()
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        order,
        vec![
            "http://s.validator.nu/atom/atom.rnc".to_string(),
            "http://c.validator.nu/nfc/".to_string(),
        ]
    );
    let journal = h.engine.journal();
    assert_eq!(journal.recipients_of(&Event::StartDocument), order);
    assert_eq!(journal.len(), 3 * order.len());
}

#[test]
fn resolution_is_deterministic() {
    let h = harness();
    let run = || {
        let log = Arc::new(DiagnosticLog::new());
        let mut ctl = h
            .resolver
            .begin(log.clone(), Some("application/xhtml+xml".to_string()));
        ctl.on_document_mode(Some("-//W3C//DTD XHTML 1.0 Strict//EN"), None, false)
            .unwrap();
        ctl.handle(Event::start_element(NS_XHTML, "html")).unwrap();
        let locators: Vec<String> = ctl
            .active_locators()
            .unwrap()
            .into_iter()
            .map(str::to_string)
            .collect();
        (locators, log.entries(), ctl.resolved_preset())
    };
    assert_eq!(run(), run());
}

#[test]
fn resolved_validator_is_never_replaced() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log.clone(), None);

    ctl.use_locators("http://x/custom.rnc").unwrap();
    ctl.on_document_mode(Some("-//W3C//DTD HTML 4.01//EN"), None, false)
        .unwrap();
    ctl.handle(Event::start_element(NS_SVG, "svg")).unwrap();
    ctl.use_locators("http://x/other.rnc").unwrap();

    assert_eq!(ctl.active_locators(), Some(vec!["http://x/custom.rnc"]));
    assert_eq!(ctl.resolved_preset(), None);
    assert!(log.infos().is_empty());
}

#[test]
fn html401_strict_doctype_uses_strict_preset() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log.clone(), Some("text/html".into()));

    ctl.on_document_mode(Some("-//W3C//DTD HTML 4.01//EN"), None, false)
        .unwrap();
    ctl.handle(Event::start_element("", "html")).unwrap();

    assert_eq!(ctl.resolved_preset(), Some(TypeId::XHTML1_STRICT));
    let infos = log.infos();
    assert_eq!(infos.len(), 1);
    assert!(infos[0].contains("XHTML 1.0 Strict"));
    assert!(log.warnings().is_empty());
    assert_eq!(ctl.transaction().loaded_count(), 6);
}

#[test]
fn missing_doctype_selects_html() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log.clone(), None);
    ctl.on_document_mode(None, None, false).unwrap();
    assert_eq!(ctl.resolved_preset(), Some(TypeId::HTML));
    assert_eq!(log.infos(), vec!["Using the schema for HTML.".to_string()]);
    // The built-in HTML preset does not name a grammar from the hook set.
    assert!(!log.html_spec_requested());
}

#[test]
fn xhtml_media_type_with_unnamespaced_root_warns_once() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h
        .resolver
        .begin(log.clone(), Some("application/xhtml+xml".to_string()));
    ctl.on_document_mode(None, None, false).unwrap();
    ctl.handle(Event::start_element("", "html")).unwrap();
    ctl.handle(Event::start_element("", "body")).unwrap();

    assert_eq!(
        log.warnings(),
        vec!["\u{201C}application/xhtml+xml\u{201D} is not an appropriate Content-Type for a document whose root element is not in a namespace.".to_string()]
    );
}

#[test]
fn xhtml_media_type_with_xhtml_root_is_silent() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h
        .resolver
        .begin(log.clone(), Some("application/xhtml+xml".to_string()));
    ctl.handle(Event::start_element(NS_XHTML, "html")).unwrap();
    assert!(log.warnings().is_empty());
    assert_eq!(ctl.resolved_preset(), Some(TypeId::XHTML5));
}

#[test]
fn unknown_root_namespace_aborts_document() {
    let h = harness();
    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log.clone(), None);
    ctl.handle(Event::StartDocument).unwrap();

    let err = ctl
        .handle(Event::start_element("urn:example:unknown", "root"))
        .unwrap_err();
    assert_eq!(
        err,
        Interrupt::Abort(DocumentError::UnknownNamespace {
            namespace: "urn:example:unknown".to_string()
        })
    );
    assert!(!err.is_fatal());
    assert!(ctl.is_aborted());
    assert_eq!(
        log.schema_errors(),
        vec!["Cannot find preset schema for namespace: \u{201C}urn:example:unknown\u{201D}.".to_string()]
    );
    assert!(h.engine.journal().is_empty());

    // The next document is unaffected.
    let mut next = h.resolver.begin(Arc::new(DiagnosticLog::new()), None);
    next.handle(Event::start_element(NS_SVG, "svg")).unwrap();
    assert!(next.is_resolved());
}

#[test]
fn general_aggregate_yields_seven_leaves() {
    let h = harness();
    let mut ctl = h.resolver.begin(Arc::new(DiagnosticLog::new()), None);
    ctl.use_locators(AGGREGATE_ALL).unwrap();
    let combined = ctl.finish().unwrap();
    assert_eq!(combined.leaf_count(), 7);
}

#[test]
fn preset_grammar_failure_is_a_fault() {
    let engine = MockEngine::new();
    engine.fail_on("http://s.validator.nu/atom/atom.rnc");
    let h = harness_with(engine, false);

    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log, None);
    let err = ctl
        .handle(Event::start_element(NS_ATOM, "feed"))
        .unwrap_err();
    assert!(err.is_fatal());
    match err {
        Interrupt::Fault(ConfigurationFault::PresetGrammar { type_id, source }) => {
            assert_eq!(type_id, TypeId(8));
            assert_eq!(source.locator(), "http://s.validator.nu/atom/atom.rnc");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn explicit_locator_failure_aborts_without_poisoning() {
    let h = harness();
    h.engine.fail_on("http://x/broken.rnc");

    let log = Arc::new(DiagnosticLog::new());
    let mut ctl = h.resolver.begin(log.clone(), None);
    let err = ctl.use_locators("http://x/broken.rnc").unwrap_err();
    assert!(matches!(
        err,
        Interrupt::Abort(DocumentError::GrammarLoad(GrammarLoadError::Parse { .. }))
    ));
    assert_eq!(log.schema_errors().len(), 1);

    h.engine.recover("http://x/broken.rnc");
    let mut retry = h.resolver.begin(Arc::new(DiagnosticLog::new()), None);
    retry.use_locators("http://x/broken.rnc").unwrap();
    assert!(retry.is_resolved());
}

#[test]
fn preloaded_grammars_are_not_reparsed_per_document() {
    let h = harness();
    let after_startup = h.engine.parse_count();
    for _ in 0..3 {
        let mut ctl = h.resolver.begin(Arc::new(DiagnosticLog::new()), None);
        ctl.handle(Event::start_element(NS_SVG, "svg")).unwrap();
    }
    assert_eq!(h.engine.parse_count(), after_startup);
}

#[test]
fn concurrent_documents_share_one_lazy_build() {
    let h = harness_with(MockEngine::with_delay(Duration::from_millis(50)), false);
    let resolver = h.resolver.clone();
    let threads = 6;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut ctl = resolver.begin(Arc::new(DiagnosticLog::new()), None);
                barrier.wait();
                ctl.use_locators("http://x/shared.rnc").is_ok()
            })
        })
        .collect();

    assert!(handles.into_iter().all(|t| t.join().unwrap()));
    assert_eq!(h.engine.parse_count_for("http://x/shared.rnc"), 1);
}
