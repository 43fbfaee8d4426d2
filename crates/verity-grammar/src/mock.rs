//! # Mock Grammar Engine
//!
//! A deterministic, instrumented engine and transport. Grammars accept
//! everything; their validators append each received event to a shared
//! [`EventJournal`] tagged with the locator, so tests can observe delivery
//! order, replay, and parse counts.
//!
//! Locators under `http://c.validator.nu/` are treated as programmatic
//! checkers, matching how the preset table uses them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use verity_core::Event;

use crate::traits::{
    EventSink, Grammar, GrammarEngine, GrammarError, GrammarOptions, ReaderKind, Transport,
    TransportError, TypedInput, Validator, COMPACT_SYNTAX_MEDIA_TYPE,
};

const CHECKER_PREFIX: &str = "http://c.validator.nu/";

/// Shared record of `(locator, event)` pairs in delivery order.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    entries: Arc<Mutex<Vec<(String, Event)>>>,
}

impl EventJournal {
    /// Everything delivered so far.
    pub fn entries(&self) -> Vec<(String, Event)> {
        self.entries.lock().clone()
    }

    /// Events seen by validators for one locator.
    pub fn events_for(&self, locator: &str) -> Vec<Event> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Locators in the order they received `event`.
    pub fn recipients_of(&self, event: &Event) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| e == event)
            .map(|(l, _)| l.clone())
            .collect()
    }

    /// Number of deliveries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn record(&self, locator: &str, event: &Event) {
        self.entries.lock().push((locator.to_string(), event.clone()));
    }
}

/// Grammar produced by [`MockEngine`].
#[derive(Debug)]
pub struct MockGrammar {
    locator: String,
    checker: bool,
    journal: EventJournal,
}

impl Grammar for MockGrammar {
    fn instantiate(&self, _options: &GrammarOptions) -> Box<dyn Validator> {
        Box::new(MockValidator {
            locator: self.locator.clone(),
            journal: self.journal.clone(),
        })
    }

    fn is_checker(&self) -> bool {
        self.checker
    }
}

/// Validator produced by [`MockGrammar`].
#[derive(Debug)]
pub struct MockValidator {
    locator: String,
    journal: EventJournal,
}

impl EventSink for MockValidator {
    fn event(&mut self, event: &Event) {
        self.journal.record(&self.locator, event);
    }
}

impl Validator for MockValidator {
    fn sink(&mut self) -> &mut dyn EventSink {
        self
    }
}

/// Instrumented [`GrammarEngine`].
#[derive(Debug, Default)]
pub struct MockEngine {
    parses: AtomicUsize,
    per_locator: Mutex<HashMap<String, usize>>,
    readers: Mutex<Vec<(String, ReaderKind)>>,
    options: Mutex<Vec<(String, GrammarOptions)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
    journal: EventJournal,
}

impl MockEngine {
    /// An engine that parses instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose parses take `delay`, to widen race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Journal shared by every validator this engine's grammars create.
    pub fn journal(&self) -> EventJournal {
        self.journal.clone()
    }

    /// A checker grammar for `locator`, built without parsing.
    pub fn checker(&self, locator: &str) -> Arc<dyn Grammar> {
        Arc::new(MockGrammar {
            locator: locator.to_string(),
            checker: true,
            journal: self.journal.clone(),
        })
    }

    /// Make parses of `locator` fail until [`recover`](Self::recover).
    pub fn fail_on(&self, locator: &str) {
        self.failing.lock().insert(locator.to_string());
    }

    /// Undo [`fail_on`](Self::fail_on).
    pub fn recover(&self, locator: &str) {
        self.failing.lock().remove(locator);
    }

    /// Total parses attempted.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    /// Parses attempted for one locator.
    pub fn parse_count_for(&self, locator: &str) -> usize {
        self.per_locator.lock().get(locator).copied().unwrap_or(0)
    }

    /// `(locator, reader)` for every parse, in order.
    pub fn readers_used(&self) -> Vec<(String, ReaderKind)> {
        self.readers.lock().clone()
    }

    /// Options each parse of `locator` was given, in order.
    pub fn options_used(&self, locator: &str) -> Vec<GrammarOptions> {
        self.options
            .lock()
            .iter()
            .filter(|(l, _)| l == locator)
            .map(|(_, o)| o.clone())
            .collect()
    }

    /// Most parses ever running at the same time.
    pub fn peak_concurrent_parses(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts one parse as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GrammarEngine for MockEngine {
    fn parse(
        &self,
        input: &TypedInput,
        reader: ReaderKind,
        options: &GrammarOptions,
    ) -> Result<Arc<dyn Grammar>, GrammarError> {
        let _running = InFlight::enter(&self.in_flight, &self.peak_in_flight);
        self.parses.fetch_add(1, Ordering::SeqCst);
        *self
            .per_locator
            .lock()
            .entry(input.locator.clone())
            .or_insert(0) += 1;
        self.readers.lock().push((input.locator.clone(), reader));
        self.options
            .lock()
            .push((input.locator.clone(), options.clone()));

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.failing.lock().contains(&input.locator) {
            return Err(GrammarError::new(format!(
                "mock engine refuses {}",
                input.locator
            )));
        }

        Ok(Arc::new(MockGrammar {
            locator: input.locator.clone(),
            checker: input.locator.starts_with(CHECKER_PREFIX),
            journal: self.journal.clone(),
        }))
    }
}

/// In-memory [`Transport`].
#[derive(Debug, Default)]
pub struct MockTransport {
    known: Option<HashSet<String>>,
    fetches: AtomicUsize,
}

impl MockTransport {
    /// Serves any locator.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Serves only the listed locators.
    pub fn serving<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: Some(locators.into_iter().map(Into::into).collect()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Fetches attempted.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn fetch(&self, locator: &str) -> Result<TypedInput, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(known) = &self.known {
            if !known.contains(locator) {
                return Err(TransportError::NotFound(locator.to_string()));
            }
        }
        let media_type = if locator.ends_with(".rnc") {
            Some(COMPACT_SYNTAX_MEDIA_TYPE.to_string())
        } else {
            Some("application/xml".to_string())
        };
        Ok(TypedInput {
            locator: locator.to_string(),
            media_type,
            bytes: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators_record_into_shared_journal() {
        let engine = MockEngine::new();
        let transport = MockTransport::permissive();
        let input = transport.fetch("http://x/a.rnc").unwrap();
        let grammar = engine
            .parse(&input, ReaderKind::Compact, &GrammarOptions::default())
            .unwrap();

        let mut validator = grammar.instantiate(&GrammarOptions::default());
        validator.sink().event(&Event::StartDocument);

        let journal = engine.journal();
        assert_eq!(journal.events_for("http://x/a.rnc"), vec![Event::StartDocument]);
        assert_eq!(journal.recipients_of(&Event::StartDocument), vec!["http://x/a.rnc"]);
        assert_eq!(transport.fetch_count(), 1);
    }

    #[test]
    fn checker_prefix_marks_checkers() {
        let engine = MockEngine::new();
        let input = MockTransport::permissive()
            .fetch("http://c.validator.nu/nfc/")
            .unwrap();
        let grammar = engine
            .parse(&input, ReaderKind::Auto, &GrammarOptions::default())
            .unwrap();
        assert!(grammar.is_checker());
        assert!(engine.checker("anything").is_checker());
    }

    #[test]
    fn sequential_parses_never_overlap() {
        let engine = MockEngine::new();
        let transport = MockTransport::permissive();
        for locator in ["http://x/a.rnc", "http://x/b.rnc"] {
            let input = transport.fetch(locator).unwrap();
            engine
                .parse(&input, ReaderKind::Compact, &GrammarOptions::attribute_owner())
                .unwrap();
        }
        assert_eq!(engine.peak_concurrent_parses(), 1);
        assert_eq!(
            engine.options_used("http://x/b.rnc"),
            vec![GrammarOptions::attribute_owner()]
        );
    }

    #[test]
    fn serving_rejects_unknown_locators() {
        let transport = MockTransport::serving(["http://x/a.rnc"]);
        assert!(transport.fetch("http://x/a.rnc").is_ok());
        assert!(matches!(
            transport.fetch("http://x/b.rnc"),
            Err(TransportError::NotFound(_))
        ));
    }
}
