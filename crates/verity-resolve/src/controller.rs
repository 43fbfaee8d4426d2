//! # Resolution Controller
//!
//! Decides which validator applies to a document and installs it exactly
//! once. Three signals can trigger resolution, whichever comes first:
//!
//! - an explicit locator list ([`ResolutionController::use_locators`]),
//! - the HTML document-mode signal with the DOCTYPE public identifier
//!   ([`ResolutionController::on_document_mode`]),
//! - the root element's namespace ([`ResolutionController::on_root_namespace`],
//!   also sniffed from the first start tag passed to
//!   [`ResolutionController::handle`]).
//!
//! Events that arrive before resolution are buffered and replayed into the
//! new validator in arrival order, so every constituent sees the whole
//! stream exactly once. Later signals never replace the validator.
//!
//! ## Failures
//!
//! Document-scoped problems are reported to the document's [`Diagnostics`]
//! and returned as [`Interrupt::Abort`]; the controller ignores everything
//! afterwards. A preset that cannot be built is a [`ConfigurationFault`]
//! and returned as [`Interrupt::Fault`].

use std::sync::Arc;

use uuid::Uuid;
use verity_core::{
    ConfigurationFault, Diagnostics, DocumentError, Event, GrammarLoadError, Interrupt, Location,
    PresetTable, TypeId,
};
use verity_grammar::{
    combine, CombinedValidator, EventSink, GrammarCache, GrammarOptions, SharedValidator,
    ValidatorSource,
};

use crate::consistency;
use crate::doctype::{self, QUIRKS_NOTE};
use crate::transaction::Transaction;

/// Grammars whose presence means the HTML specification is in use.
pub const HTML_SPEC_LOCATORS: [&str; 5] = [
    "http://s.validator.nu/html5/html5full-aria.rnc",
    "http://s.validator.nu/xhtml5-aria-rdf-svg-mathml.rnc",
    "http://s.validator.nu/html5/html5full.rnc",
    "http://s.validator.nu/html5/xhtml5full-xhtml.rnc",
    "http://s.validator.nu/html5-aria-svg-mathml.rnc",
];

/// Process-wide resolution context: the preset table and the grammar cache.
/// Cheap to clone; each document gets its own controller from [`Resolver::begin`].
#[derive(Debug, Clone)]
pub struct Resolver {
    presets: Arc<PresetTable>,
    cache: Arc<GrammarCache>,
    options: GrammarOptions,
}

impl Resolver {
    /// Check that every preset the DOCTYPE rules can select exists and that
    /// no preset is empty.
    pub fn new(
        presets: Arc<PresetTable>,
        cache: Arc<GrammarCache>,
    ) -> Result<Self, ConfigurationFault> {
        for type_id in doctype::referenced_type_ids() {
            presets.require(type_id)?;
        }
        if let Some(empty) = presets.entries().iter().find(|p| p.locators.is_empty()) {
            return Err(ConfigurationFault::EmptyPreset(empty.type_id));
        }
        Ok(Self {
            presets,
            cache,
            options: GrammarOptions::default(),
        })
    }

    /// Options passed to the cache and to validator instantiation.
    pub fn with_options(mut self, options: GrammarOptions) -> Self {
        self.options = options;
        self
    }

    /// The preset table.
    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    /// The grammar cache.
    pub fn cache(&self) -> &GrammarCache {
        &self.cache
    }

    /// Start a document declared as `content_type`.
    pub fn begin(
        &self,
        diagnostics: Arc<dyn Diagnostics>,
        content_type: Option<String>,
    ) -> ResolutionController {
        let txn = Transaction::new(content_type);
        tracing::debug!(
            document = %txn.id(),
            content_type = txn.declared_content_type().unwrap_or(""),
            "document started"
        );
        ResolutionController {
            resolver: self.clone(),
            diagnostics,
            txn,
        }
    }
}

/// Per-document resolution state machine.
pub struct ResolutionController {
    resolver: Resolver,
    diagnostics: Arc<dyn Diagnostics>,
    txn: Transaction,
}

impl std::fmt::Debug for ResolutionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionController")
            .field("txn", &self.txn)
            .finish_non_exhaustive()
    }
}

/// Validator lookups for one document, memoized in its transaction.
struct DocumentSource<'a> {
    txn: &'a mut Transaction,
    cache: &'a GrammarCache,
    options: &'a GrammarOptions,
    diagnostics: &'a dyn Diagnostics,
}

impl ValidatorSource for DocumentSource<'_> {
    type Error = GrammarLoadError;

    fn validator_for(&mut self, locator: &str) -> Result<SharedValidator, GrammarLoadError> {
        if HTML_SPEC_LOCATORS.contains(&locator) {
            self.diagnostics.html_spec_in_use();
        }
        self.txn.validator_for(self.cache, locator, self.options)
    }

    fn fresh_validator_for(&mut self, locator: &str) -> Result<SharedValidator, GrammarLoadError> {
        self.txn.fresh_validator_for(self.cache, locator, self.options)
    }
}

impl ResolutionController {
    /// Pass one structural event. Buffered until resolution, forwarded
    /// after. The first start tag also acts as the root-namespace signal.
    pub fn handle(&mut self, event: Event) -> Result<(), Interrupt> {
        if self.txn.aborted {
            return Ok(());
        }
        let root = if self.txn.root_namespace_seen {
            None
        } else {
            event
                .as_start_element()
                .map(|(ns, location)| (ns.to_string(), location.cloned()))
        };

        match self.txn.resolved.as_mut() {
            Some(validator) => validator.event(&event),
            None => self.txn.buffer.push(event),
        }

        match root {
            Some((namespace, location)) => self.on_root_namespace(&namespace, location.as_ref()),
            None => Ok(()),
        }
    }

    /// The root element is in `namespace` (empty for none). Resolves by
    /// namespace if still unresolved, then checks the declared media type.
    /// Only the first call has any effect.
    pub fn on_root_namespace(
        &mut self,
        namespace: &str,
        location: Option<&Location>,
    ) -> Result<(), Interrupt> {
        if self.txn.aborted || self.txn.root_namespace_seen {
            return Ok(());
        }
        let _span = tracing::debug_span!("root_namespace", document = %self.txn.id()).entered();

        if self.txn.resolved.is_none() {
            let presets = Arc::clone(&self.resolver.presets);
            let Some(preset) = presets.by_namespace(namespace) else {
                return Err(self.abort_with(DocumentError::UnknownNamespace {
                    namespace: namespace.to_string(),
                }));
            };
            self.diagnostics.info(&format!(
                "Using the preset for {} based on the root namespace {namespace}",
                preset.label
            ));
            self.resolve_preset(preset.type_id)?;
        }

        self.txn.root_namespace_seen = true;
        if let Some(declared) = self.txn.declared_content_type() {
            if let Some(warning) = consistency::check(declared, namespace) {
                self.diagnostics.warning(&warning, location);
            }
        }
        Ok(())
    }

    /// The HTML parser settled its document mode. Resolves from the DOCTYPE
    /// `public_id` if still unresolved; otherwise only notes HTML4 quirks.
    pub fn on_document_mode(
        &mut self,
        public_id: Option<&str>,
        system_id: Option<&str>,
        html4_quirks: bool,
    ) -> Result<(), Interrupt> {
        if self.txn.aborted {
            return Ok(());
        }
        if self.txn.resolved.is_some() {
            if html4_quirks {
                self.diagnostics.info(QUIRKS_NOTE);
            }
            return Ok(());
        }
        let _span = tracing::debug_span!("document_mode", document = %self.txn.id()).entered();
        tracing::debug!(public_id, system_id, html4_quirks, "document mode signal");

        let matched = doctype::classify(public_id);
        let presets = Arc::clone(&self.resolver.presets);
        let preset = match presets.require(matched.type_id) {
            Ok(preset) => preset,
            Err(fault) => return Err(self.fault(fault)),
        };
        self.diagnostics.info(&matched.note(&preset.label, html4_quirks));
        self.resolve_preset(preset.type_id)
    }

    /// Resolve from an explicit whitespace-separated locator list, highest
    /// priority first. Ignored once resolved.
    pub fn use_locators(&mut self, locators: &str) -> Result<(), Interrupt> {
        if self.txn.aborted {
            return Ok(());
        }
        if self.txn.resolved.is_some() {
            tracing::debug!(document = %self.txn.id(), "already resolved; explicit locators ignored");
            return Ok(());
        }
        let _span = tracing::debug_span!("explicit_locators", document = %self.txn.id()).entered();

        match self.assemble(locators) {
            Ok(Some(combined)) => {
                self.install(combined, None);
                Ok(())
            }
            Ok(None) => Err(self.abort_with(DocumentError::EmptyLocatorList)),
            Err(e) => Err(self.abort_with(DocumentError::GrammarLoad(e))),
        }
    }

    /// End of document. Hands back the validator, if one was installed.
    pub fn finish(mut self) -> Option<CombinedValidator> {
        let pending = self.txn.buffer.discard();
        if pending > 0 {
            tracing::debug!(
                document = %self.txn.id(),
                discarded = pending,
                "document ended before resolution"
            );
        }
        self.txn.resolved.take()
    }

    /// Whether a validator has been installed.
    pub fn is_resolved(&self) -> bool {
        self.txn.is_resolved()
    }

    /// Whether the document was aborted.
    pub fn is_aborted(&self) -> bool {
        self.txn.is_aborted()
    }

    /// Preset the validator came from.
    pub fn resolved_preset(&self) -> Option<TypeId> {
        self.txn.preset()
    }

    /// Locators of the installed validator in delivery order.
    pub fn active_locators(&self) -> Option<Vec<&str>> {
        self.txn.resolved().map(CombinedValidator::locators)
    }

    /// Identifier of this document in log records.
    pub fn document_id(&self) -> Uuid {
        self.txn.id()
    }

    /// Read-only view of the transaction.
    pub fn transaction(&self) -> &Transaction {
        &self.txn
    }

    fn resolve_preset(&mut self, type_id: TypeId) -> Result<(), Interrupt> {
        let presets = Arc::clone(&self.resolver.presets);
        let preset = match presets.require(type_id) {
            Ok(preset) => preset,
            Err(fault) => return Err(self.fault(fault)),
        };
        match self.assemble(&preset.locator_list()) {
            Ok(Some(combined)) => {
                self.install(combined, Some(type_id));
                Ok(())
            }
            Ok(None) => Err(self.fault(ConfigurationFault::EmptyPreset(type_id))),
            Err(source) => Err(self.fault(ConfigurationFault::PresetGrammar { type_id, source })),
        }
    }

    fn assemble(&mut self, locators: &str) -> Result<Option<CombinedValidator>, GrammarLoadError> {
        let mut source = DocumentSource {
            txn: &mut self.txn,
            cache: self.resolver.cache.as_ref(),
            options: &self.resolver.options,
            diagnostics: self.diagnostics.as_ref(),
        };
        combine(locators, &mut source)
    }

    fn install(&mut self, mut combined: CombinedValidator, preset: Option<TypeId>) {
        let replayed = self.txn.buffer.drain_into(&mut combined);
        tracing::debug!(
            document = %self.txn.id(),
            preset = preset.map(|p| p.0),
            leaves = combined.leaf_count(),
            replayed,
            "validator installed"
        );
        self.txn.resolved = Some(combined);
        self.txn.preset = preset;
    }

    fn abort_with(&mut self, error: DocumentError) -> Interrupt {
        if let DocumentError::GrammarLoad(GrammarLoadError::CheckerAsAttributeSchema { locator }) =
            &error
        {
            let location = Location {
                system_id: Some(locator.clone()),
                ..Location::default()
            };
            self.diagnostics.error(&error.to_string(), Some(&location));
        }
        self.diagnostics.schema_error(&error);
        let discarded = self.txn.abort();
        tracing::warn!(document = %self.txn.id(), discarded, error = %error, "document aborted");
        Interrupt::Abort(error)
    }

    fn fault(&mut self, fault: ConfigurationFault) -> Interrupt {
        self.txn.abort();
        tracing::error!(document = %self.txn.id(), fault = %fault, "configuration fault");
        Interrupt::Fault(fault)
    }
}
