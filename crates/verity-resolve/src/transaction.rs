//! # Validation Transaction
//!
//! State scoped to one document: the write-once resolved validator, the
//! preset it came from, the event buffer used until then, and the memo of
//! validators instantiated for this document. Dropped when the document
//! ends; nothing here outlives it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;
use verity_core::{GrammarLoadError, TypeId};
use verity_grammar::{CombinedValidator, GrammarCache, GrammarOptions, SharedValidator};

use crate::bridge::EventBuffer;

/// Per-document resolution state.
pub struct Transaction {
    id: Uuid,
    pub(crate) resolved: Option<CombinedValidator>,
    pub(crate) preset: Option<TypeId>,
    pub(crate) root_namespace_seen: bool,
    declared_content_type: Option<String>,
    pub(crate) buffer: EventBuffer,
    loaded: HashMap<String, SharedValidator>,
    pub(crate) aborted: bool,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("resolved", &self.resolved)
            .field("preset", &self.preset)
            .field("root_namespace_seen", &self.root_namespace_seen)
            .field("buffered", &self.buffer.len())
            .field("loaded", &self.loaded.len())
            .field("aborted", &self.aborted)
            .finish()
    }
}

impl Transaction {
    /// Fresh state for a document declared as `content_type`.
    pub fn new(content_type: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resolved: None,
            preset: None,
            root_namespace_seen: false,
            declared_content_type: content_type,
            buffer: EventBuffer::new(),
            loaded: HashMap::new(),
            aborted: false,
        }
    }

    /// Identifier used to correlate log records for this document.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the validator has been set.
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// The resolved validator, if any.
    pub fn resolved(&self) -> Option<&CombinedValidator> {
        self.resolved.as_ref()
    }

    /// Preset the validator came from; `None` for explicit locators.
    pub fn preset(&self) -> Option<TypeId> {
        self.preset
    }

    /// Declared media type, if any.
    pub fn declared_content_type(&self) -> Option<&str> {
        self.declared_content_type.as_deref()
    }

    /// Whether the root element has been seen.
    pub fn root_namespace_seen(&self) -> bool {
        self.root_namespace_seen
    }

    /// Whether the document was aborted.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Events buffered while unresolved.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of distinct validators instantiated for this document.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// The validator for `locator`, instantiated at most once per document.
    pub(crate) fn validator_for(
        &mut self,
        cache: &GrammarCache,
        locator: &str,
        options: &GrammarOptions,
    ) -> Result<SharedValidator, GrammarLoadError> {
        if let Some(existing) = self.loaded.get(locator) {
            return Ok(Arc::clone(existing));
        }
        let validator = self.fresh_validator_for(cache, locator, options)?;
        self.loaded
            .insert(locator.to_string(), Arc::clone(&validator));
        Ok(validator)
    }

    /// A validator for `locator` outside the memo, for a locator that
    /// appears more than once in one list.
    pub(crate) fn fresh_validator_for(
        &self,
        cache: &GrammarCache,
        locator: &str,
        options: &GrammarOptions,
    ) -> Result<SharedValidator, GrammarLoadError> {
        let grammar = cache.resolve(locator, options)?;
        Ok(Arc::new(Mutex::new(grammar.instantiate(options))))
    }

    pub(crate) fn abort(&mut self) -> usize {
        self.aborted = true;
        self.buffer.discard()
    }
}
