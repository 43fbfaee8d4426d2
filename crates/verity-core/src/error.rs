//! # Error Types — Document Failures vs. Deployment Faults
//!
//! Two families that are never unified under one mechanism:
//!
//! - Recoverable, document-scoped: [`DocumentError`] (and the
//!   [`GrammarLoadError`] it wraps). The document is aborted, the diagnostics
//!   sink is told why, and the service carries on.
//! - Unrecoverable, deployment-scoped: [`ConfigurationFault`]. The preset
//!   table or a grammar shipped with the binary is broken. Propagated unmasked
//!   to whoever owns the service instance.

use thiserror::Error;

use crate::preset::TypeId;

/// Failure to obtain a grammar for one locator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarLoadError {
    /// The transport could not produce an input for the locator.
    #[error("cannot fetch grammar '{locator}': {reason}")]
    Transport {
        /// Locator that was requested.
        locator: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The grammar engine rejected the fetched input.
    #[error("cannot parse grammar '{locator}': {reason}")]
    Parse {
        /// Locator whose input failed to parse.
        locator: String,
        /// Engine-level reason.
        reason: String,
    },

    /// A non-schema checker was requested in attribute-owner position.
    #[error("A non-schema checker cannot be used as an attribute schema.")]
    CheckerAsAttributeSchema {
        /// Locator of the checker.
        locator: String,
    },
}

impl GrammarLoadError {
    /// Locator the failure concerns.
    pub fn locator(&self) -> &str {
        match self {
            Self::Transport { locator, .. }
            | Self::Parse { locator, .. }
            | Self::CheckerAsAttributeSchema { locator } => locator,
        }
    }
}

/// A document could not be validated. Scoped to that document only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// No preset is registered for the root namespace.
    #[error("Cannot find preset schema for namespace: \u{201C}{namespace}\u{201D}.")]
    UnknownNamespace {
        /// The root namespace that was observed.
        namespace: String,
    },

    /// A dynamically requested grammar could not be loaded.
    #[error(transparent)]
    GrammarLoad(#[from] GrammarLoadError),

    /// An explicit locator list contained no locators.
    #[error("no schema locators were given")]
    EmptyLocatorList,
}

/// The deployment is broken. Not recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationFault {
    /// Two preset rows share a type id.
    #[error("duplicate preset type id {0}")]
    DuplicateTypeId(TypeId),

    /// Two preset rows claim the same namespace.
    #[error("namespace '{namespace}' is claimed by presets {first} and {second}")]
    DuplicateNamespace {
        /// The contested namespace.
        namespace: String,
        /// Type id of the first claimant.
        first: TypeId,
        /// Type id of the second claimant.
        second: TypeId,
    },

    /// A preset configuration row could not be parsed.
    #[error("malformed preset row at line {line}: {reason}")]
    MalformedPresetRow {
        /// 1-based line number in the source text.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A type id referenced by the resolution rules has no preset.
    #[error("doctype mappings not initialized properly: no preset for type id {0}")]
    MissingPreset(TypeId),

    /// A preset has no locators.
    #[error("preset {0} has an empty locator list")]
    EmptyPreset(TypeId),

    /// A grammar could not be preloaded at startup.
    #[error("failed to preload grammar '{locator}'")]
    Preload {
        /// Locator that failed.
        locator: String,
        /// Underlying failure.
        #[source]
        source: GrammarLoadError,
    },

    /// A grammar belonging to a preset failed to load while resolving a document.
    #[error("grammar for preset {type_id} failed to load")]
    PresetGrammar {
        /// Preset being resolved.
        type_id: TypeId,
        /// Underlying failure.
        #[source]
        source: GrammarLoadError,
    },
}

/// Why the resolution controller stopped the event producer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// Abort this document; the diagnostics sink has already been told.
    #[error(transparent)]
    Abort(#[from] DocumentError),

    /// The deployment is broken; stop serving.
    #[error(transparent)]
    Fault(#[from] ConfigurationFault),
}

impl Interrupt {
    /// Returns `true` for faults that must take the service instance down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}
