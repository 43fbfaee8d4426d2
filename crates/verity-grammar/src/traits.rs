//! # Grammar Engine Contract
//!
//! The compile-time contract between verity and whatever engine actually
//! matches event streams against grammars. Real and mock engines are
//! interchangeable behind these traits.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use verity_core::Event;

/// Media type that selects the compact-syntax reader.
pub const COMPACT_SYNTAX_MEDIA_TYPE: &str = "application/relax-ng-compact-syntax";

/// Options passed to the engine when parsing and instantiating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GrammarOptions {
    /// The grammar is wanted in attribute-owner position (attribute
    /// sections wrapped into a host grammar). Non-schema checkers cannot
    /// serve there.
    pub attribute_owner: bool,
    /// Engine-specific properties, passed through untouched.
    pub properties: BTreeMap<String, String>,
}

impl GrammarOptions {
    /// Options for attribute-owner position.
    pub fn attribute_owner() -> Self {
        Self {
            attribute_owner: true,
            ..Self::default()
        }
    }

    /// Add an engine property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Grammar description fetched by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedInput {
    /// Locator the input was fetched for.
    pub locator: String,
    /// Declared media type, if the transport knows it.
    pub media_type: Option<String>,
    /// Raw description.
    pub bytes: Vec<u8>,
}

/// Which reader the engine should use for an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderKind {
    /// Compact-syntax reader.
    Compact,
    /// Reader that detects the grammar language from the input.
    Auto,
}

impl ReaderKind {
    /// Compact reader for [`COMPACT_SYNTAX_MEDIA_TYPE`], auto-detection otherwise.
    pub fn for_media_type(media_type: Option<&str>) -> Self {
        match media_type {
            Some(COMPACT_SYNTAX_MEDIA_TYPE) => Self::Compact,
            _ => Self::Auto,
        }
    }
}

/// Receiver of structural events.
pub trait EventSink {
    /// Accept one event. Violations are reported by the implementation
    /// through its own diagnostics channel, not returned.
    fn event(&mut self, event: &Event);
}

/// A live, stateful matcher bound to one grammar.
pub trait Validator: Send {
    /// The sink events must be delivered to.
    fn sink(&mut self) -> &mut dyn EventSink;
}

/// A parsed, executable grammar. Immutable and shareable.
pub trait Grammar: Send + Sync {
    /// Create a fresh validator.
    fn instantiate(&self, options: &GrammarOptions) -> Box<dyn Validator>;

    /// `true` for non-schema checkers (programmatic checks registered under a
    /// locator rather than parsed from a grammar description).
    fn is_checker(&self) -> bool {
        false
    }
}

/// Parses grammar descriptions.
pub trait GrammarEngine: Send + Sync {
    /// Parse `input` with the given reader.
    fn parse(
        &self,
        input: &TypedInput,
        reader: ReaderKind,
        options: &GrammarOptions,
    ) -> Result<Arc<dyn Grammar>, GrammarError>;
}

/// Fetches grammar descriptions by locator.
pub trait Transport: Send + Sync {
    /// Fetch the description for `locator`.
    fn fetch(&self, locator: &str) -> Result<TypedInput, TransportError>;
}

/// The engine rejected a grammar description.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GrammarError {
    /// Engine message.
    pub message: String,
}

impl GrammarError {
    /// Wrap an engine message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A transport could not produce an input.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Nothing is known under this locator.
    #[error("no resource for locator '{0}'")]
    NotFound(String),

    /// The locator's form is not handled by this transport.
    #[error("unsupported locator '{0}'")]
    Unsupported(String),

    /// Reading the backing resource failed.
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// Backing path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_selection_by_media_type() {
        assert_eq!(
            ReaderKind::for_media_type(Some(COMPACT_SYNTAX_MEDIA_TYPE)),
            ReaderKind::Compact
        );
        assert_eq!(ReaderKind::for_media_type(Some("application/xml")), ReaderKind::Auto);
        assert_eq!(ReaderKind::for_media_type(None), ReaderKind::Auto);
    }

    #[test]
    fn options_builder() {
        let opts = GrammarOptions::attribute_owner().with_property("check-id-idref", "false");
        assert!(opts.attribute_owner);
        assert_eq!(opts.properties.get("check-id-idref").map(String::as_str), Some("false"));
        assert!(!GrammarOptions::default().attribute_owner);
    }
}
