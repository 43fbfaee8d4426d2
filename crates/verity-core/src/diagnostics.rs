//! # Diagnostics Contract
//!
//! How notes, warnings and errors leave the resolution core. Rendering is a
//! collaborator's job; this module only fixes the four channels and ships
//! two sinks: [`DiagnosticLog`], which collects everything for later
//! inspection or serialization, and [`TracingDiagnostics`], which forwards
//! to `tracing`.

use std::error::Error;

use parking_lot::Mutex;
use serde::Serialize;

use crate::event::Location;

/// Receiver of user-facing diagnostics for one document.
///
/// Methods take `&self`; implementations use interior mutability so a sink
/// can be shared between the controller and the validators it assembles.
pub trait Diagnostics: Send + Sync {
    /// Informational note.
    fn info(&self, message: &str);

    /// Non-fatal problem with the document.
    fn warning(&self, message: &str, location: Option<&Location>);

    /// Error in the document.
    fn error(&self, message: &str, location: Option<&Location>);

    /// The document's schema could not be determined or loaded.
    fn schema_error(&self, cause: &(dyn Error + 'static));

    /// Called when a full HTML grammar is instantiated, so that messages can
    /// carry references into the HTML specification.
    fn html_spec_in_use(&self) {}
}

/// One collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Informational note.
    Info {
        /// Text.
        message: String,
    },
    /// Warning.
    Warning {
        /// Text.
        message: String,
        /// Where, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
    },
    /// Error.
    Error {
        /// Text.
        message: String,
        /// Where, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<Location>,
    },
    /// Schema error.
    SchemaError {
        /// Rendered cause chain.
        message: String,
    },
}

impl Diagnostic {
    /// The message text regardless of kind.
    pub fn message(&self) -> &str {
        match self {
            Self::Info { message }
            | Self::Warning { message, .. }
            | Self::Error { message, .. }
            | Self::SchemaError { message } => message,
        }
    }
}

/// Collecting diagnostics sink.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Mutex<Vec<Diagnostic>>,
    html_spec: Mutex<bool>,
}

impl DiagnosticLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything collected so far, in arrival order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Informational notes only.
    pub fn infos(&self) -> Vec<String> {
        self.collect(|d| matches!(d, Diagnostic::Info { .. }))
    }

    /// Warnings only.
    pub fn warnings(&self) -> Vec<String> {
        self.collect(|d| matches!(d, Diagnostic::Warning { .. }))
    }

    /// Errors only.
    pub fn errors(&self) -> Vec<String> {
        self.collect(|d| matches!(d, Diagnostic::Error { .. }))
    }

    /// Schema errors only.
    pub fn schema_errors(&self) -> Vec<String> {
        self.collect(|d| matches!(d, Diagnostic::SchemaError { .. }))
    }

    /// Whether [`Diagnostics::html_spec_in_use`] was signalled.
    pub fn html_spec_requested(&self) -> bool {
        *self.html_spec.lock()
    }

    fn collect(&self, keep: impl Fn(&Diagnostic) -> bool) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|d| keep(d))
            .map(|d| d.message().to_string())
            .collect()
    }

    fn push(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

impl Diagnostics for DiagnosticLog {
    fn info(&self, message: &str) {
        self.push(Diagnostic::Info {
            message: message.to_string(),
        });
    }

    fn warning(&self, message: &str, location: Option<&Location>) {
        self.push(Diagnostic::Warning {
            message: message.to_string(),
            location: location.cloned(),
        });
    }

    fn error(&self, message: &str, location: Option<&Location>) {
        self.push(Diagnostic::Error {
            message: message.to_string(),
            location: location.cloned(),
        });
    }

    fn schema_error(&self, cause: &(dyn Error + 'static)) {
        self.push(Diagnostic::SchemaError {
            message: render_chain(cause),
        });
    }

    fn html_spec_in_use(&self) {
        *self.html_spec.lock() = true;
    }
}

/// Diagnostics sink that writes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str, location: Option<&Location>) {
        match location {
            Some(loc) => tracing::warn!(location = %loc, "{message}"),
            None => tracing::warn!("{message}"),
        }
    }

    fn error(&self, message: &str, location: Option<&Location>) {
        match location {
            Some(loc) => tracing::error!(location = %loc, "{message}"),
            None => tracing::error!("{message}"),
        }
    }

    fn schema_error(&self, cause: &(dyn Error + 'static)) {
        tracing::error!(schema_error = true, "{}", render_chain(cause));
    }
}

/// `outer: inner: innermost`, skipping causes whose text repeats the parent.
fn render_chain(cause: &(dyn Error + 'static)) -> String {
    let mut rendered = cause.to_string();
    let mut current = cause.source();
    while let Some(inner) = current {
        let text = inner.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        current = inner.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationFault, GrammarLoadError};

    #[test]
    fn log_separates_channels() {
        let log = DiagnosticLog::new();
        log.info("note");
        log.warning("careful", Some(&Location::at(1, 1)));
        log.error("broken", None);

        assert_eq!(log.infos(), vec!["note"]);
        assert_eq!(log.warnings(), vec!["careful"]);
        assert_eq!(log.errors(), vec!["broken"]);
        assert!(log.schema_errors().is_empty());
        assert_eq!(log.entries().len(), 3);
    }

    #[test]
    fn schema_error_renders_cause_chain() {
        let log = DiagnosticLog::new();
        let fault = ConfigurationFault::Preload {
            locator: "a".to_string(),
            source: GrammarLoadError::Parse {
                locator: "a".to_string(),
                reason: "bad".to_string(),
            },
        };
        log.schema_error(&fault);
        assert_eq!(
            log.schema_errors(),
            vec!["failed to preload grammar 'a': cannot parse grammar 'a': bad"]
        );
    }

    #[test]
    fn html_spec_flag() {
        let log = DiagnosticLog::new();
        assert!(!log.html_spec_requested());
        log.html_spec_in_use();
        assert!(log.html_spec_requested());
    }

    #[test]
    fn diagnostic_serializes_with_type_tag() {
        let d = Diagnostic::Warning {
            message: "m".to_string(),
            location: None,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "warning");
        assert!(json.get("location").is_none());
    }
}
