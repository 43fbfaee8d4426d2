//! # verity-core — Foundational Types for verity
//!
//! Leaf crate of the workspace. Defines the vocabulary every other crate
//! speaks: the structural [`Event`] stream a tokenizer produces, source
//! [`Location`]s, the [`Diagnostics`] contract through which notes, warnings
//! and errors leave the system, the immutable [`PresetTable`], and the error
//! taxonomy that separates document-scoped failures from deployment faults.
//!
//! ## Error Split
//!
//! - [`ConfigurationFault`] — the preset table or a bundled grammar is broken.
//!   Unrecoverable for the service instance; never degraded silently.
//! - [`DocumentError`] — one document cannot be validated (unknown root
//!   namespace, grammar that failed to load). Reported through
//!   [`Diagnostics::schema_error`]; the process keeps serving other documents.
//! - [`Interrupt`] — what the resolution controller hands back to the event
//!   producer: abort this document, or fault the service.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `verity-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod diagnostics;
pub mod error;
pub mod event;
pub mod preset;

pub use diagnostics::{Diagnostic, DiagnosticLog, Diagnostics, TracingDiagnostics};
pub use error::{ConfigurationFault, DocumentError, GrammarLoadError, Interrupt};
pub use event::{Attribute, Event, Location};
pub use preset::{PresetEntry, PresetRow, PresetTable, TypeId};
