//! # verity-resolve — Per-Document Schema Resolution
//!
//! Chooses the validator for each document and feeds it the event stream.
//!
//! ## Architecture
//!
//! - **Resolver** (`controller.rs`): process-wide context, the shared
//!   [`PresetTable`](verity_core::PresetTable) and
//!   [`GrammarCache`](verity_grammar::GrammarCache). Validated once at
//!   startup; hands out one [`ResolutionController`] per document.
//!
//! - **Controller** (`controller.rs`): the write-once resolution state
//!   machine. Driven by explicit locators, the DOCTYPE, or the root
//!   namespace, whichever comes first.
//!
//! - **Transaction** (`transaction.rs`): everything scoped to one document,
//!   including the memo of instantiated validators.
//!
//! - **Bridge** (`bridge.rs`): buffers events until a validator exists.
//!
//! - **Doctype** (`doctype.rs`): legacy public identifiers to presets.
//!
//! - **Consistency** (`consistency.rs`): declared media type against root
//!   namespace.
//!
//! ## Crate Policy
//!
//! - A controller is owned by one document at a time; it is `Send` but not
//!   shared.
//! - Document failures never escape as panics; they come back as
//!   [`Interrupt`](verity_core::Interrupt).

pub mod bridge;
pub mod consistency;
pub mod controller;
pub mod doctype;
pub mod transaction;

pub use bridge::EventBuffer;
pub use controller::{ResolutionController, Resolver, HTML_SPEC_LOCATORS};
pub use doctype::{classify, DoctypeMatch, DoctypeRule, DOCTYPE_RULES};
pub use transaction::Transaction;
