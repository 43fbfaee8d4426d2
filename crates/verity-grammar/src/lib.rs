//! # verity-grammar — Grammars, Caching, and Combination
//!
//! Everything between a locator string and a live validator.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): the capability boundary to the grammar engine
//!   (`GrammarEngine`, `Grammar`, `Validator`, `EventSink`) and to the
//!   transport that fetches grammar descriptions (`Transport`). Engines are
//!   external collaborators; this crate never interprets a grammar.
//!
//! - **Transport** (`transport.rs`): `LocalCatalog` maps locators onto a
//!   local directory so bundled grammars never go to the network.
//!
//! - **Cache** (`cache.rs`): `GrammarCache`, an immutable preloaded tier
//!   searched by binary search, backed by a lazily populated tier whose
//!   values are reclaimable and rebuilt on demand, one build per locator at
//!   a time.
//!
//! - **Combine** (`combine.rs`): expands aggregate tokens and folds
//!   per-locator validators into one `CombinedValidator`.
//!
//! - **Datatype** (`datatype.rs`): the URL attribute datatype whose base
//!   implementation accepts everything.
//!
//! - **Mock** (`mock.rs`, feature `mock`): instrumented engine and
//!   transport used by tests across the workspace.
//!
//! ## Crate Policy
//!
//! - Depends only on `verity-core` internally.
//! - Lock scope in the cache is per entry; no lock is held while another
//!   entry builds.

pub mod cache;
pub mod combine;
pub mod datatype;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod transport;

pub use cache::{CacheConfig, GrammarCache, GrammarCacheBuilder};
pub use combine::{
    combine, delivery_order, expand_tokens, fold_order, CombinedValidator, SharedValidator,
    ValidatorSource,
};
pub use datatype::{InvalidValue, IriRef, UrlDatatype};
pub use traits::{
    EventSink, Grammar, GrammarEngine, GrammarError, GrammarOptions, ReaderKind, Transport,
    TransportError, TypedInput, Validator,
};
pub use transport::LocalCatalog;
