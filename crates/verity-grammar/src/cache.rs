//! # Grammar Cache
//!
//! Process-wide cache of parsed grammars, shared by every document being
//! validated.
//!
//! ## Tiers
//!
//! - **Preloaded**: built at startup from the preset table plus any
//!   programmatic checkers, sorted by locator and searched by binary
//!   search. Immutable for the life of the process; a hit returns the same
//!   `Arc` every time.
//! - **Lazy**: one entry per locator and option set requested at run time.
//!   The key is the recipe to rebuild its grammar; the entry holds a weak
//!   reference to the last build. Callers asking with different options never
//!   share a build. Strong references live in a bounded LRU hot set; once a grammar
//!   falls out of the hot set and no document holds it, the next request
//!   rebuilds it from the recipe.
//!
//! ## Locking
//!
//! Each lazy entry has its own mutex, held for the duration of a build, so
//! concurrent requests for one key wait for a single parse while other keys
//! build in parallel. The entry map and the hot set are locked only
//! for lookups. Lock order is entry, then hot set. A failed build leaves the
//! entry empty and the next request retries.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use verity_core::{ConfigurationFault, GrammarLoadError, PresetTable};

use crate::combine::expand_tokens;
use crate::traits::{Grammar, GrammarEngine, GrammarOptions, ReaderKind, Transport};

/// Tuning for the lazy tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of lazily built grammars kept strongly reachable.
    pub hot_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { hot_capacity: 64 }
    }
}

struct PreloadedGrammar {
    locator: String,
    grammar: Arc<dyn Grammar>,
}

/// Locator plus the options it is parsed with.
type LazyKey = (String, GrammarOptions);

/// Reclaimable value for one lazily built key.
#[derive(Default)]
struct LazyEntry {
    slot: Mutex<Option<Weak<dyn Grammar>>>,
}

/// Two-tier grammar cache. See the module docs.
pub struct GrammarCache {
    preloaded: Box<[PreloadedGrammar]>,
    lazy: Mutex<HashMap<LazyKey, Arc<LazyEntry>>>,
    hot: Mutex<LruCache<LazyKey, Arc<dyn Grammar>>>,
    transport: Arc<dyn Transport>,
    engine: Arc<dyn GrammarEngine>,
}

impl fmt::Debug for GrammarCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammarCache")
            .field("preloaded", &self.preloaded_count())
            .field("lazy_entries", &self.lazy.lock().len())
            .field("retained", &self.retained_count())
            .finish()
    }
}

impl GrammarCache {
    /// Start building a cache that fetches through `transport` and parses
    /// with `engine`.
    pub fn builder(
        transport: Arc<dyn Transport>,
        engine: Arc<dyn GrammarEngine>,
    ) -> GrammarCacheBuilder {
        GrammarCacheBuilder {
            transport,
            engine,
            options: GrammarOptions::default(),
            config: CacheConfig::default(),
            registered: Vec::new(),
            to_preload: Vec::new(),
        }
    }

    /// The grammar for `locator`.
    ///
    /// Preloaded grammars are returned as-is unless `options` asks for
    /// attribute-owner position: a checker is then refused, and a schema
    /// grammar is resolved dynamically instead.
    pub fn resolve(
        &self,
        locator: &str,
        options: &GrammarOptions,
    ) -> Result<Arc<dyn Grammar>, GrammarLoadError> {
        if let Some(hit) = self.preloaded_hit(locator) {
            if !options.attribute_owner {
                return Ok(Arc::clone(&hit.grammar));
            }
            if hit.grammar.is_checker() {
                return Err(GrammarLoadError::CheckerAsAttributeSchema {
                    locator: locator.to_string(),
                });
            }
            tracing::debug!(locator, "preloaded grammar requested as attribute owner");
        }
        self.resolve_lazy(locator, options)
    }

    /// Whether `locator` is in the preloaded tier.
    pub fn is_preloaded(&self, locator: &str) -> bool {
        self.preloaded_hit(locator).is_some()
    }

    /// Number of preloaded grammars.
    pub fn preloaded_count(&self) -> usize {
        self.preloaded.len()
    }

    /// Preloaded locators in sorted order.
    pub fn preloaded_locators(&self) -> impl Iterator<Item = &str> {
        self.preloaded.iter().map(|p| p.locator.as_str())
    }

    /// Number of lazily built grammars currently held strongly by the cache.
    pub fn retained_count(&self) -> usize {
        self.hot.lock().len()
    }

    /// Drop every strong reference the lazy tier holds, as memory pressure
    /// would. Grammars still held by live documents survive; the rest are
    /// rebuilt on next request.
    pub fn reclaim(&self) {
        let mut hot = self.hot.lock();
        tracing::debug!(released = hot.len(), "reclaiming lazily built grammars");
        hot.clear();
    }

    fn preloaded_hit(&self, locator: &str) -> Option<&PreloadedGrammar> {
        self.preloaded
            .binary_search_by(|p| p.locator.as_str().cmp(locator))
            .ok()
            .map(|i| &self.preloaded[i])
    }

    fn resolve_lazy(
        &self,
        locator: &str,
        options: &GrammarOptions,
    ) -> Result<Arc<dyn Grammar>, GrammarLoadError> {
        let key: LazyKey = (locator.to_string(), options.clone());
        let entry = Arc::clone(self.lazy.lock().entry(key.clone()).or_default());

        let mut slot = entry.slot.lock();
        if let Some(grammar) = slot.as_ref().and_then(Weak::upgrade) {
            tracing::trace!(locator, "using cached grammar");
            self.retain(key, &grammar);
            return Ok(grammar);
        }

        tracing::info!(
            locator,
            attribute_owner = options.attribute_owner,
            "building non-preloaded grammar"
        );
        let grammar = build_grammar(
            locator,
            options,
            self.transport.as_ref(),
            self.engine.as_ref(),
        )?;
        *slot = Some(Arc::downgrade(&grammar));
        self.retain(key, &grammar);
        Ok(grammar)
    }

    fn retain(&self, key: LazyKey, grammar: &Arc<dyn Grammar>) {
        self.hot.lock().put(key, Arc::clone(grammar));
    }
}

/// Fetch and parse one locator.
fn build_grammar(
    locator: &str,
    options: &GrammarOptions,
    transport: &dyn Transport,
    engine: &dyn GrammarEngine,
) -> Result<Arc<dyn Grammar>, GrammarLoadError> {
    let started = Instant::now();

    let input = transport
        .fetch(locator)
        .map_err(|e| GrammarLoadError::Transport {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

    let reader = ReaderKind::for_media_type(input.media_type.as_deref());
    tracing::debug!(locator, ?reader, "selected grammar reader");

    let grammar = engine
        .parse(&input, reader, options)
        .map_err(|e| GrammarLoadError::Parse {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

    tracing::debug!(
        locator,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "grammar created"
    );
    Ok(grammar)
}

/// Startup assembly of a [`GrammarCache`].
pub struct GrammarCacheBuilder {
    transport: Arc<dyn Transport>,
    engine: Arc<dyn GrammarEngine>,
    options: GrammarOptions,
    config: CacheConfig,
    registered: Vec<(String, Arc<dyn Grammar>)>,
    to_preload: Vec<String>,
}

impl GrammarCacheBuilder {
    /// Options used for preloading.
    pub fn options(mut self, options: GrammarOptions) -> Self {
        self.options = options;
        self
    }

    /// Lazy-tier tuning.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an already-built grammar, such as a programmatic checker, to the
    /// preloaded tier. The first registration of a locator wins.
    pub fn register(mut self, locator: impl Into<String>, grammar: Arc<dyn Grammar>) -> Self {
        self.registered.push((locator.into(), grammar));
        self
    }

    /// Fetch and parse `locator` into the preloaded tier at build time.
    pub fn preload(mut self, locator: impl Into<String>) -> Self {
        self.to_preload.push(locator.into());
        self
    }

    /// Preload every concrete locator any preset names, aggregates expanded.
    /// Locators already registered are not parsed.
    pub fn preload_presets(mut self, presets: &PresetTable) -> Self {
        for preset in presets.entries() {
            let list = preset.locator_list();
            self.to_preload
                .extend(expand_tokens(&list).into_iter().map(str::to_string));
        }
        self
    }

    /// Build the cache. Any preload failure is a deployment fault.
    pub fn build(self) -> Result<GrammarCache, ConfigurationFault> {
        let mut tier: BTreeMap<String, Arc<dyn Grammar>> = BTreeMap::new();

        for (locator, grammar) in self.registered {
            tier.entry(locator).or_insert(grammar);
        }

        for locator in self.to_preload {
            if tier.contains_key(&locator) {
                continue;
            }
            let grammar = build_grammar(
                &locator,
                &self.options,
                self.transport.as_ref(),
                self.engine.as_ref(),
            )
            .map_err(|source| ConfigurationFault::Preload {
                locator: locator.clone(),
                source,
            })?;
            tier.insert(locator, grammar);
        }

        let preloaded: Box<[PreloadedGrammar]> = tier
            .into_iter()
            .map(|(locator, grammar)| PreloadedGrammar { locator, grammar })
            .collect();

        tracing::info!(preloaded = preloaded.len(), "grammar cache ready");

        let capacity = NonZeroUsize::new(self.config.hot_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(GrammarCache {
            preloaded,
            lazy: Mutex::new(HashMap::new()),
            hot: Mutex::new(LruCache::new(capacity)),
            transport: self.transport,
            engine: self.engine,
        })
    }
}
