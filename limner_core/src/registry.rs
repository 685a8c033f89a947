// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The identity-keyed cache registry.
//!
//! A [`CacheRegistry`] maps each style node (by `Arc` pointer identity) to
//! its cache and builds every cache at most once, even when many threads ask
//! for the same node at the same time.
//!
//! ## Concurrency
//!
//! Lookups go through a sharded [`DashMap`]. The map only ever stores a
//! slot holding the keyed `Arc` and a [`OnceLock`]; the slot is cloned out
//! of the shard before building, so a build never runs under a shard lock.
//! Concurrent callers for the same key block on that key's `OnceLock` only.
//! Builds may recurse into the registry (a raster outline asks for its own
//! symbolizer cache) without deadlocking.
//!
//! Retaining the keyed `Arc` in the slot keeps the pointer alive, so a key
//! can never be recycled by a different node while its entry exists.

use core::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;

use crate::cache::{AttributeSetBuilder, CacheContext, RequiredAttributes, StyleCache};
use crate::error::CacheError;
use crate::portray::{self, SymbolizerRenderer};
use crate::rule::RuleCache;
use crate::style::{Rule, Symbolizer, SymbolizerKind};
use crate::symbolizer::SymbolizerCache;

/// Builds the cache for one symbolizer.
///
/// Factories receive the registry so nested symbolizers can be resolved
/// through it.
pub type SymbolizerFactory =
    Arc<dyn Fn(&Arc<Symbolizer>, &CacheRegistry) -> Result<SymbolizerCache, CacheError> + Send + Sync>;

/// Returns the built-in factory for `kind`.
///
/// It rejects symbolizers of another kind with
/// [`CacheError::KindMismatch`].
#[must_use]
pub fn default_factory(kind: SymbolizerKind) -> SymbolizerFactory {
    Arc::new(move |symbolizer: &Arc<Symbolizer>, registry: &CacheRegistry| {
        let found = symbolizer.kind();
        if found != kind {
            return Err(CacheError::KindMismatch {
                expected: kind,
                found,
            });
        }
        SymbolizerCache::build(symbolizer, registry)
    })
}

struct Slot<K, V> {
    key: Arc<K>,
    value: OnceLock<V>,
}

impl<K, V> Slot<K, V> {
    fn new(key: Arc<K>) -> Self {
        Self {
            key,
            value: OnceLock::new(),
        }
    }
}

type SymbolizerSlot = Slot<Symbolizer, Result<SymbolizerCache, CacheError>>;
type RuleSlot = Slot<Rule, Arc<RuleCache>>;

fn key_of<T>(node: &Arc<T>) -> usize {
    Arc::as_ptr(node).addr()
}

/// Identity-keyed registry of symbolizer and rule caches.
pub struct CacheRegistry {
    context: Arc<CacheContext>,
    symbolizers: DashMap<usize, Arc<SymbolizerSlot>, FxBuildHasher>,
    rules: DashMap<usize, Arc<RuleSlot>, FxBuildHasher>,
    factories: RwLock<[SymbolizerFactory; 5]>,
    handlers: RwLock<[Option<Arc<dyn SymbolizerRenderer>>; 5]>,
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let registered: Vec<SymbolizerKind> = SymbolizerKind::ALL
            .into_iter()
            .filter(|k| handlers[k.index()].is_some())
            .collect();
        f.debug_struct("CacheRegistry")
            .field("context", &self.context)
            .field("symbolizers", &self.symbolizers.len())
            .field("rules", &self.rules.len())
            .field("handlers", &registered)
            .finish_non_exhaustive()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new(CacheContext::default())
    }
}

impl CacheRegistry {
    /// Creates an empty registry with the built-in factories and default
    /// renderers.
    #[must_use]
    pub fn new(context: CacheContext) -> Self {
        Self {
            context: Arc::new(context),
            symbolizers: DashMap::with_hasher(FxBuildHasher),
            rules: DashMap::with_hasher(FxBuildHasher),
            factories: RwLock::new(SymbolizerKind::ALL.map(default_factory)),
            handlers: RwLock::new(portray::default_renderers().map(Some)),
        }
    }

    /// Returns the context every cache built here shares.
    #[must_use]
    pub fn context(&self) -> &Arc<CacheContext> {
        &self.context
    }

    /// Returns the cache for `symbolizer`, building it on first request.
    ///
    /// A failed build is memoized too: every caller for the same node sees
    /// the same error.
    ///
    /// # Errors
    ///
    /// Whatever the kind's factory reported.
    pub fn get_symbolizer(&self, symbolizer: &Arc<Symbolizer>) -> Result<SymbolizerCache, CacheError> {
        let slot = self
            .symbolizers
            .entry(key_of(symbolizer))
            .or_insert_with(|| Arc::new(Slot::new(symbolizer.clone())))
            .clone();
        slot.value
            .get_or_init(|| {
                let factory = self.factories.read()[slot.key.kind().index()].clone();
                let result = factory(&slot.key, self);
                if let Err(err) = &result {
                    tracing::debug!(kind = ?slot.key.kind(), %err, "symbolizer cache build failed");
                }
                result
            })
            .clone()
    }

    /// Returns the cache for `rule`, building it on first request.
    #[must_use]
    pub fn get_rule(&self, rule: &Arc<Rule>) -> Arc<RuleCache> {
        let slot = self
            .rules
            .entry(key_of(rule))
            .or_insert_with(|| Arc::new(Slot::new(rule.clone())))
            .clone();
        slot.value
            .get_or_init(|| Arc::new(RuleCache::new(slot.key.clone(), self)))
            .clone()
    }

    /// Replaces the factory for `kind`. Caches already built are kept.
    pub fn set_factory(&self, kind: SymbolizerKind, factory: SymbolizerFactory) {
        self.factories.write()[kind.index()] = factory;
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        tracing::debug!(
            symbolizers = self.symbolizers.len(),
            rules = self.rules.len(),
            "clearing cache registry"
        );
        self.symbolizers.clear();
        self.rules.clear();
    }

    /// Returns the renderer registered for `kind`.
    #[must_use]
    pub fn find_handler(&self, kind: SymbolizerKind) -> Option<Arc<dyn SymbolizerRenderer>> {
        self.handlers.read()[kind.index()].clone()
    }

    /// Registers `renderer` for its kind, returning the one it replaces.
    pub fn register_handler(
        &self,
        renderer: Arc<dyn SymbolizerRenderer>,
    ) -> Option<Arc<dyn SymbolizerRenderer>> {
        let kind = renderer.kind();
        self.handlers.write()[kind.index()].replace(renderer)
    }

    /// Removes the renderer for `kind`, returning it.
    pub fn remove_handler(&self, kind: SymbolizerKind) -> Option<Arc<dyn SymbolizerRenderer>> {
        self.handlers.write()[kind.index()].take()
    }

    /// Returns the union of the attributes every rule in `rules` reads.
    #[must_use]
    pub fn required_attributes(&self, rules: &[Arc<Rule>]) -> RequiredAttributes {
        let mut out = AttributeSetBuilder::new();
        for rule in rules {
            out.extend(self.get_rule(rule).required_attributes());
        }
        out.freeze()
    }

    /// Returns the number of cached symbolizer entries.
    #[must_use]
    pub fn symbolizer_count(&self) -> usize {
        self.symbolizers.len()
    }

    /// Returns the number of cached rule entries.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
