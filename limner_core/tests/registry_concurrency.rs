// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concurrent access to one registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use limner_core::cache::StyleCache;
use limner_core::paint::Color;
use limner_core::registry::{CacheRegistry, default_factory};
use limner_core::style::{LineSymbolizer, Rule, Stroke, Symbolizer, SymbolizerKind};
use limner_core::symbolizer::SymbolizerCache;

const THREADS: usize = 50;

fn line() -> Arc<Symbolizer> {
    Arc::new(Symbolizer::Line(LineSymbolizer {
        stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
        perpendicular_offset: None,
    }))
}

#[test]
fn symbolizer_is_built_once_across_threads() {
    let registry = Arc::new(CacheRegistry::default());
    let builds = Arc::new(AtomicUsize::new(0));
    {
        let builds = builds.clone();
        let inner = default_factory(SymbolizerKind::Line);
        registry.set_factory(
            SymbolizerKind::Line,
            Arc::new(move |symbolizer: &Arc<Symbolizer>, registry: &CacheRegistry| {
                builds.fetch_add(1, Ordering::SeqCst);
                inner(symbolizer, registry)
            }),
        );
    }

    let node = line();
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let node = node.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let cache = registry.get_symbolizer(&node).expect("cache");
                cache.evaluate();
                cache
            })
        })
        .collect();
    let caches: Vec<SymbolizerCache> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(caches.iter().all(|c| c.ptr_eq(&caches[0])));
    assert_eq!(registry.symbolizer_count(), 1);
}

#[test]
fn rule_is_built_once_across_threads() {
    let registry = Arc::new(CacheRegistry::default());
    let rule = Arc::new(Rule::new(vec![line(), line()]));
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let rule = rule.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let cache = registry.get_rule(&rule);
                assert!(cache.is_static());
                cache
            })
        })
        .collect();
    let first = registry.get_rule(&rule);
    for handle in handles {
        assert!(Arc::ptr_eq(&first, &handle.join().expect("thread")));
    }
    assert_eq!(registry.rule_count(), 1);
    assert_eq!(registry.symbolizer_count(), 2);
}

#[test]
fn distinct_nodes_build_independently() {
    let registry = Arc::new(CacheRegistry::default());
    let nodes: Vec<_> = (0..THREADS).map(|_| line()).collect();
    thread::scope(|scope| {
        for node in &nodes {
            let registry = &registry;
            scope.spawn(move || {
                let cache = registry.get_symbolizer(node).expect("cache");
                assert_eq!(cache.kind(), SymbolizerKind::Line);
            });
        }
    });
    assert_eq!(registry.symbolizer_count(), THREADS);
    registry.clear();
    assert_eq!(registry.symbolizer_count(), 0);
}
