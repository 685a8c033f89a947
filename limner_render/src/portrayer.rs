// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule selection and symbolizer dispatch for one feature.

use std::sync::Arc;

use limner_core::cache::StyleCache;
use limner_core::expr::Feature;
use limner_core::portray::Canvas;
use limner_core::registry::CacheRegistry;
use limner_core::rule::RuleCache;
use limner_core::style::Rule;

use crate::DamageRegion;

/// Portrays features with the caches of one registry.
///
/// For each feature, the regular rules whose scale range contains the scale
/// denominator and whose filter accepts the feature are painted in order.
/// Else rules are painted only when no regular rule accepted the feature.
#[derive(Clone, Debug)]
pub struct Portrayer {
    registry: Arc<CacheRegistry>,
}

impl Portrayer {
    /// Creates a portrayer.
    #[must_use]
    pub fn new(registry: Arc<CacheRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Paints `feature` with `rules` onto `canvas`.
    ///
    /// Returns the damaged region: the feature's bounding box grown by the
    /// largest margin among the symbolizers that painted, or
    /// [`DamageRegion::None`] when nothing did.
    pub fn portray(
        &self,
        rules: &[Arc<Rule>],
        feature: &dyn Feature,
        scale_denominator: f64,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) -> DamageRegion {
        let caches: Vec<Arc<RuleCache>> = rules
            .iter()
            .map(|rule| self.registry.get_rule(rule))
            .filter(|cache| cache.is_in_scale(scale_denominator))
            .collect();

        let mut margin = None;
        let mut matched = false;
        for cache in caches.iter().filter(|c| !c.is_else()) {
            if cache.matches(feature) {
                matched = true;
                self.paint_rule(cache, feature, coefficient, canvas, &mut margin);
            }
        }
        if !matched {
            for cache in caches.iter().filter(|c| c.is_else()) {
                if cache.matches(feature) {
                    self.paint_rule(cache, feature, coefficient, canvas, &mut margin);
                }
            }
        }

        match (margin, feature.geometry()) {
            (Some(margin), Some(geometry)) => {
                DamageRegion::inflated(geometry.bounding_box(), margin)
            }
            _ => DamageRegion::None,
        }
    }

    fn paint_rule(
        &self,
        cache: &RuleCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
        margin: &mut Option<f64>,
    ) {
        if !cache.is_visible(feature) {
            return;
        }
        for symbolizer in cache.symbolizers() {
            if !symbolizer.is_visible(feature) {
                continue;
            }
            let Some(renderer) = self.registry.find_handler(symbolizer.kind()) else {
                tracing::trace!(kind = ?symbolizer.kind(), "no renderer registered");
                continue;
            };
            renderer.portray(symbolizer, feature, coefficient, canvas);
            let m = symbolizer.margin(Some(feature), coefficient);
            *margin = Some(margin.map_or(m, |current| current.max(m)));
        }
    }
}
