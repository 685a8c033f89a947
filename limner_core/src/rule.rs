// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule caches: a selection filter, a scale range and ordered symbolizer
//! caches.

use std::sync::{Arc, OnceLock};

use crate::cache::{CacheContext, CacheStatus, StatusBuilder, StyleCache, Visibility, visible_with};
use crate::error::CacheError;
use crate::expr::{Feature, Filter};
use crate::registry::CacheRegistry;
use crate::style::Rule;
use crate::symbolizer::SymbolizerCache;

/// A rule filter after static folding.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleFilter {
    /// No filter, or a static filter that accepts.
    AcceptAll,
    /// A static filter that rejects.
    RejectAll,
    /// A filter that reads the feature.
    Dynamic(Filter),
}

/// Caches a [`Rule`].
///
/// The rule is visible when any of its symbolizers is; the filter decides
/// which features the rule applies to and is not part of visibility.
#[derive(Debug)]
pub struct RuleCache {
    rule: Arc<Rule>,
    symbolizers: Vec<SymbolizerCache>,
    failures: Vec<CacheError>,
    context: Arc<CacheContext>,
    state: OnceLock<RuleState>,
}

#[derive(Debug)]
struct RuleState {
    status: CacheStatus,
    filter: RuleFilter,
}

impl RuleCache {
    /// Creates a cache, obtaining each symbolizer cache from `registry`.
    ///
    /// A symbolizer whose cache cannot be built is left out and its error
    /// kept in [`failures`](Self::failures).
    #[must_use]
    pub fn new(rule: Arc<Rule>, registry: &CacheRegistry) -> Self {
        let mut symbolizers = Vec::with_capacity(rule.symbolizers.len());
        let mut failures = Vec::new();
        for symbolizer in &rule.symbolizers {
            match registry.get_symbolizer(symbolizer) {
                Ok(cache) => symbolizers.push(cache),
                Err(err) => {
                    tracing::warn!(
                        rule = rule.name.as_deref().unwrap_or_default(),
                        kind = ?symbolizer.kind(),
                        %err,
                        "omitting symbolizer"
                    );
                    failures.push(err);
                }
            }
        }
        Self {
            rule,
            symbolizers,
            failures,
            context: registry.context().clone(),
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &RuleState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            let filter = match &self.rule.filter {
                None | Some(Filter::Include) => RuleFilter::AcceptAll,
                Some(Filter::Exclude) => RuleFilter::RejectAll,
                Some(filter) if b.filter(filter) => {
                    if oracle.evaluate_filter(filter, None) {
                        RuleFilter::AcceptAll
                    } else {
                        RuleFilter::RejectAll
                    }
                }
                Some(filter) => RuleFilter::Dynamic(filter.clone()),
            };
            let mut visibility = Visibility::Never;
            for symbolizer in &self.symbolizers {
                let status = symbolizer.status();
                b.absorb_attributes(status);
                visibility = visibility.or(status.visibility);
            }
            b.override_visibility(visibility);
            let status = b.finish();
            tracing::trace!(
                rule = self.rule.name.as_deref().unwrap_or_default(),
                ?status,
                "evaluated rule"
            );
            RuleState { status, filter }
        })
    }

    /// Returns the cached rule.
    #[must_use]
    pub fn rule(&self) -> &Arc<Rule> {
        &self.rule
    }

    /// Returns the rule's name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.rule.name.as_deref()
    }

    /// Returns the symbolizer caches in declaration order, failed ones
    /// omitted.
    #[must_use]
    pub fn symbolizers(&self) -> &[SymbolizerCache] {
        &self.symbolizers
    }

    /// Returns the construction errors of omitted symbolizers.
    #[must_use]
    pub fn failures(&self) -> &[CacheError] {
        &self.failures
    }

    /// Returns the folded filter.
    #[must_use]
    pub fn filter(&self) -> &RuleFilter {
        &self.state().filter
    }

    /// Returns `true` for an else rule.
    #[must_use]
    pub fn is_else(&self) -> bool {
        self.rule.is_else
    }

    /// Returns `true` if the rule applies to `feature`.
    #[must_use]
    pub fn matches(&self, feature: &dyn Feature) -> bool {
        match self.filter() {
            RuleFilter::AcceptAll => true,
            RuleFilter::RejectAll => false,
            RuleFilter::Dynamic(filter) => {
                self.context.oracle.evaluate_filter(filter, Some(feature))
            }
        }
    }

    /// Returns `true` if `denominator` is in `[min_scale, max_scale)`.
    #[must_use]
    pub fn is_in_scale(&self, denominator: f64) -> bool {
        denominator >= self.rule.min_scale && denominator < self.rule.max_scale
    }

    /// Returns the largest symbolizer margin.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        self.symbolizers
            .iter()
            .map(|s| s.margin(feature, coefficient))
            .fold(0.0, f64::max)
    }
}

impl StyleCache for RuleCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.symbolizers.iter().any(|s| s.is_visible(feature))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CompareOp, Expression, SimpleFeature};
    use crate::paint::Color;
    use crate::style::{
        Fill, LineSymbolizer, PolygonSymbolizer, RasterSymbolizer, Stroke, Symbolizer,
        TextSymbolizer,
    };

    fn line(width: f64) -> Arc<Symbolizer> {
        Arc::new(Symbolizer::Line(LineSymbolizer {
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, width))),
            perpendicular_offset: None,
        }))
    }

    #[test]
    fn any_visible_symbolizer_makes_the_rule_visible() {
        let invisible = Arc::new(Symbolizer::Polygon(PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::TRANSPARENT))),
            ..PolygonSymbolizer::default()
        }));
        let registry = CacheRegistry::default();
        let cache = RuleCache::new(Arc::new(Rule::new(vec![invisible.clone(), line(1.0)])), &registry);
        assert_eq!(cache.status(), &CacheStatus::ALWAYS);

        let hidden = RuleCache::new(Arc::new(Rule::new(vec![invisible])), &registry);
        assert_eq!(hidden.visibility(), Visibility::Never);

        let empty = RuleCache::new(Arc::new(Rule::default()), &registry);
        assert_eq!(empty.visibility(), Visibility::Never);
    }

    #[test]
    fn static_filters_fold() {
        let registry = CacheRegistry::default();
        let rule = |filter| Arc::new(Rule::new(vec![line(1.0)]).with_filter(filter));

        let accept = RuleCache::new(
            rule(Filter::compare(
                CompareOp::Lt,
                Expression::number(1.0),
                Expression::number(2.0),
            )),
            &registry,
        );
        assert_eq!(accept.filter(), &RuleFilter::AcceptAll);
        assert!(accept.is_static());

        let reject = RuleCache::new(rule(Filter::Exclude), &registry);
        assert_eq!(reject.filter(), &RuleFilter::RejectAll);
        assert!(!reject.matches(&SimpleFeature::new()));
        assert!(reject.is_visible(&SimpleFeature::new()));
    }

    #[test]
    fn dynamic_filter_reads_the_feature() {
        let registry = CacheRegistry::default();
        let filter = Filter::compare(
            CompareOp::Gt,
            Expression::property("pop"),
            Expression::number(1000.0),
        );
        let cache = RuleCache::new(
            Arc::new(Rule::new(vec![line(1.0)]).with_filter(filter)),
            &registry,
        );
        assert!(!cache.is_static());
        assert_eq!(cache.visibility(), Visibility::Always);
        assert_eq!(cache.required_attributes().to_vec(), ["pop"]);
        assert!(cache.matches(&SimpleFeature::new().with_attribute("pop", 5000.0)));
        assert!(!cache.matches(&SimpleFeature::new().with_attribute("pop", 10.0)));
    }

    #[test]
    fn failed_symbolizers_are_omitted() {
        let bad = Arc::new(Symbolizer::Raster(RasterSymbolizer {
            opacity: None,
            outline: Some(Arc::new(Symbolizer::Text(TextSymbolizer::default()))),
        }));
        let registry = CacheRegistry::default();
        let cache = RuleCache::new(Arc::new(Rule::new(vec![bad, line(4.0)])), &registry);
        assert_eq!(cache.symbolizers().len(), 1);
        assert_eq!(cache.failures().len(), 1);
        assert_eq!(cache.margin(None, 1.0), 2.0);
    }

    #[test]
    fn scale_range_is_half_open() {
        let rule = Rule {
            min_scale: 1000.0,
            max_scale: 5000.0,
            ..Rule::default()
        };
        let cache = RuleCache::new(Arc::new(rule), &CacheRegistry::default());
        assert!(!cache.is_in_scale(999.0));
        assert!(cache.is_in_scale(1000.0));
        assert!(cache.is_in_scale(4999.0));
        assert!(!cache.is_in_scale(5000.0));
    }
}
