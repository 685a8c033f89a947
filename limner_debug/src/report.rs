// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshots of settled cache statuses.
//!
//! Building a report forces evaluation of every cache it covers.

use std::sync::Arc;

use limner_core::cache::{CacheStatus, StyleCache, Visibility};
use limner_core::registry::CacheRegistry;
use limner_core::rule::{RuleCache, RuleFilter};
use limner_core::style::{Rule, SymbolizerKind};
use limner_core::symbolizer::SymbolizerCache;
use serde::Serialize;

/// What one symbolizer cache settled on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolizerReport {
    /// `point`, `line`, `polygon`, `raster` or `text`.
    pub kind: &'static str,
    /// Every value was precomputed.
    pub is_static: bool,
    /// `always`, `never` or `depends-on-feature`.
    pub visibility: &'static str,
    /// Attributes the dynamic parts read.
    pub required: Vec<String>,
    /// Margin at coefficient 1, evaluated without a feature.
    pub margin: f64,
}

impl SymbolizerReport {
    /// Snapshots `cache`.
    #[must_use]
    pub fn from_cache(cache: &SymbolizerCache) -> Self {
        let status = cache.status();
        Self {
            kind: kind_name(cache.kind()),
            is_static: status.is_static,
            visibility: visibility_name(status.visibility),
            required: status.required.to_vec(),
            margin: cache.margin(None, 1.0),
        }
    }
}

/// What one rule cache settled on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleReport {
    /// Rule name, if any.
    pub name: Option<String>,
    /// Else rule.
    pub is_else: bool,
    /// `accept-all`, `reject-all` or `dynamic`.
    pub filter: &'static str,
    /// Filter and every symbolizer static.
    pub is_static: bool,
    /// Disjunction of the symbolizers' visibilities.
    pub visibility: &'static str,
    /// Union of filter and symbolizer attributes.
    pub required: Vec<String>,
    /// Largest symbolizer margin at coefficient 1.
    pub margin: f64,
    /// Symbolizers left out because their cache failed to build.
    pub omitted: Vec<String>,
    /// One report per symbolizer cache, in order.
    pub symbolizers: Vec<SymbolizerReport>,
}

impl RuleReport {
    /// Snapshots `cache` and its symbolizers.
    #[must_use]
    pub fn from_cache(cache: &RuleCache) -> Self {
        let CacheStatus {
            is_static,
            visibility,
            required,
        } = cache.status();
        Self {
            name: cache.name().map(str::to_owned),
            is_else: cache.is_else(),
            filter: match cache.filter() {
                RuleFilter::AcceptAll => "accept-all",
                RuleFilter::RejectAll => "reject-all",
                RuleFilter::Dynamic(_) => "dynamic",
            },
            is_static: *is_static,
            visibility: visibility_name(*visibility),
            required: required.to_vec(),
            margin: cache.margin(None, 1.0),
            omitted: cache.failures().iter().map(ToString::to_string).collect(),
            symbolizers: cache
                .symbolizers()
                .iter()
                .map(SymbolizerReport::from_cache)
                .collect(),
        }
    }
}

/// Reports every rule of a style, obtaining the caches from `registry`.
#[must_use]
pub fn report_rules(registry: &CacheRegistry, rules: &[Arc<Rule>]) -> Vec<RuleReport> {
    rules
        .iter()
        .map(|rule| RuleReport::from_cache(&registry.get_rule(rule)))
        .collect()
}

pub(crate) fn kind_name(kind: SymbolizerKind) -> &'static str {
    match kind {
        SymbolizerKind::Point => "point",
        SymbolizerKind::Line => "line",
        SymbolizerKind::Polygon => "polygon",
        SymbolizerKind::Raster => "raster",
        SymbolizerKind::Text => "text",
    }
}

pub(crate) fn visibility_name(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Undetermined => "undetermined",
        Visibility::Always => "always",
        Visibility::Never => "never",
        Visibility::DependsOnFeature => "depends-on-feature",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use limner_core::expr::{CompareOp, Expression, Filter};
    use limner_core::paint::Color;
    use limner_core::style::{
        LineSymbolizer, PointSymbolizer, RasterSymbolizer, Stroke, Symbolizer, TextSymbolizer,
    };

    /// A two-rule style: a dynamic road rule and a static fallback.
    pub(crate) fn style() -> Vec<Arc<Rule>> {
        let road = Rule {
            name: Some("roads".into()),
            ..Rule::new(vec![
                Arc::new(Symbolizer::Line(LineSymbolizer {
                    stroke: Some(Arc::new(
                        Stroke::solid(Color::BLACK, 1.0)
                            .with_width(Expression::property("width_mm")),
                    )),
                    perpendicular_offset: None,
                })),
                Arc::new(Symbolizer::Raster(RasterSymbolizer {
                    opacity: None,
                    outline: Some(Arc::new(Symbolizer::Text(TextSymbolizer::default()))),
                })),
            ])
            .with_filter(Filter::compare(
                CompareOp::Gt,
                Expression::property("pop"),
                Expression::number(0.0),
            ))
        };
        let fallback = Rule {
            is_else: true,
            ..Rule::new(vec![Arc::new(Symbolizer::Point(PointSymbolizer::default()))])
        };
        vec![Arc::new(road), Arc::new(fallback)]
    }

    #[test]
    fn reports_status_and_omissions() {
        let registry = CacheRegistry::default();
        let reports = report_rules(&registry, &style());
        assert_eq!(reports.len(), 2);

        let road = &reports[0];
        assert_eq!(road.name.as_deref(), Some("roads"));
        assert_eq!(road.filter, "dynamic");
        assert!(!road.is_static);
        assert_eq!(road.visibility, "depends-on-feature");
        assert_eq!(road.required, ["pop", "width_mm"]);
        assert_eq!(road.omitted.len(), 1);
        assert_eq!(road.symbolizers.len(), 1);
        assert_eq!(road.symbolizers[0].kind, "line");

        let fallback = &reports[1];
        assert!(fallback.is_else);
        assert_eq!(fallback.filter, "accept-all");
        assert!(fallback.is_static);
        assert_eq!(fallback.visibility, "always");
        assert!(fallback.required.is_empty());
        assert!(fallback.margin > 0.0);
    }
}
