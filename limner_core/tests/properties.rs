// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Behavior of complete styles seen through the registry.

use std::sync::Arc;

use limner_core::cache::{CacheStatus, StyleCache, Visibility};
use limner_core::expr::{CompareOp, Expression, Feature, Filter, SimpleFeature, Value};
use limner_core::paint::Color;
use limner_core::registry::CacheRegistry;
use limner_core::style::{
    ExternalGraphic, Fill, Graphic, GraphicSource, GraphicalSymbol, LineSymbolizer,
    PointSymbolizer, PolygonSymbolizer, Rule, Stroke, Symbolizer,
};
use limner_core::symbolizer::SymbolizerCache;

/// A feature that must never be consulted.
struct Untouchable;

impl Feature for Untouchable {
    fn attribute(&self, name: &str) -> Option<Value> {
        panic!("attribute {name:?} read from a static cache");
    }
}

fn polygon(fill: Color, stroke_width: f64) -> Arc<Symbolizer> {
    Arc::new(Symbolizer::Polygon(PolygonSymbolizer {
        fill: Some(Arc::new(Fill::solid(fill))),
        stroke: Some(Arc::new(Stroke::solid(Color::BLACK, stroke_width))),
        ..PolygonSymbolizer::default()
    }))
}

fn line_with_width(width: Expression) -> Arc<Symbolizer> {
    Arc::new(Symbolizer::Line(LineSymbolizer {
        stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0).with_width(width))),
        perpendicular_offset: None,
    }))
}

#[test]
fn evaluation_is_idempotent() {
    let registry = CacheRegistry::default();
    let cache = registry
        .get_symbolizer(&line_with_width(Expression::property("w")))
        .expect("cache");
    cache.evaluate();
    let first = cache.status().clone();
    cache.evaluate();
    cache.evaluate();
    assert_eq!(cache.status(), &first);
}

#[test]
fn static_caches_need_no_attributes_and_never_read_features() {
    let registry = CacheRegistry::default();
    let rule = Arc::new(Rule::new(vec![
        polygon(Color::GRAY, 1.0),
        line_with_width(Expression::number(2.0)),
        Arc::new(Symbolizer::Point(PointSymbolizer::default())),
    ]));
    let cache = registry.get_rule(&rule);
    assert!(cache.is_static());
    assert!(cache.required_attributes().is_empty());
    assert!(cache.is_visible(&Untouchable));
    assert!(cache.matches(&Untouchable));
    for symbolizer in cache.symbolizers() {
        assert!(symbolizer.is_static());
        assert!(symbolizer.required_attributes().is_empty());
        assert!(symbolizer.is_visible(&Untouchable));
    }
}

#[test]
fn zero_alpha_fill_collapses_to_never() {
    let registry = CacheRegistry::default();
    let node = Arc::new(Symbolizer::Polygon(PolygonSymbolizer {
        fill: Some(Arc::new(Fill::solid(Color::rgba(255, 0, 0, 0)))),
        ..PolygonSymbolizer::default()
    }));
    let cache = registry.get_symbolizer(&node).expect("cache");
    assert_eq!(cache.status(), &CacheStatus::NEVER);
    assert!(!cache.is_visible(&Untouchable));
    assert_eq!(cache.margin(None, 1.0), 0.0);
}

#[test]
fn polygon_paints_if_either_part_does() {
    let registry = CacheRegistry::default();
    let stroke_only = registry
        .get_symbolizer(&polygon(Color::TRANSPARENT, 1.0))
        .expect("cache");
    assert_ne!(stroke_only.visibility(), Visibility::Never);

    let fill_only = registry
        .get_symbolizer(&polygon(Color::GRAY, 0.0))
        .expect("cache");
    assert_ne!(fill_only.visibility(), Visibility::Never);

    let neither = registry
        .get_symbolizer(&polygon(Color::TRANSPARENT, 0.0))
        .expect("cache");
    assert_eq!(neither.visibility(), Visibility::Never);
}

#[test]
fn rule_paints_if_any_symbolizer_does() {
    let registry = CacheRegistry::default();
    let rule = Arc::new(Rule::new(vec![
        polygon(Color::TRANSPARENT, 0.0),
        line_with_width(Expression::number(1.0)),
    ]));
    assert_ne!(registry.get_rule(&rule).visibility(), Visibility::Never);

    let hidden = Arc::new(Rule::new(vec![polygon(Color::TRANSPARENT, 0.0)]));
    assert_eq!(registry.get_rule(&hidden).visibility(), Visibility::Never);
}

#[test]
fn rule_attributes_are_the_union_of_filter_and_symbolizers() {
    let registry = CacheRegistry::default();
    let rule = Arc::new(
        Rule::new(vec![line_with_width(Expression::property("width_mm"))]).with_filter(
            Filter::compare(
                CompareOp::Ge,
                Expression::property("pop"),
                Expression::number(10_000.0),
            ),
        ),
    );
    let cache = registry.get_rule(&rule);
    assert_eq!(cache.required_attributes().to_vec(), ["pop", "width_mm"]);

    let feature = SimpleFeature::new()
        .with_attribute("pop", 25_000.0)
        .with_attribute("width_mm", 3.0);
    assert!(cache.matches(&feature));
    assert!(cache.is_visible(&feature));
}

#[test]
fn unreachable_external_graphic_falls_back_to_default_square() {
    let registry = CacheRegistry::default();
    let graphic = Graphic {
        symbols: vec![GraphicalSymbol::External(Arc::new(ExternalGraphic {
            source: GraphicSource::Uri("https://tiles.invalid/pin.png".into()),
            format: Some("image/png".into()),
        }))],
        ..Graphic::default()
    };
    let node = Arc::new(Symbolizer::Point(PointSymbolizer {
        graphic: Some(Arc::new(graphic)),
    }));
    let SymbolizerCache::Point(cache) = registry.get_symbolizer(&node).expect("cache") else {
        panic!("expected a point cache");
    };
    assert_eq!(cache.status(), &CacheStatus::ALWAYS);
    let image = cache.graphic().image(None, 1.0).expect("default square");
    assert_eq!(image.dimensions(), (7, 7));
}

#[test]
fn stroke_margin_grows_with_width() {
    let registry = CacheRegistry::default();
    let margins: Vec<f64> = (1..=5)
        .map(|w| {
            registry
                .get_symbolizer(&line_with_width(Expression::number(f64::from(w))))
                .expect("cache")
                .margin(None, 1.0)
        })
        .collect();
    assert!(margins.windows(2).all(|m| m[0] <= m[1]));
    assert_eq!(margins[4], 2.5);
}
