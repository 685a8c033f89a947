// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, OnceLock};

use kurbo::Vec2;

use crate::cache::{
    CacheContext, CacheStatus, DisplacementCache, FillCache, StatusBuilder, StrokeCache,
    StyleCache, Visibility, visible_with,
};
use crate::expr::{Expression, Feature};
use crate::style::PolygonSymbolizer;

/// Caches a [`PolygonSymbolizer`].
///
/// The polygon paints when either its fill or its outline does, so it is
/// `Never` only when both are (or both are missing). It is static only when
/// every part is.
#[derive(Debug)]
pub struct PolygonSymbolizerCache {
    stroke: Option<StrokeCache>,
    fill: Option<FillCache>,
    displacement: DisplacementCache,
    offset: Option<Expression>,
    context: Arc<CacheContext>,
    state: OnceLock<PolygonState>,
}

#[derive(Debug)]
struct PolygonState {
    status: CacheStatus,
    offset: Option<f64>,
}

impl PolygonSymbolizerCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(polygon: &PolygonSymbolizer, context: Arc<CacheContext>) -> Self {
        Self {
            stroke: polygon
                .stroke
                .clone()
                .map(|s| StrokeCache::new(s, context.clone())),
            fill: polygon
                .fill
                .clone()
                .map(|f| FillCache::new(f, context.clone())),
            displacement: DisplacementCache::new(polygon.displacement.clone(), context.clone()),
            offset: polygon.perpendicular_offset.clone(),
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &PolygonState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            let stroke = self.stroke.as_ref().map(StyleCache::status);
            let fill = self.fill.as_ref().map(StyleCache::status);
            let mut visibility = Visibility::Never;
            for part in stroke.into_iter().chain(fill) {
                b.absorb_attributes(part);
                visibility = visibility.or(part.visibility);
            }
            b.absorb_attributes(self.displacement.status());
            let offset = b
                .expression(self.offset.as_ref())
                .then(|| oracle.evaluate_f64(self.offset.as_ref(), None, 0.0));
            b.override_visibility(visibility);
            let status = b.finish();
            tracing::trace!(?status, "evaluated polygon symbolizer");
            PolygonState { status, offset }
        })
    }

    /// Returns the outline cache, if any.
    #[must_use]
    pub fn stroke(&self) -> Option<&StrokeCache> {
        self.stroke.as_ref()
    }

    /// Returns the fill cache, if any.
    #[must_use]
    pub fn fill(&self) -> Option<&FillCache> {
        self.fill.as_ref()
    }

    /// Returns the whole-polygon displacement, scaled.
    #[must_use]
    pub fn displacement(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Vec2 {
        self.displacement.offset(feature, coefficient)
    }

    /// Returns the outline offset, scaled.
    #[must_use]
    pub fn perpendicular_offset(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let offset = self.state().offset.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.offset.as_ref(), feature, 0.0)
        });
        offset * coefficient
    }

    /// Returns the outline margin plus offset and displacement magnitudes.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        if self.status().visibility.is_never() {
            return 0.0;
        }
        let stroke = self
            .stroke
            .as_ref()
            .map_or(0.0, |s| s.margin(feature, coefficient));
        stroke
            + self.perpendicular_offset(feature, coefficient).abs()
            + self.displacement(feature, coefficient).hypot()
    }
}

impl StyleCache for PolygonSymbolizerCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.fill.as_ref().is_some_and(|f| f.is_visible(feature))
                || self.stroke.as_ref().is_some_and(|s| s.is_visible(feature))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SimpleFeature;
    use crate::paint::Color;
    use crate::style::{Displacement, Fill, Stroke};

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    #[test]
    fn invisible_fill_with_visible_stroke_is_visible() {
        let polygon = PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::rgba(0, 0, 255, 0)))),
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
            ..PolygonSymbolizer::default()
        };
        let cache = PolygonSymbolizerCache::new(&polygon, context());
        assert_ne!(cache.visibility(), Visibility::Never);
        assert!(cache.is_visible(&SimpleFeature::new()));
    }

    #[test]
    fn both_parts_invisible_is_never() {
        let polygon = PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::TRANSPARENT))),
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 0.0))),
            ..PolygonSymbolizer::default()
        };
        let cache = PolygonSymbolizerCache::new(&polygon, context());
        assert_eq!(cache.status(), &CacheStatus::NEVER);

        let empty = PolygonSymbolizerCache::new(&PolygonSymbolizer::default(), context());
        assert_eq!(empty.visibility(), Visibility::Never);
    }

    #[test]
    fn static_needs_every_part_static() {
        let polygon = PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::GRAY))),
            stroke: Some(Arc::new(
                Stroke::solid(Color::BLACK, 1.0).with_width(Expression::property("w")),
            )),
            ..PolygonSymbolizer::default()
        };
        let cache = PolygonSymbolizerCache::new(&polygon, context());
        assert!(!cache.is_static());
        assert_eq!(cache.visibility(), Visibility::Always);
        assert_eq!(cache.required_attributes().to_vec(), ["w"]);
    }

    #[test]
    fn margin_sums_stroke_offset_and_displacement() {
        let polygon = PolygonSymbolizer {
            fill: None,
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 2.0))),
            displacement: Some(Arc::new(Displacement::constant(3.0, 4.0))),
            perpendicular_offset: Some(Expression::number(2.0)),
        };
        let cache = PolygonSymbolizerCache::new(&polygon, context());
        assert_eq!(cache.margin(None, 1.0), 1.0 + 2.0 + 5.0);
    }
}
