// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite caches for the five symbolizer kinds.
//!
//! A symbolizer cache owns the leaf caches of its symbolizer and folds their
//! statuses into its own. [`SymbolizerCache`] is the cheaply clonable handle
//! the registry hands out and renderers receive.

mod line;
mod point;
mod polygon;
mod raster;
mod text;

use std::sync::Arc;

pub use line::LineSymbolizerCache;
pub use point::PointSymbolizerCache;
pub use polygon::PolygonSymbolizerCache;
pub use raster::RasterSymbolizerCache;
pub use text::TextSymbolizerCache;

pub use crate::style::SymbolizerKind;

use crate::cache::{CacheStatus, StyleCache};
use crate::error::CacheError;
use crate::expr::Feature;
use crate::registry::CacheRegistry;
use crate::style::Symbolizer;

/// A shared handle to one symbolizer's cache.
#[derive(Clone, Debug)]
pub enum SymbolizerCache {
    /// Point symbol.
    Point(Arc<PointSymbolizerCache>),
    /// Line stroke.
    Line(Arc<LineSymbolizerCache>),
    /// Area fill and outline.
    Polygon(Arc<PolygonSymbolizerCache>),
    /// Coverage.
    Raster(Arc<RasterSymbolizerCache>),
    /// Label.
    Text(Arc<TextSymbolizerCache>),
}

impl SymbolizerCache {
    /// Builds the cache for `symbolizer` with the registry's context.
    ///
    /// Nested symbolizers (raster outlines) are obtained from `registry`.
    ///
    /// # Errors
    ///
    /// Whatever the kind-specific constructor reports.
    pub fn build(symbolizer: &Symbolizer, registry: &CacheRegistry) -> Result<Self, CacheError> {
        let context = registry.context();
        Ok(match symbolizer {
            Symbolizer::Point(point) => {
                Self::Point(Arc::new(PointSymbolizerCache::new(point, context.clone())))
            }
            Symbolizer::Line(line) => {
                Self::Line(Arc::new(LineSymbolizerCache::new(line, context.clone())))
            }
            Symbolizer::Polygon(polygon) => Self::Polygon(Arc::new(PolygonSymbolizerCache::new(
                polygon,
                context.clone(),
            ))),
            Symbolizer::Raster(raster) => {
                Self::Raster(Arc::new(RasterSymbolizerCache::new(raster, registry)?))
            }
            Symbolizer::Text(text) => {
                Self::Text(Arc::new(TextSymbolizerCache::new(text, context.clone())))
            }
        })
    }

    /// Returns the kind of the cached symbolizer.
    #[must_use]
    pub const fn kind(&self) -> SymbolizerKind {
        match self {
            Self::Point(_) => SymbolizerKind::Point,
            Self::Line(_) => SymbolizerKind::Line,
            Self::Polygon(_) => SymbolizerKind::Polygon,
            Self::Raster(_) => SymbolizerKind::Raster,
            Self::Text(_) => SymbolizerKind::Text,
        }
    }

    fn inner(&self) -> &dyn StyleCache {
        match self {
            Self::Point(c) => &**c,
            Self::Line(c) => &**c,
            Self::Polygon(c) => &**c,
            Self::Raster(c) => &**c,
            Self::Text(c) => &**c,
        }
    }

    /// Returns the extra pixels around the geometry this symbolizer may
    /// paint, scaled by `coefficient`.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        match self {
            Self::Point(c) => c.margin(feature, coefficient),
            Self::Line(c) => c.margin(feature, coefficient),
            Self::Polygon(c) => c.margin(feature, coefficient),
            Self::Raster(c) => c.margin(feature, coefficient),
            Self::Text(c) => c.margin(feature, coefficient),
        }
    }

    /// Returns `true` if both handles point at the same cache.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Point(a), Self::Point(b)) => Arc::ptr_eq(a, b),
            (Self::Line(a), Self::Line(b)) => Arc::ptr_eq(a, b),
            (Self::Polygon(a), Self::Polygon(b)) => Arc::ptr_eq(a, b),
            (Self::Raster(a), Self::Raster(b)) => Arc::ptr_eq(a, b),
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl StyleCache for SymbolizerCache {
    fn status(&self) -> &CacheStatus {
        self.inner().status()
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        self.inner().is_visible(feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Visibility;
    use crate::paint::Color;
    use crate::style::{LineSymbolizer, Stroke, TextSymbolizer};

    #[test]
    fn build_dispatches_on_kind() {
        let registry = CacheRegistry::default();
        for kind in SymbolizerKind::ALL {
            let symbolizer = match kind {
                SymbolizerKind::Point => Symbolizer::Point(Default::default()),
                SymbolizerKind::Line => Symbolizer::Line(Default::default()),
                SymbolizerKind::Polygon => Symbolizer::Polygon(Default::default()),
                SymbolizerKind::Raster => Symbolizer::Raster(Default::default()),
                SymbolizerKind::Text => Symbolizer::Text(TextSymbolizer::default()),
            };
            let cache = SymbolizerCache::build(&symbolizer, &registry).expect("cache");
            assert_eq!(cache.kind(), kind);
        }
    }

    #[test]
    fn handle_delegates_to_inner_cache() {
        let registry = CacheRegistry::default();
        let line = Symbolizer::Line(LineSymbolizer {
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 2.0))),
            perpendicular_offset: None,
        });
        let cache = SymbolizerCache::build(&line, &registry).expect("cache");
        assert_eq!(cache.visibility(), Visibility::Always);
        assert_eq!(cache.margin(None, 1.0), 1.0);
        assert!(cache.ptr_eq(&cache.clone()));
        let other = SymbolizerCache::build(&line, &registry).expect("cache");
        assert!(!cache.ptr_eq(&other));
    }
}
