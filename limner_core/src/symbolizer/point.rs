// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use crate::cache::{CacheContext, CacheStatus, GraphicCache, StyleCache};
use crate::expr::Feature;
use crate::style::{Graphic, PointSymbolizer};

/// Caches a [`PointSymbolizer`]: one graphic, the default square when none
/// is declared.
#[derive(Debug)]
pub struct PointSymbolizerCache {
    graphic: GraphicCache,
}

impl PointSymbolizerCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(point: &PointSymbolizer, context: Arc<CacheContext>) -> Self {
        let graphic = point
            .graphic
            .clone()
            .unwrap_or_else(|| Arc::new(Graphic::default()));
        Self {
            graphic: GraphicCache::new(graphic, context),
        }
    }

    /// Returns the graphic cache.
    #[must_use]
    pub fn graphic(&self) -> &GraphicCache {
        &self.graphic
    }

    /// Returns the graphic's margin.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        self.graphic.margin(feature, coefficient)
    }
}

impl StyleCache for PointSymbolizerCache {
    fn status(&self) -> &CacheStatus {
        self.graphic.status()
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        self.graphic.is_visible(feature)
    }
}
