// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, OnceLock};

use crate::cache::{CacheContext, CacheStatus, StatusBuilder, StrokeCache, StyleCache, visible_with};
use crate::expr::{Expression, Feature};
use crate::style::LineSymbolizer;

/// Caches a [`LineSymbolizer`]: a stroke and a perpendicular offset.
///
/// Without a stroke the symbolizer never paints.
#[derive(Debug)]
pub struct LineSymbolizerCache {
    stroke: Option<StrokeCache>,
    offset: Option<Expression>,
    context: Arc<CacheContext>,
    state: OnceLock<LineState>,
}

#[derive(Debug)]
struct LineState {
    status: CacheStatus,
    offset: Option<f64>,
}

impl LineSymbolizerCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(line: &LineSymbolizer, context: Arc<CacheContext>) -> Self {
        Self {
            stroke: line
                .stroke
                .clone()
                .map(|s| StrokeCache::new(s, context.clone())),
            offset: line.perpendicular_offset.clone(),
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &LineState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            match &self.stroke {
                Some(stroke) => b.absorb(stroke.status()),
                None => b.mark_never(),
            }
            let offset = b
                .expression(self.offset.as_ref())
                .then(|| oracle.evaluate_f64(self.offset.as_ref(), None, 0.0));
            let status = b.finish();
            tracing::trace!(?status, "evaluated line symbolizer");
            LineState { status, offset }
        })
    }

    /// Returns the stroke cache, if any.
    #[must_use]
    pub fn stroke(&self) -> Option<&StrokeCache> {
        self.stroke.as_ref()
    }

    /// Returns the perpendicular offset scaled by `coefficient`.
    #[must_use]
    pub fn perpendicular_offset(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let offset = self.state().offset.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.offset.as_ref(), feature, 0.0)
        });
        offset * coefficient
    }

    /// Returns the stroke margin plus the offset magnitude.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        if self.status().visibility.is_never() {
            return 0.0;
        }
        let stroke = self
            .stroke
            .as_ref()
            .map_or(0.0, |s| s.margin(feature, coefficient));
        stroke + self.perpendicular_offset(feature, coefficient).abs()
    }
}

impl StyleCache for LineSymbolizerCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.stroke.as_ref().is_some_and(|s| s.is_visible(feature))
        })
    }
}
