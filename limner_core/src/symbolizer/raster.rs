// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, OnceLock};

use super::SymbolizerCache;
use crate::cache::{
    CacheContext, CacheStatus, StatusBuilder, StyleCache, Visibility, visible_with,
};
use crate::error::CacheError;
use crate::expr::{Expression, Feature};
use crate::registry::CacheRegistry;
use crate::style::{RasterSymbolizer, SymbolizerKind};

/// Caches a [`RasterSymbolizer`]: coverage opacity and an optional outline.
///
/// The outline is itself a line or polygon symbolizer cache obtained from the
/// registry. Coverage and outline paint independently: the symbolizer is
/// `Never` only when both are.
#[derive(Debug)]
pub struct RasterSymbolizerCache {
    opacity: Option<Expression>,
    outline: Option<SymbolizerCache>,
    context: Arc<CacheContext>,
    state: OnceLock<RasterState>,
}

#[derive(Debug)]
struct RasterState {
    status: CacheStatus,
    opacity: Option<f64>,
}

impl RasterSymbolizerCache {
    /// Creates a cache, resolving the outline through `registry`.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidOutline`] when the outline is not a line or
    /// polygon symbolizer, or the outline's own construction error.
    pub fn new(raster: &RasterSymbolizer, registry: &CacheRegistry) -> Result<Self, CacheError> {
        let outline = match &raster.outline {
            Some(outline) => match outline.kind() {
                SymbolizerKind::Line | SymbolizerKind::Polygon => {
                    Some(registry.get_symbolizer(outline)?)
                }
                other => return Err(CacheError::InvalidOutline(other)),
            },
            None => None,
        };
        Ok(Self {
            opacity: raster.opacity.clone(),
            outline,
            context: registry.context().clone(),
            state: OnceLock::new(),
        })
    }

    fn state(&self) -> &RasterState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            let opacity = b
                .expression(self.opacity.as_ref())
                .then(|| oracle.evaluate_f64(self.opacity.as_ref(), None, 1.0).clamp(0.0, 1.0));
            let mut visibility = match opacity {
                Some(o) if o <= 0.0 => Visibility::Never,
                Some(_) => Visibility::Always,
                None => Visibility::DependsOnFeature,
            };
            if let Some(outline) = &self.outline {
                b.absorb_attributes(outline.status());
                visibility = visibility.or(outline.visibility());
            }
            b.override_visibility(visibility);
            let status = b.finish();
            tracing::trace!(?status, "evaluated raster symbolizer");
            RasterState { status, opacity }
        })
    }

    /// Returns the coverage opacity for `feature`, zero when the coverage
    /// does not paint.
    #[must_use]
    pub fn opacity(&self, feature: Option<&dyn Feature>) -> f64 {
        let state = self.state();
        if state.status.visibility.is_never() {
            return 0.0;
        }
        state.opacity.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.opacity.as_ref(), feature, 1.0)
                .clamp(0.0, 1.0)
        })
    }

    /// Returns the outline cache, if any.
    #[must_use]
    pub fn outline(&self) -> Option<&SymbolizerCache> {
        self.outline.as_ref()
    }

    /// Returns the outline's margin, zero without one.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        if self.status().visibility.is_never() {
            return 0.0;
        }
        self.outline
            .as_ref()
            .map_or(0.0, |o| o.margin(feature, coefficient))
    }
}

impl StyleCache for RasterSymbolizerCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.opacity(Some(feature)) > 0.0
                || self.outline.as_ref().is_some_and(|o| o.is_visible(feature))
        })
    }
}
