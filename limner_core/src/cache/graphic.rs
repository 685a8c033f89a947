// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plotted graphics and their symbol selection.

use core::f64::consts::SQRT_2;
use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use kurbo::{Point, Vec2};

use super::{
    AnchorCache, CacheContext, CacheStatus, DisplacementCache, ExternalCache, MarkCache,
    StatusBuilder, StyleCache, visible_with,
};
use crate::expr::{Expression, Feature};
use crate::raster;
use crate::style::{Graphic, GraphicalSymbol, Mark};

/// A candidate symbol of a graphic.
#[derive(Debug)]
pub enum SymbolCache {
    /// A vector mark.
    Mark(MarkCache),
    /// A raster image.
    External(ExternalCache),
}

impl SymbolCache {
    /// Creates the cache for one candidate.
    #[must_use]
    pub fn new(symbol: &GraphicalSymbol, context: Arc<CacheContext>) -> Self {
        match symbol {
            GraphicalSymbol::Mark(mark) => Self::Mark(MarkCache::new(mark.clone(), context)),
            GraphicalSymbol::External(external) => {
                Self::External(ExternalCache::new(external.clone(), context))
            }
        }
    }

    /// Returns `true` if this candidate can be drawn at all.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Mark(m) => m.is_valid(),
            Self::External(e) => e.is_valid(),
        }
    }
}

impl StyleCache for SymbolCache {
    fn status(&self) -> &CacheStatus {
        match self {
            Self::Mark(m) => m.status(),
            Self::External(e) => e.status(),
        }
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        match self {
            Self::Mark(m) => m.is_visible(feature),
            Self::External(e) => e.is_visible(feature),
        }
    }
}

/// Caches a [`Graphic`].
///
/// The drawn symbol is the first structurally valid candidate in
/// declaration order. When none is valid (or none is declared) the default
/// square mark is drawn instead. A static zero opacity or size makes the
/// graphic [`Never`](super::Visibility::Never).
///
/// When every part is static the unit-coefficient image is rendered once
/// and shared by every caller.
#[derive(Debug)]
pub struct GraphicCache {
    graphic: Arc<Graphic>,
    context: Arc<CacheContext>,
    candidates: Vec<Arc<SymbolCache>>,
    anchor: AnchorCache,
    displacement: DisplacementCache,
    state: OnceLock<GraphicState>,
}

#[derive(Debug)]
struct GraphicState {
    status: CacheStatus,
    symbol: Option<Arc<SymbolCache>>,
    opacity: Option<f64>,
    size: Option<f64>,
    rotation: Option<f64>,
    image: OnceLock<Option<Arc<RgbaImage>>>,
}

impl GraphicCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(graphic: Arc<Graphic>, context: Arc<CacheContext>) -> Self {
        Self {
            candidates: graphic
                .symbols
                .iter()
                .map(|s| Arc::new(SymbolCache::new(s, context.clone())))
                .collect(),
            anchor: AnchorCache::new(graphic.anchor_point.clone(), context.clone()),
            displacement: DisplacementCache::new(graphic.displacement.clone(), context.clone()),
            graphic,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &GraphicState {
        self.state.get_or_init(|| {
            let symbol = self
                .candidates
                .iter()
                .find(|c| c.is_valid())
                .cloned()
                .unwrap_or_else(|| {
                    tracing::debug!(
                        candidates = self.candidates.len(),
                        "no valid graphic symbol, drawing default square"
                    );
                    Arc::new(SymbolCache::Mark(MarkCache::new(
                        Arc::new(Mark::default_square()),
                        self.context.clone(),
                    )))
                });

            let oracle = &*self.context.oracle;
            let g = &*self.graphic;
            let mut b = StatusBuilder::new(oracle);
            b.absorb(symbol.status());
            b.absorb(self.anchor.status());
            b.absorb(self.displacement.status());

            let default_size = self.default_size(&symbol);
            let mut number = |expr: Option<&Expression>, default: f64| {
                b.expression(expr)
                    .then(|| oracle.evaluate_f64(expr, None, default))
            };
            let opacity = number(g.opacity.as_ref(), 1.0);
            let size = number(g.size.as_ref(), default_size);
            let rotation = number(g.rotation.as_ref(), 0.0);
            if opacity.is_some_and(|o| o <= 0.0) || size.is_some_and(|s| s <= 0.0) {
                b.mark_never();
            }

            let status = b.finish();
            tracing::trace!(?status, "evaluated graphic");
            let never = status.visibility.is_never();
            GraphicState {
                status,
                symbol: (!never).then_some(symbol),
                opacity: opacity.filter(|_| !never),
                size: size.filter(|_| !never),
                rotation: rotation.filter(|_| !never),
                image: OnceLock::new(),
            }
        })
    }

    fn default_size(&self, symbol: &SymbolCache) -> f64 {
        match symbol {
            SymbolCache::External(e) => e
                .native_size()
                .map_or(self.context.config.default_mark_size, |(_, h)| f64::from(h)),
            SymbolCache::Mark(_) => self.context.config.default_mark_size,
        }
    }

    /// Returns the chosen symbol; `None` when the graphic never paints.
    #[must_use]
    pub fn symbol(&self) -> Option<&SymbolCache> {
        self.state().symbol.as_deref()
    }

    /// Returns the opacity for `feature`.
    #[must_use]
    pub fn opacity(&self, feature: Option<&dyn Feature>) -> f64 {
        self.state().opacity.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.graphic.opacity.as_ref(), feature, 1.0)
        })
    }

    /// Returns the unscaled height in pixels for `feature`.
    #[must_use]
    pub fn size(&self, feature: Option<&dyn Feature>) -> f64 {
        let state = self.state();
        match (&state.symbol, state.size) {
            (None, _) => 0.0,
            (Some(_), Some(size)) => size,
            (Some(symbol), None) => self.context.oracle.evaluate_f64(
                self.graphic.size.as_ref(),
                feature,
                self.default_size(symbol),
            ),
        }
    }

    /// Returns the clockwise rotation in degrees for `feature`.
    #[must_use]
    pub fn rotation(&self, feature: Option<&dyn Feature>) -> f64 {
        self.state().rotation.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.graphic.rotation.as_ref(), feature, 0.0)
        })
    }

    /// Returns the anchor inside the symbol, as fractions of its extent.
    #[must_use]
    pub fn anchor(&self, feature: Option<&dyn Feature>) -> Point {
        self.anchor.point(feature)
    }

    /// Returns the pixel displacement, scaled.
    #[must_use]
    pub fn displacement(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Vec2 {
        self.displacement.offset(feature, coefficient)
    }

    /// Returns the rendered symbol at `size × coefficient` pixels, with
    /// rotation and opacity applied.
    #[must_use]
    pub fn image(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Arc<RgbaImage>> {
        let state = self.state();
        state.symbol.as_ref()?;
        if state.status.is_static && coefficient == 1.0 {
            return state
                .image
                .get_or_init(|| self.render(None, 1.0).map(Arc::new))
                .clone();
        }
        self.render(feature, coefficient).map(Arc::new)
    }

    fn render(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<RgbaImage> {
        let symbol = self.state().symbol.as_ref()?;
        let size = self.size(feature) * coefficient;
        let opacity = self.opacity(feature);
        if size <= 0.0 || opacity <= 0.0 {
            return None;
        }
        let rotation = self.rotation(feature);
        let mut image = match &**symbol {
            SymbolCache::Mark(mark) => mark.render(feature, size, rotation, coefficient)?,
            SymbolCache::External(external) => raster::transform_image(
                external.image()?,
                size,
                rotation,
                self.context.config.max_image_dimension,
            )?,
        };
        raster::apply_opacity(&mut image, opacity);
        Some(image)
    }

    /// Returns how far the drawn symbol can reach from its anchor location,
    /// in pixels: the rotated half extent plus outline, displacement and
    /// anchor offset.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let Some(symbol) = self.state().symbol.as_deref() else {
            return 0.0;
        };
        let size = self.size(feature).max(0.0) * coefficient;
        let half = match symbol {
            SymbolCache::Mark(mark) => size / 2.0 + mark.stroke_margin(feature, coefficient),
            SymbolCache::External(external) => {
                let aspect = external
                    .native_size()
                    .filter(|(_, h)| *h > 0)
                    .map_or(1.0, |(w, h)| f64::from(w) / f64::from(h));
                size * aspect.max(1.0) / 2.0
            }
        };
        SQRT_2 * half
            + self.displacement(feature, coefficient).hypot()
            + self.anchor.offset_from_center(feature).hypot() * size
    }
}

impl StyleCache for GraphicCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.symbol().is_some_and(|s| s.is_visible(feature))
                && self.opacity(Some(feature)) > 0.0
                && self.size(Some(feature)) > 0.0
        })
    }
}
