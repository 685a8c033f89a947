// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Area paint.

use std::sync::{Arc, OnceLock};

use super::{CacheContext, CacheStatus, GraphicCache, StatusBuilder, StyleCache, visible_with};
use crate::expr::Feature;
use crate::paint::{Color, Paint};
use crate::raster;
use crate::style::Fill;

/// Caches a [`Fill`].
///
/// With a graphic fill the paint is the nested graphic rendered as a tile,
/// otherwise a flat color with the opacity folded into its alpha. A static
/// zero opacity, or a static color whose folded alpha is zero, makes the fill
/// [`Never`](super::Visibility::Never).
#[derive(Debug)]
pub struct FillCache {
    fill: Arc<Fill>,
    context: Arc<CacheContext>,
    graphic: Option<GraphicCache>,
    state: OnceLock<FillState>,
}

#[derive(Debug)]
struct FillState {
    status: CacheStatus,
    color: Option<Color>,
    opacity: Option<f64>,
}

impl FillCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(fill: Arc<Fill>, context: Arc<CacheContext>) -> Self {
        Self {
            graphic: fill
                .graphic_fill
                .clone()
                .map(|g| GraphicCache::new(g, context.clone())),
            fill,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &FillState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);

            let opacity_expr = self.fill.opacity.as_ref();
            let opacity = b
                .expression(opacity_expr)
                .then(|| oracle.evaluate_f64(opacity_expr, None, 1.0));
            if opacity.is_some_and(|o| o <= 0.0) {
                b.mark_never();
            }

            let color = match &self.graphic {
                Some(graphic) => {
                    b.absorb(graphic.status());
                    None
                }
                None => {
                    let color_expr = self.fill.color.as_ref();
                    let color = b
                        .expression(color_expr)
                        .then(|| oracle.evaluate_color(color_expr, None, Color::GRAY));
                    let folded = color.map(|c| c.with_opacity(opacity.unwrap_or(1.0)));
                    if folded.is_some_and(Color::is_transparent) {
                        b.mark_never();
                    }
                    color
                }
            };

            let status = b.finish();
            tracing::trace!(?status, "evaluated fill");
            if status.visibility.is_never() {
                return FillState {
                    status,
                    color: None,
                    opacity: None,
                };
            }
            FillState {
                status,
                color,
                opacity,
            }
        })
    }

    /// Returns the nested pattern graphic cache, if any.
    #[must_use]
    pub fn graphic(&self) -> Option<&GraphicCache> {
        self.graphic.as_ref()
    }

    /// Returns the opacity for `feature`.
    #[must_use]
    pub fn opacity(&self, feature: Option<&dyn Feature>) -> f64 {
        self.state().opacity.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.fill.opacity.as_ref(), feature, 1.0)
        })
    }

    /// Returns the flat color with opacity applied.
    ///
    /// `None` for graphic fills and for fills that never paint.
    #[must_use]
    pub fn color(&self, feature: Option<&dyn Feature>) -> Option<Color> {
        let state = self.state();
        if state.status.visibility.is_never() || self.graphic.is_some() {
            return None;
        }
        let color = state.color.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_color(self.fill.color.as_ref(), feature, Color::GRAY)
        });
        Some(color.with_opacity(self.opacity(feature)))
    }

    /// Returns the ready-to-paint fill, or `None` when nothing would show.
    #[must_use]
    pub fn paint(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Paint> {
        if self.state().status.visibility.is_never() {
            return None;
        }
        match &self.graphic {
            Some(graphic) => {
                let opacity = self.opacity(feature);
                if opacity <= 0.0 {
                    return None;
                }
                let tile = graphic.image(feature, coefficient)?;
                if opacity >= 1.0 {
                    return Some(Paint::Pattern(tile));
                }
                let mut tile = (*tile).clone();
                raster::apply_opacity(&mut tile, opacity);
                Some(Paint::Pattern(Arc::new(tile)))
            }
            None => self
                .color(feature)
                .filter(|c| !c.is_transparent())
                .map(Paint::Solid),
        }
    }
}

impl StyleCache for FillCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || match &self.graphic {
            Some(graphic) => graphic.is_visible(feature) && self.opacity(Some(feature)) > 0.0,
            None => self
                .color(Some(feature))
                .is_some_and(|c| !c.is_transparent()),
        })
    }
}
