// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line paint.

use std::sync::{Arc, OnceLock};

use kurbo::{Cap, Join};

use super::{CacheContext, CacheStatus, GraphicCache, StatusBuilder, StyleCache, visible_with};
use crate::expr::{Expression, Feature};
use crate::paint::{Color, Paint};
use crate::raster;
use crate::style::{GraphicStroke, Stroke};

/// Caches a [`Stroke`].
///
/// A stroke with a graphic stroke repeats that graphic along the line
/// ([`Graphic`](Self::Graphic)); any other stroke is painted with a pen
/// ([`Simple`](Self::Simple)).
#[derive(Debug)]
pub enum StrokeCache {
    /// A painted pen stroke.
    Simple(SimpleStrokeCache),
    /// A graphic repeated along the line.
    Graphic(GraphicStrokeCache),
}

impl StrokeCache {
    /// Creates the cache matching `stroke`. Nothing is evaluated yet.
    #[must_use]
    pub fn new(stroke: Arc<Stroke>, context: Arc<CacheContext>) -> Self {
        match stroke.graphic_stroke.clone() {
            Some(graphic) => Self::Graphic(GraphicStrokeCache::new(graphic, context)),
            None => Self::Simple(SimpleStrokeCache::new(stroke, context)),
        }
    }

    /// Returns the pen stroke cache, if this is one.
    #[must_use]
    pub fn as_simple(&self) -> Option<&SimpleStrokeCache> {
        match self {
            Self::Simple(s) => Some(s),
            Self::Graphic(_) => None,
        }
    }

    /// Returns the graphic stroke cache, if this is one.
    #[must_use]
    pub fn as_graphic(&self) -> Option<&GraphicStrokeCache> {
        match self {
            Self::Graphic(g) => Some(g),
            Self::Simple(_) => None,
        }
    }

    /// Returns how far the stroke reaches beyond the geometry, in pixels.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        match self {
            Self::Simple(s) => s.margin(feature, coefficient),
            Self::Graphic(g) => g.margin(feature, coefficient),
        }
    }
}

impl StyleCache for StrokeCache {
    fn status(&self) -> &CacheStatus {
        match self {
            Self::Simple(s) => s.status(),
            Self::Graphic(g) => g.status(),
        }
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        match self {
            Self::Simple(s) => s.is_visible(feature),
            Self::Graphic(g) => g.is_visible(feature),
        }
    }
}

/// Caches a pen [`Stroke`]: paint, width, joins, caps and dashes.
#[derive(Debug)]
pub struct SimpleStrokeCache {
    stroke: Arc<Stroke>,
    context: Arc<CacheContext>,
    graphic: Option<GraphicCache>,
    state: OnceLock<SimpleStrokeState>,
}

#[derive(Debug)]
struct SimpleStrokeState {
    status: CacheStatus,
    color: Option<Color>,
    opacity: Option<f64>,
    width: Option<f64>,
    join: Option<Join>,
    cap: Option<Cap>,
    dash_offset: Option<f64>,
    shared: Option<Arc<kurbo::Stroke>>,
}

fn parse_join(text: &str) -> Option<Join> {
    match text.trim().to_ascii_lowercase().as_str() {
        "miter" | "mitre" => Some(Join::Miter),
        "round" => Some(Join::Round),
        "bevel" => Some(Join::Bevel),
        _ => None,
    }
}

fn parse_cap(text: &str) -> Option<Cap> {
    match text.trim().to_ascii_lowercase().as_str() {
        "butt" => Some(Cap::Butt),
        "round" => Some(Cap::Round),
        "square" => Some(Cap::Square),
        _ => None,
    }
}

impl SimpleStrokeCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(stroke: Arc<Stroke>, context: Arc<CacheContext>) -> Self {
        Self {
            graphic: stroke
                .graphic_fill
                .clone()
                .map(|g| GraphicCache::new(g, context.clone())),
            stroke,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &SimpleStrokeState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let s = &*self.stroke;
            let mut b = StatusBuilder::new(oracle);
            let mut number = |expr: Option<&Expression>, default: f64| {
                b.expression(expr)
                    .then(|| oracle.evaluate_f64(expr, None, default))
            };
            let opacity = number(s.opacity.as_ref(), 1.0);
            let width = number(s.width.as_ref(), 1.0);
            let dash_offset = number(s.dash_offset.as_ref(), 0.0);
            if opacity.is_some_and(|o| o <= 0.0) || width.is_some_and(|w| w <= 0.0) {
                b.mark_never();
            }

            let color = match &self.graphic {
                Some(graphic) => {
                    b.absorb(graphic.status());
                    None
                }
                None => {
                    let expr = s.color.as_ref();
                    let color = b
                        .expression(expr)
                        .then(|| oracle.evaluate_color(expr, None, Color::BLACK));
                    let folded = color.map(|c| c.with_opacity(opacity.unwrap_or(1.0)));
                    if folded.is_some_and(Color::is_transparent) {
                        b.mark_never();
                    }
                    color
                }
            };
            let join = b
                .expression(s.line_join.as_ref())
                .then(|| self.join(None));
            let cap = b.expression(s.line_cap.as_ref()).then(|| self.cap(None));

            let status = b.finish();
            tracing::trace!(?status, "evaluated stroke");
            if status.visibility.is_never() {
                return SimpleStrokeState {
                    status,
                    color: None,
                    opacity: None,
                    width: None,
                    join: None,
                    cap: None,
                    dash_offset: None,
                    shared: None,
                };
            }
            let shared = status.is_static.then(|| {
                Arc::new(self.build(
                    width.unwrap_or(1.0),
                    join.unwrap_or(Join::Miter),
                    cap.unwrap_or(Cap::Butt),
                    dash_offset.unwrap_or(0.0),
                    1.0,
                ))
            });
            SimpleStrokeState {
                status,
                color,
                opacity,
                width,
                join,
                cap,
                dash_offset,
                shared,
            }
        })
    }

    fn join(&self, feature: Option<&dyn Feature>) -> Join {
        self.context
            .oracle
            .evaluate_text(self.stroke.line_join.as_ref(), feature)
            .and_then(|t| parse_join(&t))
            .unwrap_or(Join::Miter)
    }

    fn cap(&self, feature: Option<&dyn Feature>) -> Cap {
        self.context
            .oracle
            .evaluate_text(self.stroke.line_cap.as_ref(), feature)
            .and_then(|t| parse_cap(&t))
            .unwrap_or(Cap::Butt)
    }

    fn build(
        &self,
        width: f64,
        join: Join,
        cap: Cap,
        dash_offset: f64,
        coefficient: f64,
    ) -> kurbo::Stroke {
        let stroke = kurbo::Stroke::new(width * coefficient)
            .with_join(join)
            .with_caps(cap);
        match &self.stroke.dash_array {
            Some(dashes) if dashes.iter().any(|d| *d > 0.0) && dashes.iter().all(|d| *d >= 0.0) => {
                stroke.with_dashes(
                    dash_offset * coefficient,
                    dashes.iter().map(|d| d * coefficient),
                )
            }
            _ => stroke,
        }
    }

    /// Returns the nested pattern graphic cache, if any.
    #[must_use]
    pub fn graphic(&self) -> Option<&GraphicCache> {
        self.graphic.as_ref()
    }

    /// Returns the unscaled width for `feature`.
    #[must_use]
    pub fn width(&self, feature: Option<&dyn Feature>) -> f64 {
        let state = self.state();
        if state.status.visibility.is_never() {
            return 0.0;
        }
        state.width.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.stroke.width.as_ref(), feature, 1.0)
        })
    }

    /// Returns the opacity for `feature`.
    #[must_use]
    pub fn opacity(&self, feature: Option<&dyn Feature>) -> f64 {
        let state = self.state();
        if state.status.visibility.is_never() {
            return 0.0;
        }
        state.opacity.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.stroke.opacity.as_ref(), feature, 1.0)
        })
    }

    /// Returns the pen for `feature`, scaled by `coefficient`.
    ///
    /// A static stroke at coefficient 1 hands out the same shared pen.
    #[must_use]
    pub fn stroke(
        &self,
        feature: Option<&dyn Feature>,
        coefficient: f64,
    ) -> Option<Arc<kurbo::Stroke>> {
        let state = self.state();
        if state.status.visibility.is_never() {
            return None;
        }
        if coefficient == 1.0 {
            if let Some(shared) = &state.shared {
                return Some(shared.clone());
            }
        }
        let width = self.width(feature);
        if width <= 0.0 {
            return None;
        }
        let dash_offset = state.dash_offset.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.stroke.dash_offset.as_ref(), feature, 0.0)
        });
        Some(Arc::new(self.build(
            width,
            state.join.unwrap_or_else(|| self.join(feature)),
            state.cap.unwrap_or_else(|| self.cap(feature)),
            dash_offset,
            coefficient,
        )))
    }

    /// Returns the ready-to-paint stroke paint, or `None` when nothing would
    /// show.
    #[must_use]
    pub fn paint(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Paint> {
        let state = self.state();
        if state.status.visibility.is_never() {
            return None;
        }
        let opacity = self.opacity(feature);
        if opacity <= 0.0 {
            return None;
        }
        match &self.graphic {
            Some(graphic) => {
                let tile = graphic.image(feature, coefficient)?;
                if opacity >= 1.0 {
                    return Some(Paint::Pattern(tile));
                }
                let mut tile = (*tile).clone();
                raster::apply_opacity(&mut tile, opacity);
                Some(Paint::Pattern(Arc::new(tile)))
            }
            None => {
                let color = state.color.unwrap_or_else(|| {
                    self.context
                        .oracle
                        .evaluate_color(self.stroke.color.as_ref(), feature, Color::BLACK)
                });
                let color = color.with_opacity(opacity);
                (!color.is_transparent()).then_some(Paint::Solid(color))
            }
        }
    }

    /// Returns half the scaled width.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        (self.width(feature) * coefficient / 2.0).max(0.0)
    }
}

impl StyleCache for SimpleStrokeCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            if self.width(Some(feature)) <= 0.0 {
                return false;
            }
            match &self.graphic {
                Some(graphic) => graphic.is_visible(feature) && self.opacity(Some(feature)) > 0.0,
                None => self.paint(Some(feature), 1.0).is_some(),
            }
        })
    }
}

/// Caches a [`GraphicStroke`]: a graphic repeated along a line.
#[derive(Debug)]
pub struct GraphicStrokeCache {
    graphic_stroke: Arc<GraphicStroke>,
    context: Arc<CacheContext>,
    graphic: GraphicCache,
    state: OnceLock<GraphicStrokeState>,
}

#[derive(Debug)]
struct GraphicStrokeState {
    status: CacheStatus,
    gap: Option<f64>,
    initial_gap: Option<f64>,
}

impl GraphicStrokeCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(graphic_stroke: Arc<GraphicStroke>, context: Arc<CacheContext>) -> Self {
        Self {
            graphic: GraphicCache::new(graphic_stroke.graphic.clone(), context.clone()),
            graphic_stroke,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &GraphicStrokeState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let gs = &*self.graphic_stroke;
            let mut b = StatusBuilder::new(oracle);
            b.absorb(self.graphic.status());
            let gap = b
                .expression(gs.gap.as_ref())
                .then(|| oracle.evaluate_f64(gs.gap.as_ref(), None, 0.0));
            let initial_gap = b
                .expression(gs.initial_gap.as_ref())
                .then(|| oracle.evaluate_f64(gs.initial_gap.as_ref(), None, 0.0));
            GraphicStrokeState {
                status: b.finish(),
                gap,
                initial_gap,
            }
        })
    }

    /// Returns the repeated graphic's cache.
    #[must_use]
    pub fn graphic(&self) -> &GraphicCache {
        &self.graphic
    }

    /// Returns the distance between repetitions, scaled.
    #[must_use]
    pub fn gap(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let gap = self.state().gap.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.graphic_stroke.gap.as_ref(), feature, 0.0)
        });
        gap.max(0.0) * coefficient
    }

    /// Returns the distance before the first repetition, scaled.
    #[must_use]
    pub fn initial_gap(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let gap = self.state().initial_gap.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.graphic_stroke.initial_gap.as_ref(), feature, 0.0)
        });
        gap.max(0.0) * coefficient
    }

    /// Returns the graphic's margin.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        self.graphic.margin(feature, coefficient)
    }
}

impl StyleCache for GraphicStrokeCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || self.graphic.is_visible(feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Visibility;
    use crate::expr::SimpleFeature;
    use crate::style::{Graphic, GraphicalSymbol, Mark};

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    fn simple(stroke: Stroke) -> StrokeCache {
        StrokeCache::new(Arc::new(stroke), context())
    }

    #[test]
    fn margin_grows_with_width() {
        let mut previous = 0.0;
        for width in 1..=5 {
            let cache = simple(Stroke::solid(Color::BLACK, f64::from(width)));
            let margin = cache.margin(None, 1.0);
            assert!(margin > previous, "width {width} gave margin {margin}");
            previous = margin;
        }
        assert_eq!(previous, 2.5);
    }

    #[test]
    fn zero_width_is_never() {
        let cache = simple(Stroke::solid(Color::BLACK, 0.0));
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert_eq!(cache.margin(None, 1.0), 0.0);
        let simple = cache.as_simple().expect("pen stroke");
        assert!(simple.stroke(None, 1.0).is_none());
        assert!(simple.paint(None, 1.0).is_none());
    }

    #[test]
    fn static_pen_is_shared_at_unit_scale() {
        let stroke = Stroke {
            line_join: Some(Expression::text("round")),
            line_cap: Some(Expression::text("square")),
            dash_array: Some(vec![4.0, 2.0]),
            ..Stroke::solid(Color::BLACK, 2.0)
        };
        let cache = simple(stroke);
        let simple = cache.as_simple().expect("pen stroke");
        let a = simple.stroke(None, 1.0).expect("pen");
        let b = simple.stroke(None, 1.0).expect("pen");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.join, Join::Round);
        assert_eq!(a.start_cap, Cap::Square);
        assert_eq!(a.dash_pattern.as_slice(), &[4.0, 2.0]);

        let scaled = simple.stroke(None, 2.0).expect("pen");
        assert_eq!(scaled.width, 4.0);
        assert_eq!(scaled.dash_pattern.as_slice(), &[8.0, 4.0]);
    }

    #[test]
    fn dynamic_width_evaluates_per_feature() {
        let stroke = Stroke::solid(Color::BLACK, 1.0).with_width(Expression::property("width_mm"));
        let cache = simple(stroke);
        assert_eq!(cache.visibility(), Visibility::DependsOnFeature);
        assert!(cache.required_attributes().contains("width_mm"));

        let thick = SimpleFeature::new().with_attribute("width_mm", 6.0);
        let none = SimpleFeature::new().with_attribute("width_mm", 0.0);
        assert!(cache.is_visible(&thick));
        assert!(!cache.is_visible(&none));
        assert_eq!(cache.margin(Some(&thick), 0.5), 1.5);
    }

    #[test]
    fn transparent_color_is_never() {
        let cache = simple(Stroke::solid(Color::TRANSPARENT, 3.0));
        assert_eq!(cache.visibility(), Visibility::Never);
    }

    #[test]
    fn faint_opacity_rounding_to_zero_alpha_is_never() {
        let cache = simple(
            Stroke::solid(Color::BLACK, 2.0).with_opacity(Expression::number(0.001)),
        );
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert!(!cache.is_visible(&SimpleFeature::new()));
        assert_eq!(cache.margin(None, 1.0), 0.0);
        let pen = cache.as_simple().expect("simple");
        assert_eq!(pen.paint(None, 1.0), None);
    }

    #[test]
    fn graphic_stroke_uses_graphic_margin() {
        let graphic = Arc::new(Graphic::with_symbol(
            GraphicalSymbol::Mark(Arc::new(Mark::default_square())),
            10.0,
        ));
        let stroke = Stroke {
            graphic_stroke: Some(Arc::new(GraphicStroke {
                graphic: graphic.clone(),
                initial_gap: Some(Expression::number(2.0)),
                gap: Some(Expression::number(5.0)),
            })),
            ..Stroke::default()
        };
        let cache = simple(stroke);
        let graphic_stroke = cache.as_graphic().expect("graphic stroke");
        assert_eq!(graphic_stroke.gap(None, 2.0), 10.0);
        assert_eq!(graphic_stroke.initial_gap(None, 1.0), 2.0);
        assert!(cache.is_static());
        assert_eq!(
            cache.margin(None, 1.0),
            graphic_stroke.graphic().margin(None, 1.0)
        );
    }
}
