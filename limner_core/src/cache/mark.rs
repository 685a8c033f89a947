// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Well-known mark shapes.

use core::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape};

use super::{
    CacheContext, CacheStatus, FillCache, SimpleStrokeCache, StatusBuilder, StrokeCache,
    StyleCache, Visibility, visible_with,
};
use crate::error::CacheError;
use crate::expr::Feature;
use crate::paint::Color;
use crate::raster::{self, MarkPaint};
use crate::style::{Fill, Mark, Stroke};

/// A mark shape this crate can draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkShape {
    /// Axis-aligned square.
    Square,
    /// Circle.
    Circle,
    /// Upward equilateral-ish triangle.
    Triangle,
    /// Five-pointed star.
    Star,
    /// Plus sign.
    Cross,
    /// Diagonal cross.
    X,
    /// Arrow pointing right.
    Arrow,
}

impl MarkShape {
    /// Parses a well-known name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => Some(Self::Square),
            "circle" => Some(Self::Circle),
            "triangle" => Some(Self::Triangle),
            "star" => Some(Self::Star),
            "cross" => Some(Self::Cross),
            "x" => Some(Self::X),
            "arrow" => Some(Self::Arrow),
            _ => None,
        }
    }

    /// Returns the outline for a mark of height `size`, centered on the
    /// origin.
    #[must_use]
    pub fn path(self, size: f64) -> BezPath {
        let r = size / 2.0;
        match self {
            Self::Square => Rect::new(-r, -r, r, r).to_path(0.1),
            Self::Circle => Circle::new(Point::ORIGIN, r).to_path(0.01),
            Self::Triangle => polygon(&[(0.0, -1.0), (1.0, 1.0), (-1.0, 1.0)], r),
            Self::Star => {
                let points: Vec<_> = (0..10)
                    .map(|i| {
                        let radius = if i % 2 == 0 { 1.0 } else { 0.382 };
                        let angle = -PI / 2.0 + f64::from(i) * PI / 5.0;
                        (radius * angle.cos(), radius * angle.sin())
                    })
                    .collect();
                polygon(&points, r)
            }
            Self::Cross => polygon(&CROSS, r),
            Self::X => {
                let mut path = polygon(&CROSS, r);
                path.apply_affine(Affine::rotate(PI / 4.0));
                path
            }
            Self::Arrow => polygon(
                &[
                    (-1.0, -0.2),
                    (0.2, -0.2),
                    (0.2, -0.7),
                    (1.0, 0.0),
                    (0.2, 0.7),
                    (0.2, 0.2),
                    (-1.0, 0.2),
                ],
                r,
            ),
        }
    }
}

const CROSS: [(f64, f64); 12] = [
    (-0.2, -1.0),
    (0.2, -1.0),
    (0.2, -0.2),
    (1.0, -0.2),
    (1.0, 0.2),
    (0.2, 0.2),
    (0.2, 1.0),
    (-0.2, 1.0),
    (-0.2, 0.2),
    (-1.0, 0.2),
    (-1.0, -0.2),
    (-0.2, -0.2),
];

fn polygon(points: &[(f64, f64)], scale: f64) -> BezPath {
    let mut path = BezPath::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let p = Point::new(x * scale, y * scale);
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Caches a [`Mark`]: its shape name plus nested fill and stroke.
///
/// A mark with neither fill nor stroke is drawn with the default gray fill
/// and black outline. The mark is visible when either part is. Only pen
/// strokes outline a mark; a graphic stroke is ignored.
#[derive(Debug)]
pub struct MarkCache {
    mark: Arc<Mark>,
    context: Arc<CacheContext>,
    fill: Option<FillCache>,
    stroke: Option<StrokeCache>,
    state: OnceLock<MarkState>,
}

#[derive(Debug)]
struct MarkState {
    status: CacheStatus,
    error: Option<CacheError>,
    shape: Option<MarkShape>,
}

impl MarkCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(mark: Arc<Mark>, context: Arc<CacheContext>) -> Self {
        let (fill, stroke) = if mark.fill.is_none() && mark.stroke.is_none() {
            (
                Some(Arc::new(Fill::solid(Color::GRAY))),
                Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
            )
        } else {
            (mark.fill.clone(), mark.stroke.clone())
        };
        Self {
            fill: fill.map(|f| FillCache::new(f, context.clone())),
            stroke: stroke.map(|s| StrokeCache::new(s, context.clone())),
            mark,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &MarkState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let name = self.mark.well_known_name.as_ref();
            let mut b = StatusBuilder::new(oracle);
            let name_static = b.expression(name);
            let shape = if name_static {
                let text = oracle.evaluate_text(name, None);
                let text = text.as_deref().unwrap_or("square");
                match MarkShape::parse(text) {
                    Some(shape) => Some(shape),
                    None => {
                        tracing::debug!(name = text, "skipping mark with unknown shape");
                        return MarkState {
                            status: CacheStatus::NEVER,
                            error: Some(CacheError::UnknownMark(text.to_owned())),
                            shape: None,
                        };
                    }
                }
            } else {
                None
            };

            let fill = self.fill.as_ref().map(StyleCache::status);
            let stroke = self.pen().map(StyleCache::status);
            let mut visibility = Visibility::Never;
            for part in fill.into_iter().chain(stroke) {
                b.absorb_attributes(part);
                visibility = visibility.or(part.visibility);
            }
            if !name_static {
                visibility = visibility.escalate_to_dynamic();
            }
            b.override_visibility(visibility);
            let status = b.finish();
            tracing::trace!(?status, "evaluated mark");
            MarkState {
                status,
                error: None,
                shape,
            }
        })
    }

    /// Returns `false` if the name is static and not a known shape.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state().error.is_none()
    }

    /// Returns why the mark cannot be drawn, if its static name is unknown.
    #[must_use]
    pub fn error(&self) -> Option<&CacheError> {
        self.state().error.as_ref()
    }

    fn pen(&self) -> Option<&SimpleStrokeCache> {
        self.stroke.as_ref().and_then(StrokeCache::as_simple)
    }

    /// Resolves the shape for `feature`; `None` if the name is unknown.
    #[must_use]
    pub fn shape(&self, feature: Option<&dyn Feature>) -> Option<MarkShape> {
        let state = self.state();
        if state.error.is_some() {
            return None;
        }
        state.shape.or_else(|| {
            let name = self
                .context
                .oracle
                .evaluate_text(self.mark.well_known_name.as_ref(), feature);
            MarkShape::parse(name.as_deref().unwrap_or("square"))
        })
    }

    /// Returns the nested fill cache.
    #[must_use]
    pub fn fill(&self) -> Option<&FillCache> {
        self.fill.as_ref()
    }

    /// Returns the nested stroke cache.
    #[must_use]
    pub fn stroke(&self) -> Option<&StrokeCache> {
        self.stroke.as_ref()
    }

    /// Returns half the outline width, scaled.
    #[must_use]
    pub fn stroke_margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        self.pen().map_or(0.0, |s| s.margin(feature, coefficient))
    }

    /// Draws the mark at height `size` pixels, rotated clockwise by
    /// `rotation` degrees.
    pub(crate) fn render(
        &self,
        feature: Option<&dyn Feature>,
        size: f64,
        rotation: f64,
        coefficient: f64,
    ) -> Option<RgbaImage> {
        let shape = self.shape(feature)?;
        let fill = self
            .fill
            .as_ref()
            .and_then(|f| f.paint(feature, coefficient));
        let stroke = self.pen().and_then(|pen| {
            let paint = pen.paint(feature, coefficient)?;
            Some((pen.width(feature) * coefficient, paint))
        });
        let paint = MarkPaint {
            fill: fill.as_ref(),
            stroke: stroke.as_ref().map(|(w, p)| (*w, p)),
        };
        let config = &self.context.config;
        raster::rasterize_mark(
            &shape.path(size),
            &paint,
            rotation,
            config.supersampling,
            config.max_image_dimension,
        )
    }
}

impl StyleCache for MarkCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.shape(Some(feature)).is_some()
                && (self.fill.as_ref().is_some_and(|f| f.is_visible(feature))
                    || self.pen().is_some_and(|s| s.is_visible(feature)))
        })
    }
}
