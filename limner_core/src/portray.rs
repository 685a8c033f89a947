// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Portrayal: turning symbolizer caches into paint calls.
//!
//! Renderers never rasterize geometry themselves. They resolve every style
//! value for a feature through its cache and hand a ready-to-paint style to
//! a [`Canvas`], which may be a real rasterizer, a display-list recorder or a
//! test double.
//!
//! The registry keeps one [`SymbolizerRenderer`] per [`SymbolizerKind`];
//! look it up with
//! [`CacheRegistry::find_handler`](crate::registry::CacheRegistry::find_handler).
//!
//! ```rust,ignore
//! for symbolizer in rule_cache.symbolizers() {
//!     if let Some(renderer) = registry.find_handler(symbolizer.kind()) {
//!         renderer.portray(symbolizer, &feature, coefficient, &mut canvas);
//!     }
//! }
//! ```

use core::fmt;
use std::sync::Arc;

use image::RgbaImage;
use kurbo::{BezPath, ParamCurve, ParamCurveArclen, Point, Vec2};

use crate::cache::{Placement, StrokeCache, StyleCache};
use crate::expr::Feature;
use crate::geometry::Geometry;
use crate::paint::{FontSpec, Paint};
use crate::style::SymbolizerKind;
use crate::symbolizer::{LineSymbolizerCache, PolygonSymbolizerCache, SymbolizerCache};

/// Style of an area fill.
#[derive(Clone, Debug, PartialEq)]
pub struct FillStyle {
    /// Interior paint.
    pub paint: Paint,
}

/// Style of a pen stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Pen geometry (width, joins, caps, dashes), already scaled.
    pub stroke: Arc<kurbo::Stroke>,
    /// Pen paint.
    pub paint: Paint,
    /// Offset perpendicular to the path, in pixels. Positive is left of the
    /// direction of travel.
    pub perpendicular_offset: f64,
}

/// Style of a point symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolStyle {
    /// The rendered symbol, rotation and opacity applied.
    pub image: Arc<RgbaImage>,
    /// Point of the image placed on the position, as fractions of its
    /// extent.
    pub anchor: Point,
    /// Extra pixel displacement.
    pub displacement: Vec2,
}

/// Style of a label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelStyle {
    /// Text to draw.
    pub text: Arc<str>,
    /// Resolved font, size already scaled.
    pub font: Arc<FontSpec>,
    /// Glyph paint.
    pub paint: Paint,
    /// Halo radius and paint.
    pub halo: Option<(f64, Paint)>,
    /// Resolved placement.
    pub placement: Placement,
}

/// A paint target.
pub trait Canvas {
    /// Fills an area.
    fn fill(&mut self, geometry: &Geometry, style: &FillStyle);

    /// Strokes a path or an area's boundary.
    fn stroke(&mut self, geometry: &Geometry, style: &StrokeStyle);

    /// Draws a symbol at a position.
    fn draw_symbol(&mut self, position: Point, style: &SymbolStyle);

    /// Draws a label for a geometry.
    fn draw_label(&mut self, geometry: &Geometry, style: &LabelStyle);

    /// Composites the coverage covering `footprint`.
    fn draw_coverage(&mut self, footprint: &Geometry, opacity: f64);
}

/// Paints one kind of symbolizer cache.
pub trait SymbolizerRenderer: fmt::Debug + Send + Sync {
    /// The kind this renderer handles.
    fn kind(&self) -> SymbolizerKind;

    /// Paints `cache` for `feature` with every pixel quantity scaled by
    /// `coefficient`.
    ///
    /// Does nothing when the cache is of another kind, the feature has no
    /// suitable geometry, or nothing would be visible.
    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    );
}

/// Returns the built-in renderers in [`SymbolizerKind::ALL`] order.
#[must_use]
pub fn default_renderers() -> [Arc<dyn SymbolizerRenderer>; 5] {
    [
        Arc::new(PointRenderer),
        Arc::new(LineRenderer),
        Arc::new(PolygonRenderer),
        Arc::new(RasterRenderer),
        Arc::new(TextRenderer),
    ]
}

fn mismatch(expected: SymbolizerKind, cache: &SymbolizerCache) {
    tracing::debug!(?expected, found = ?cache.kind(), "renderer received another kind");
}

/// Draws the graphic of a point symbolizer at the feature's anchor.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointRenderer;

impl SymbolizerRenderer for PointRenderer {
    fn kind(&self) -> SymbolizerKind {
        SymbolizerKind::Point
    }

    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        let SymbolizerCache::Point(cache) = cache else {
            return mismatch(self.kind(), cache);
        };
        let Some(geometry) = feature.geometry() else {
            return;
        };
        if !cache.is_visible(feature) {
            return;
        }
        let graphic = cache.graphic();
        let Some(image) = graphic.image(Some(feature), coefficient) else {
            return;
        };
        let style = SymbolStyle {
            image,
            anchor: graphic.anchor(Some(feature)),
            displacement: graphic.displacement(Some(feature), coefficient),
        };
        canvas.draw_symbol(geometry.anchor(), &style);
    }
}

/// Strokes the line of a line symbolizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineRenderer;

impl LineRenderer {
    fn draw(
        cache: &LineSymbolizerCache,
        geometry: &Geometry,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        if matches!(geometry, Geometry::Point(_)) || !cache.is_visible(feature) {
            return;
        }
        if let Some(stroke) = cache.stroke() {
            let offset = cache.perpendicular_offset(Some(feature), coefficient);
            draw_stroke(stroke, geometry, offset, feature, coefficient, canvas);
        }
    }
}

impl SymbolizerRenderer for LineRenderer {
    fn kind(&self) -> SymbolizerKind {
        SymbolizerKind::Line
    }

    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        let SymbolizerCache::Line(cache) = cache else {
            return mismatch(self.kind(), cache);
        };
        if let Some(geometry) = feature.geometry() {
            Self::draw(cache, geometry, feature, coefficient, canvas);
        }
    }
}

/// Fills, then outlines, the area of a polygon symbolizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolygonRenderer;

impl PolygonRenderer {
    fn draw(
        cache: &PolygonSymbolizerCache,
        geometry: &Geometry,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        if !matches!(geometry, Geometry::Polygon(_)) || !cache.is_visible(feature) {
            return;
        }
        let displacement = cache.displacement(Some(feature), coefficient);
        let moved;
        let geometry = if displacement == Vec2::ZERO {
            geometry
        } else {
            moved = geometry.translated(displacement);
            &moved
        };
        if let Some(paint) = cache.fill().and_then(|f| f.paint(Some(feature), coefficient)) {
            canvas.fill(geometry, &FillStyle { paint });
        }
        if let Some(stroke) = cache.stroke() {
            let offset = cache.perpendicular_offset(Some(feature), coefficient);
            draw_stroke(stroke, geometry, offset, feature, coefficient, canvas);
        }
    }
}

impl SymbolizerRenderer for PolygonRenderer {
    fn kind(&self) -> SymbolizerKind {
        SymbolizerKind::Polygon
    }

    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        let SymbolizerCache::Polygon(cache) = cache else {
            return mismatch(self.kind(), cache);
        };
        if let Some(geometry) = feature.geometry() {
            Self::draw(cache, geometry, feature, coefficient, canvas);
        }
    }
}

/// Composites a coverage over the feature's footprint, then its outline.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterRenderer;

impl SymbolizerRenderer for RasterRenderer {
    fn kind(&self) -> SymbolizerKind {
        SymbolizerKind::Raster
    }

    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        let SymbolizerCache::Raster(cache) = cache else {
            return mismatch(self.kind(), cache);
        };
        let Some(footprint) = feature.geometry() else {
            return;
        };
        if !cache.is_visible(feature) {
            return;
        }
        let opacity = cache.opacity(Some(feature));
        if opacity > 0.0 {
            canvas.draw_coverage(footprint, opacity);
        }
        match cache.outline() {
            Some(SymbolizerCache::Line(line)) => {
                LineRenderer::draw(line, footprint, feature, coefficient, canvas);
            }
            Some(SymbolizerCache::Polygon(polygon)) => {
                PolygonRenderer::draw(polygon, footprint, feature, coefficient, canvas);
            }
            _ => {}
        }
    }
}

/// Hands the resolved label of a text symbolizer to the canvas.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextRenderer;

impl SymbolizerRenderer for TextRenderer {
    fn kind(&self) -> SymbolizerKind {
        SymbolizerKind::Text
    }

    fn portray(
        &self,
        cache: &SymbolizerCache,
        feature: &dyn Feature,
        coefficient: f64,
        canvas: &mut dyn Canvas,
    ) {
        let SymbolizerCache::Text(cache) = cache else {
            return mismatch(self.kind(), cache);
        };
        let Some(geometry) = feature.geometry() else {
            return;
        };
        let feature = Some(feature);
        let (Some(text), Some(font), Some(paint)) = (
            cache.label(feature),
            cache.font(feature, coefficient),
            cache.paint(feature, coefficient),
        ) else {
            return;
        };
        let style = LabelStyle {
            text,
            font,
            paint,
            halo: cache.halo().and_then(|h| h.resolve(feature, coefficient)),
            placement: cache.placement().placement(feature, coefficient),
        };
        canvas.draw_label(geometry, &style);
    }
}

fn draw_stroke(
    stroke: &StrokeCache,
    geometry: &Geometry,
    perpendicular_offset: f64,
    feature: &dyn Feature,
    coefficient: f64,
    canvas: &mut dyn Canvas,
) {
    let feature = Some(feature);
    match stroke {
        StrokeCache::Simple(simple) => {
            let (Some(pen), Some(paint)) = (
                simple.stroke(feature, coefficient),
                simple.paint(feature, coefficient),
            ) else {
                return;
            };
            let style = StrokeStyle {
                stroke: pen,
                paint,
                perpendicular_offset,
            };
            canvas.stroke(geometry, &style);
        }
        StrokeCache::Graphic(graphic_stroke) => {
            let path = match geometry {
                Geometry::LineString(path) | Geometry::Polygon(path) => path,
                Geometry::Point(_) => return,
            };
            let graphic = graphic_stroke.graphic();
            let Some(image) = graphic.image(feature, coefficient) else {
                return;
            };
            let spacing = f64::from(image.width()) + graphic_stroke.gap(feature, coefficient);
            let style = SymbolStyle {
                anchor: graphic.anchor(feature),
                displacement: graphic.displacement(feature, coefficient),
                image,
            };
            let start = graphic_stroke.initial_gap(feature, coefficient);
            for position in points_along(path, start, spacing) {
                canvas.draw_symbol(position, &style);
            }
        }
    }
}

const ARCLEN_ACCURACY: f64 = 1e-3;
const MAX_REPETITIONS: usize = 10_000;

/// Returns the points at arc length `start`, `start + spacing`, ... along
/// `path`, subpath after subpath.
pub(crate) fn points_along(path: &BezPath, start: f64, spacing: f64) -> Vec<Point> {
    let mut out = Vec::new();
    let mut next = start.max(0.0);
    let mut travelled = 0.0;
    for segment in path.segments() {
        let length = segment.arclen(ARCLEN_ACCURACY);
        while next <= travelled + length {
            let t = segment.inv_arclen(next - travelled, ARCLEN_ACCURACY);
            out.push(segment.eval(t));
            if spacing <= 0.0 || out.len() >= MAX_REPETITIONS {
                return out;
            }
            next += spacing;
        }
        travelled += length;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Visibility;
    use crate::expr::{Expression, SimpleFeature};
    use crate::paint::Color;
    use crate::registry::CacheRegistry;
    use crate::style::{
        Displacement, Fill, Graphic, GraphicStroke, Halo, LineSymbolizer, PointSymbolizer,
        PolygonSymbolizer, RasterSymbolizer, Stroke, Symbolizer, TextSymbolizer,
    };

    #[derive(Debug, PartialEq)]
    enum Call {
        Fill(Geometry, Paint),
        Stroke(Geometry, f64, f64),
        Symbol(Point, u32),
        Label(Arc<str>, f64, bool),
        Coverage(f64),
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl Canvas for Recorder {
        fn fill(&mut self, geometry: &Geometry, style: &FillStyle) {
            self.0.push(Call::Fill(geometry.clone(), style.paint.clone()));
        }

        fn stroke(&mut self, geometry: &Geometry, style: &StrokeStyle) {
            self.0.push(Call::Stroke(
                geometry.clone(),
                style.stroke.width,
                style.perpendicular_offset,
            ));
        }

        fn draw_symbol(&mut self, position: Point, style: &SymbolStyle) {
            self.0.push(Call::Symbol(position, style.image.width()));
        }

        fn draw_label(&mut self, _geometry: &Geometry, style: &LabelStyle) {
            self.0
                .push(Call::Label(style.text.clone(), style.font.size, style.halo.is_some()));
        }

        fn draw_coverage(&mut self, _footprint: &Geometry, opacity: f64) {
            self.0.push(Call::Coverage(opacity));
        }
    }

    fn portray(symbolizer: Symbolizer, feature: &SimpleFeature, coefficient: f64) -> Vec<Call> {
        let registry = CacheRegistry::default();
        let cache = registry
            .get_symbolizer(&Arc::new(symbolizer))
            .expect("cache");
        let renderer = registry.find_handler(cache.kind()).expect("handler");
        let mut canvas = Recorder::default();
        renderer.portray(&cache, feature, coefficient, &mut canvas);
        canvas.0
    }

    fn square() -> Geometry {
        Geometry::polygon(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    fn segment() -> Geometry {
        Geometry::line_string(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)])
    }

    #[test]
    fn point_draws_default_square() {
        let feature = SimpleFeature::new().with_geometry(Geometry::Point(Point::new(3.0, 4.0)));
        let calls = portray(Symbolizer::Point(PointSymbolizer::default()), &feature, 1.0);
        assert_eq!(calls, [Call::Symbol(Point::new(3.0, 4.0), 7)]);
    }

    #[test]
    fn line_strokes_scaled_pen_with_offset() {
        let line = LineSymbolizer {
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 2.0))),
            perpendicular_offset: Some(Expression::number(1.5)),
        };
        let feature = SimpleFeature::new().with_geometry(segment());
        let calls = portray(Symbolizer::Line(line), &feature, 2.0);
        assert_eq!(calls, [Call::Stroke(segment(), 4.0, 3.0)]);
    }

    #[test]
    fn line_skips_points_and_invisible_features() {
        let line = LineSymbolizer {
            stroke: Some(Arc::new(
                Stroke::solid(Color::BLACK, 1.0).with_width(Expression::property("w")),
            )),
            perpendicular_offset: None,
        };
        let on_point = SimpleFeature::new()
            .with_attribute("w", 1.0)
            .with_geometry(Geometry::Point(Point::ORIGIN));
        assert!(portray(Symbolizer::Line(line.clone()), &on_point, 1.0).is_empty());

        let zero = SimpleFeature::new()
            .with_attribute("w", 0.0)
            .with_geometry(segment());
        assert!(portray(Symbolizer::Line(line), &zero, 1.0).is_empty());
    }

    #[test]
    fn graphic_stroke_repeats_symbols() {
        let stroke = Stroke {
            graphic_stroke: Some(Arc::new(GraphicStroke {
                graphic: Arc::new(Graphic::default()),
                initial_gap: None,
                gap: Some(Expression::number(13.0)),
            })),
            ..Stroke::default()
        };
        let line = LineSymbolizer {
            stroke: Some(Arc::new(stroke)),
            perpendicular_offset: None,
        };
        let feature = SimpleFeature::new().with_geometry(segment());
        let calls = portray(Symbolizer::Line(line), &feature, 1.0);
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[1], Call::Symbol(Point::new(20.0, 0.0), 7));
    }

    #[test]
    fn polygon_fills_then_strokes_displaced() {
        let polygon = PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::WHITE))),
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
            displacement: Some(Arc::new(Displacement::constant(5.0, 0.0))),
            perpendicular_offset: None,
        };
        let feature = SimpleFeature::new().with_geometry(square());
        let calls = portray(Symbolizer::Polygon(polygon), &feature, 1.0);
        let moved = square().translated(Vec2::new(5.0, 0.0));
        assert_eq!(
            calls,
            [
                Call::Fill(moved.clone(), Paint::Solid(Color::WHITE)),
                Call::Stroke(moved, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn polygon_with_only_visible_stroke_skips_fill() {
        let polygon = PolygonSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::TRANSPARENT))),
            stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
            ..PolygonSymbolizer::default()
        };
        let feature = SimpleFeature::new().with_geometry(square());
        let calls = portray(Symbolizer::Polygon(polygon), &feature, 1.0);
        assert_eq!(calls, [Call::Stroke(square(), 1.0, 0.0)]);
    }

    #[test]
    fn raster_draws_coverage_and_outline() {
        let raster = RasterSymbolizer {
            opacity: Some(Expression::number(0.25)),
            outline: Some(Arc::new(Symbolizer::Line(LineSymbolizer {
                stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 1.0))),
                perpendicular_offset: None,
            }))),
        };
        let feature = SimpleFeature::new().with_geometry(square());
        let calls = portray(Symbolizer::Raster(raster), &feature, 1.0);
        assert_eq!(
            calls,
            [Call::Coverage(0.25), Call::Stroke(square(), 1.0, 0.0)]
        );
    }

    #[test]
    fn raster_without_coverage_still_outlines() {
        let raster = RasterSymbolizer {
            opacity: Some(Expression::number(0.0)),
            outline: Some(Arc::new(Symbolizer::Line(LineSymbolizer {
                stroke: Some(Arc::new(Stroke::solid(Color::BLACK, 2.0))),
                perpendicular_offset: None,
            }))),
        };
        let feature = SimpleFeature::new().with_geometry(square());
        let calls = portray(Symbolizer::Raster(raster), &feature, 1.0);
        assert_eq!(calls, [Call::Stroke(square(), 2.0, 0.0)]);
    }

    #[test]
    fn text_resolves_label_font_and_halo() {
        let text = TextSymbolizer {
            label: Some(Expression::property("name")),
            halo: Some(Arc::new(Halo::default())),
            ..TextSymbolizer::default()
        };
        let feature = SimpleFeature::new()
            .with_attribute("name", "Oslo")
            .with_geometry(Geometry::Point(Point::ORIGIN));
        let calls = portray(Symbolizer::Text(text.clone()), &feature, 2.0);
        assert_eq!(calls, [Call::Label(Arc::from("Oslo"), 20.0, true)]);

        let unnamed = SimpleFeature::new().with_geometry(Geometry::Point(Point::ORIGIN));
        assert!(portray(Symbolizer::Text(text), &unnamed, 1.0).is_empty());
    }

    #[test]
    fn renderer_ignores_other_kinds() {
        let registry = CacheRegistry::default();
        let cache = registry
            .get_symbolizer(&Arc::new(Symbolizer::Point(PointSymbolizer::default())))
            .expect("cache");
        assert_eq!(cache.visibility(), Visibility::Always);
        let feature = SimpleFeature::new().with_geometry(Geometry::Point(Point::ORIGIN));
        let mut canvas = Recorder::default();
        LineRenderer.portray(&cache, &feature, 1.0, &mut canvas);
        assert!(canvas.0.is_empty());
    }

    #[test]
    fn points_along_spans_subpaths() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.move_to((0.0, 5.0));
        path.line_to((10.0, 5.0));
        let points = points_along(&path, 2.0, 5.0);
        assert_eq!(points.len(), 4);
        assert!((points[2].x - 2.0).abs() < 1e-6 && (points[2].y - 5.0).abs() < 1e-6);
        assert_eq!(points_along(&path, 3.0, 0.0).len(), 1);
    }
}
