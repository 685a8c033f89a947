// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software rasterization of graphic symbols.
//!
//! Marks are vector shapes centered on the origin. They are drawn into a
//! square RGBA image large enough to hold the rotated shape plus half the
//! outline width on every side, with `supersampling²` samples per pixel.
//! External images are resampled to the requested height and rotated about
//! their center.

use core::f64::consts::SQRT_2;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::{Affine, BezPath, ParamCurveNearest, Point, Shape};

use crate::paint::{Color, Paint};

/// Upper bound on samples per pixel axis.
pub(crate) const MAX_SUPERSAMPLING: u8 = 8;

/// Paints for one mark rasterization.
pub(crate) struct MarkPaint<'a> {
    pub(crate) fill: Option<&'a Paint>,
    /// Outline width in pixels and its paint.
    pub(crate) stroke: Option<(f64, &'a Paint)>,
}

/// Rasterizes `shape` (already sized, centered on the origin) with a
/// clockwise `rotation` in degrees.
///
/// Returns `None` when nothing would be drawn.
pub(crate) fn rasterize_mark(
    shape: &BezPath,
    paint: &MarkPaint<'_>,
    rotation: f64,
    supersampling: u8,
    max_dimension: u32,
) -> Option<RgbaImage> {
    if paint.fill.is_none() && paint.stroke.is_none() {
        return None;
    }
    let half_width = paint.stroke.map_or(0.0, |(w, _)| w / 2.0);
    let bounds = shape.bounding_box().inflate(half_width, half_width);
    let mut extent = bounds.width().max(bounds.height());
    if !is_upright(rotation) {
        extent *= SQRT_2;
    }
    let dimension = pixel_extent(extent, max_dimension)?;
    let center = f64::from(dimension) / 2.0;
    let to_shape = (Affine::translate((center, center)) * Affine::rotate(rotation.to_radians()))
        .inverse();
    let segments: Vec<_> = shape.segments().collect();
    let samples = u32::from(supersampling.clamp(1, MAX_SUPERSAMPLING));
    let step = 1.0 / f64::from(samples);

    let mut image = RgbaImage::new(dimension, dimension);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let mut acc = Accumulator::default();
        for sy in 0..samples {
            for sx in 0..samples {
                let sample = Point::new(
                    f64::from(x) + (f64::from(sx) + 0.5) * step,
                    f64::from(y) + (f64::from(sy) + 0.5) * step,
                );
                let p = to_shape * sample;
                let color = match paint.stroke {
                    Some((width, stroke)) if distance_sq(&segments, p) <= (width / 2.0).powi(2) => {
                        Some(sample_paint(stroke, x, y))
                    }
                    _ => match paint.fill {
                        Some(fill) if shape.winding(p) != 0 => Some(sample_paint(fill, x, y)),
                        _ => None,
                    },
                };
                acc.add(color);
            }
        }
        *pixel = acc.finish(samples * samples);
    }
    Some(image)
}

/// Resamples `source` to `height` pixels (keeping its aspect ratio) and
/// rotates it clockwise by `rotation` degrees about its center.
pub(crate) fn transform_image(
    source: &RgbaImage,
    height: f64,
    rotation: f64,
    max_dimension: u32,
) -> Option<RgbaImage> {
    if source.height() == 0 || source.width() == 0 {
        return None;
    }
    let scale = height / f64::from(source.height());
    let w = pixel_extent(f64::from(source.width()) * scale, max_dimension)?;
    let h = pixel_extent(height, max_dimension)?;
    let resized = imageops::resize(source, w, h, FilterType::Triangle);
    if is_upright(rotation) {
        return Some(resized);
    }

    let dimension = pixel_extent(f64::from(w).hypot(f64::from(h)), max_dimension)?;
    let out_center = f64::from(dimension) / 2.0;
    let in_center = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let to_source = Affine::translate(in_center)
        * Affine::rotate(-rotation.to_radians())
        * Affine::translate((-out_center, -out_center));
    let mut rotated = RgbaImage::new(dimension, dimension);
    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        let p = to_source * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        if p.x >= 0.0 && p.y >= 0.0 && p.x < f64::from(w) && p.y < f64::from(h) {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "coordinates are checked to lie inside the image"
            )]
            let (sx, sy) = (p.x as u32, p.y as u32);
            *pixel = *resized.get_pixel(sx, sy);
        }
    }
    Some(rotated)
}

/// Multiplies every alpha value by `opacity`.
pub(crate) fn apply_opacity(image: &mut RgbaImage, opacity: f64) {
    if opacity >= 1.0 {
        return;
    }
    let factor = opacity.clamp(0.0, 1.0);
    for pixel in image.pixels_mut() {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is clamped to 0..=255 before the cast"
        )]
        let a = (f64::from(pixel[3]) * factor).round().clamp(0.0, 255.0) as u8;
        pixel[3] = a;
    }
}

fn is_upright(rotation: f64) -> bool {
    rotation.rem_euclid(360.0) == 0.0
}

fn pixel_extent(extent: f64, max_dimension: u32) -> Option<u32> {
    if !extent.is_finite() || extent <= 0.0 {
        return None;
    }
    let max = f64::from(max_dimension.max(1));
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is clamped to 1..=max_dimension before the cast"
    )]
    let pixels = extent.ceil().clamp(1.0, max) as u32;
    Some(pixels)
}

fn distance_sq(segments: &[kurbo::PathSeg], p: Point) -> f64 {
    segments
        .iter()
        .map(|seg| seg.nearest(p, 1e-3).distance_sq)
        .fold(f64::INFINITY, f64::min)
}

fn sample_paint(paint: &Paint, x: u32, y: u32) -> Color {
    match paint {
        Paint::Solid(color) => *color,
        Paint::Pattern(tile) if tile.width() > 0 && tile.height() > 0 => {
            let Rgba([r, g, b, a]) = *tile.get_pixel(x % tile.width(), y % tile.height());
            Color::rgba(r, g, b, a)
        }
        Paint::Pattern(_) => Color::TRANSPARENT,
    }
}

/// Box-filter accumulator over straight-alpha samples.
#[derive(Default)]
struct Accumulator {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl Accumulator {
    fn add(&mut self, color: Option<Color>) {
        let Some(c) = color else { return };
        let a = f64::from(c.a);
        self.r += f64::from(c.r) * a;
        self.g += f64::from(c.g) * a;
        self.b += f64::from(c.b) * a;
        self.a += a;
    }

    fn finish(&self, count: u32) -> Rgba<u8> {
        if self.a <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "channel averages lie in 0..=255"
        )]
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Rgba([
            channel(self.r / self.a),
            channel(self.g / self.a),
            channel(self.b / self.a),
            channel(self.a / f64::from(count)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn square(size: f64) -> BezPath {
        Rect::new(-size / 2.0, -size / 2.0, size / 2.0, size / 2.0).to_path(0.1)
    }

    #[test]
    fn filled_square_covers_center() {
        let fill = Paint::Solid(Color::rgb(255, 0, 0));
        let paint = MarkPaint {
            fill: Some(&fill),
            stroke: None,
        };
        let image = rasterize_mark(&square(8.0), &paint, 0.0, 2, 64).expect("image");
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(image.get_pixel(4, 4).0, [255, 0, 0, 255]);
    }

    #[test]
    fn supersampling_is_capped() {
        let fill = Paint::Solid(Color::BLACK);
        let paint = MarkPaint {
            fill: Some(&fill),
            stroke: None,
        };
        let disc = kurbo::Circle::new(Point::ORIGIN, 3.0).to_path(0.1);
        let capped = rasterize_mark(&disc, &paint, 0.0, MAX_SUPERSAMPLING, 64).expect("image");
        let excessive = rasterize_mark(&disc, &paint, 0.0, u8::MAX, 64).expect("image");
        assert_eq!(capped, excessive);
        let minimal = rasterize_mark(&disc, &paint, 0.0, 0, 64).expect("image");
        assert_eq!(minimal, rasterize_mark(&disc, &paint, 0.0, 1, 64).expect("image"));
    }

    #[test]
    fn outline_grows_image_and_paints_edges() {
        let fill = Paint::Solid(Color::WHITE);
        let stroke = Paint::Solid(Color::BLACK);
        let paint = MarkPaint {
            fill: Some(&fill),
            stroke: Some((2.0, &stroke)),
        };
        let image = rasterize_mark(&square(8.0), &paint, 0.0, 2, 64).expect("image");
        assert_eq!(image.dimensions(), (10, 10));
        assert_eq!(image.get_pixel(1, 5).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn rotation_enlarges_canvas() {
        let fill = Paint::Solid(Color::BLACK);
        let paint = MarkPaint {
            fill: Some(&fill),
            stroke: None,
        };
        let image = rasterize_mark(&square(10.0), &paint, 45.0, 1, 64).expect("image");
        assert_eq!(image.width(), 15);
    }

    #[test]
    fn nothing_to_paint() {
        let paint = MarkPaint {
            fill: None,
            stroke: None,
        };
        assert!(rasterize_mark(&square(4.0), &paint, 0.0, 1, 64).is_none());
    }

    #[test]
    fn external_resample_keeps_aspect() {
        let source = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]));
        let out = transform_image(&source, 8.0, 0.0, 64).expect("image");
        assert_eq!(out.dimensions(), (16, 8));
        let rotated = transform_image(&source, 8.0, 90.0, 64).expect("image");
        assert_eq!(rotated.width(), 18);
    }

    #[test]
    fn opacity_scales_alpha() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 200]));
        apply_opacity(&mut image, 0.5);
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 100]);
    }

    #[test]
    fn dimension_is_clamped() {
        assert_eq!(pixel_extent(5000.0, 2048), Some(2048));
        assert_eq!(pixel_extent(0.0, 2048), None);
    }
}
