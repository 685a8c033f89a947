// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fills, strokes and graphics.

use std::sync::Arc;

use crate::expr::Expression;
use crate::paint::Color;

/// Paint for an area: a flat color, or a nested graphic tiled as a pattern.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fill {
    /// Pattern graphic; when present it replaces the color.
    pub graphic_fill: Option<Arc<Graphic>>,
    /// Fill color (default `#808080`).
    pub color: Option<Expression>,
    /// Opacity in `0..=1` (default 1).
    pub opacity: Option<Expression>,
}

impl Fill {
    /// A constant flat-color fill.
    #[must_use]
    pub fn solid(color: Color) -> Self {
        Self {
            color: Some(Expression::color(color)),
            ..Self::default()
        }
    }

    /// Sets the opacity expression.
    #[must_use]
    pub fn with_opacity(mut self, opacity: Expression) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// Paint for a line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    /// Tiled pattern graphic replacing the color.
    pub graphic_fill: Option<Arc<Graphic>>,
    /// Repeated graphic drawn along the line instead of a painted stroke.
    pub graphic_stroke: Option<Arc<GraphicStroke>>,
    /// Stroke color (default black).
    pub color: Option<Expression>,
    /// Opacity in `0..=1` (default 1).
    pub opacity: Option<Expression>,
    /// Width in pixels (default 1).
    pub width: Option<Expression>,
    /// `miter`, `round` or `bevel` (default `miter`).
    pub line_join: Option<Expression>,
    /// `butt`, `round` or `square` (default `butt`).
    pub line_cap: Option<Expression>,
    /// Alternating dash and gap lengths in pixels.
    pub dash_array: Option<Vec<f64>>,
    /// Offset into the dash pattern in pixels.
    pub dash_offset: Option<Expression>,
}

impl Stroke {
    /// A constant flat-color stroke.
    #[must_use]
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color: Some(Expression::color(color)),
            width: Some(Expression::number(width)),
            ..Self::default()
        }
    }

    /// Sets the width expression.
    #[must_use]
    pub fn with_width(mut self, width: Expression) -> Self {
        self.width = Some(width);
        self
    }

    /// Sets the opacity expression.
    #[must_use]
    pub fn with_opacity(mut self, opacity: Expression) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

/// A graphic repeated along a line.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphicStroke {
    /// The repeated graphic.
    pub graphic: Arc<Graphic>,
    /// Distance before the first repetition, in pixels (default 0).
    pub initial_gap: Option<Expression>,
    /// Distance between repetitions, in pixels (default 0).
    pub gap: Option<Expression>,
}

/// A plotted symbol with its transformation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graphic {
    /// Candidate symbols, first valid one wins.
    pub symbols: Vec<GraphicalSymbol>,
    /// Opacity in `0..=1` (default 1).
    pub opacity: Option<Expression>,
    /// Height in pixels.
    pub size: Option<Expression>,
    /// Clockwise rotation in degrees (default 0).
    pub rotation: Option<Expression>,
    /// Anchor inside the symbol (default center).
    pub anchor_point: Option<Arc<AnchorPoint>>,
    /// Pixel displacement from the anchor location.
    pub displacement: Option<Arc<Displacement>>,
}

impl Graphic {
    /// A graphic with a single symbol and a constant size.
    #[must_use]
    pub fn with_symbol(symbol: GraphicalSymbol, size: f64) -> Self {
        Self {
            symbols: vec![symbol],
            size: Some(Expression::number(size)),
            ..Self::default()
        }
    }
}

/// One candidate symbol of a [`Graphic`].
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicalSymbol {
    /// A vector shape.
    Mark(Arc<Mark>),
    /// A raster image.
    External(Arc<ExternalGraphic>),
}

/// A well-known vector shape with its own fill and stroke.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mark {
    /// Shape name such as `circle` (default `square`).
    pub well_known_name: Option<Expression>,
    /// Interior paint.
    pub fill: Option<Arc<Fill>>,
    /// Outline paint.
    pub stroke: Option<Arc<Stroke>>,
}

impl Mark {
    /// A constant-named mark.
    #[must_use]
    pub fn named(name: &str, fill: Option<Fill>, stroke: Option<Stroke>) -> Self {
        Self {
            well_known_name: Some(Expression::text(name)),
            fill: fill.map(Arc::new),
            stroke: stroke.map(Arc::new),
        }
    }

    /// The fallback mark: a gray square with a black outline.
    #[must_use]
    pub fn default_square() -> Self {
        Self::named(
            "square",
            Some(Fill::solid(Color::GRAY)),
            Some(Stroke::solid(Color::BLACK, 1.0)),
        )
    }
}

/// An image referenced by URI or embedded inline.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalGraphic {
    /// Where the bytes come from.
    pub source: GraphicSource,
    /// Declared MIME type, informative only.
    pub format: Option<String>,
}

/// Origin of an external graphic's bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicSource {
    /// Bytes carried in the style itself.
    Inline(Arc<[u8]>),
    /// A URI handed to the [`ResourceResolver`](crate::resource::ResourceResolver).
    Uri(String),
}

/// A point inside a symbol, in fractions of its extent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnchorPoint {
    /// Horizontal fraction (default 0.5).
    pub x: Option<Expression>,
    /// Vertical fraction (default 0.5).
    pub y: Option<Expression>,
}

/// A pixel offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Displacement {
    /// Horizontal offset (default 0).
    pub x: Option<Expression>,
    /// Vertical offset (default 0).
    pub y: Option<Expression>,
}

impl Displacement {
    /// A constant displacement.
    #[must_use]
    pub fn constant(x: f64, y: f64) -> Self {
        Self {
            x: Some(Expression::number(x)),
            y: Some(Expression::number(y)),
        }
    }
}
