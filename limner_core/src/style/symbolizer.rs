// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Symbolizers: styling instructions for one geometry or raster kind.

use std::sync::Arc;

use super::graphic::{Displacement, Fill, Graphic, Stroke};
use super::text::{Font, Halo, LabelPlacement};
use crate::expr::Expression;

/// The five symbolizer kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolizerKind {
    /// Point symbol.
    Point,
    /// Line stroke.
    Line,
    /// Area fill and outline.
    Polygon,
    /// Coverage opacity and outline.
    Raster,
    /// Label.
    Text,
}

impl SymbolizerKind {
    /// Every kind, in table order.
    pub const ALL: [Self; 5] = [
        Self::Point,
        Self::Line,
        Self::Polygon,
        Self::Raster,
        Self::Text,
    ];

    /// Dense index for per-kind tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Polygon => 2,
            Self::Raster => 3,
            Self::Text => 4,
        }
    }
}

/// Draws a graphic at each point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointSymbolizer {
    /// The plotted graphic; when absent the default square is drawn.
    pub graphic: Option<Arc<Graphic>>,
}

/// Strokes a line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineSymbolizer {
    /// The stroke; when absent nothing is drawn.
    pub stroke: Option<Arc<Stroke>>,
    /// Offset perpendicular to the line, in pixels.
    pub perpendicular_offset: Option<Expression>,
}

/// Fills and outlines an area.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonSymbolizer {
    /// Outline.
    pub stroke: Option<Arc<Stroke>>,
    /// Interior.
    pub fill: Option<Arc<Fill>>,
    /// Pixel displacement of the whole polygon.
    pub displacement: Option<Arc<Displacement>>,
    /// Outline offset perpendicular to the boundary, in pixels.
    pub perpendicular_offset: Option<Expression>,
}

/// Draws a coverage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RasterSymbolizer {
    /// Coverage opacity (default 1).
    pub opacity: Option<Expression>,
    /// Outline drawn around the coverage footprint (line or polygon).
    pub outline: Option<Arc<Symbolizer>>,
}

/// Draws a label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextSymbolizer {
    /// Label text.
    pub label: Option<Expression>,
    /// Font.
    pub font: Option<Arc<Font>>,
    /// Glyph paint (default black).
    pub fill: Option<Arc<Fill>>,
    /// Optional glyph outline.
    pub halo: Option<Arc<Halo>>,
    /// Placement (default point placement).
    pub placement: Option<LabelPlacement>,
}

/// One symbolizer of a rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Symbolizer {
    /// See [`PointSymbolizer`].
    Point(PointSymbolizer),
    /// See [`LineSymbolizer`].
    Line(LineSymbolizer),
    /// See [`PolygonSymbolizer`].
    Polygon(PolygonSymbolizer),
    /// See [`RasterSymbolizer`].
    Raster(RasterSymbolizer),
    /// See [`TextSymbolizer`].
    Text(TextSymbolizer),
}

impl Symbolizer {
    /// Returns the declared kind.
    #[must_use]
    pub const fn kind(&self) -> SymbolizerKind {
        match self {
            Self::Point(_) => SymbolizerKind::Point,
            Self::Line(_) => SymbolizerKind::Line,
            Self::Polygon(_) => SymbolizerKind::Polygon,
            Self::Raster(_) => SymbolizerKind::Raster,
            Self::Text(_) => SymbolizerKind::Text,
        }
    }
}
