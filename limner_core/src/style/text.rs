// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label styling: fonts, halos and placements.

use std::sync::Arc;

use super::graphic::{AnchorPoint, Displacement, Fill};
use crate::expr::Expression;

/// Font selection for labels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Font {
    /// Family names in preference order.
    pub family: Vec<Expression>,
    /// `normal`, `italic` or `oblique`.
    pub style: Option<Expression>,
    /// `normal`, `bold` or a numeric weight.
    pub weight: Option<Expression>,
    /// Size in pixels.
    pub size: Option<Expression>,
}

/// A colored outline around label glyphs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Halo {
    /// Halo paint (default white).
    pub fill: Option<Arc<Fill>>,
    /// Radius in pixels (default 1).
    pub radius: Option<Expression>,
}

/// Where a label sits relative to its geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelPlacement {
    /// Anchored at a point.
    Point(Arc<PointPlacement>),
    /// Following a line.
    Line(Arc<LinePlacement>),
}

/// Placement of a label around a point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointPlacement {
    /// Anchor inside the label box.
    pub anchor_point: Option<Arc<AnchorPoint>>,
    /// Pixel displacement.
    pub displacement: Option<Arc<Displacement>>,
    /// Clockwise rotation in degrees.
    pub rotation: Option<Expression>,
}

/// Placement of a label along a line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinePlacement {
    /// Offset perpendicular to the line, in pixels.
    pub perpendicular_offset: Option<Expression>,
    /// Distance before the first label, in pixels.
    pub initial_gap: Option<Expression>,
    /// Distance between repeated labels, in pixels.
    pub gap: Option<Expression>,
    /// Repeat the label along the line.
    pub repeated: bool,
    /// Bend glyphs along the line.
    pub aligned: bool,
    /// Allow the label engine to simplify the line first.
    pub generalize_line: bool,
}
