// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-space feature geometry.
//!
//! Coordinates are already projected to display pixels; the caches never
//! transform them, they only need bounding boxes to grow by a margin.

use kurbo::{BezPath, Point, Rect, Shape, Vec2};

/// The geometry attached to a feature, in display coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single location.
    Point(Point),
    /// An open polyline or curve.
    LineString(BezPath),
    /// A closed area (rings are closed subpaths).
    Polygon(BezPath),
}

impl Geometry {
    /// Builds a polyline through `points`.
    #[must_use]
    pub fn line_string(points: &[Point]) -> Self {
        Self::LineString(polyline(points, false))
    }

    /// Builds a single-ring polygon through `points`.
    #[must_use]
    pub fn polygon(points: &[Point]) -> Self {
        Self::Polygon(polyline(points, true))
    }

    /// Returns the axis-aligned bounding box.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Point(p) => Rect::from_points(*p, *p),
            Self::LineString(path) | Self::Polygon(path) => path.bounding_box(),
        }
    }

    /// Returns a copy moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        let affine = kurbo::Affine::translate(offset);
        match self {
            Self::Point(p) => Self::Point(*p + offset),
            Self::LineString(path) => Self::LineString(affine * path.clone()),
            Self::Polygon(path) => Self::Polygon(affine * path.clone()),
        }
    }

    /// Returns a representative anchor location: the point itself, or the
    /// center of the bounding box.
    #[must_use]
    pub fn anchor(&self) -> Point {
        match self {
            Self::Point(p) => *p,
            _ => self.bounding_box().center(),
        }
    }
}

fn polyline(points: &[Point], close: bool) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        path.move_to(*first);
        for p in iter {
            path.line_to(*p);
        }
        if close {
            path.close_path();
        }
    }
    path
}
