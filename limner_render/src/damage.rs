// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use kurbo::Rect;

/// A region of the output that a portrayal touched.
///
/// A feature's damage is its bounding box grown by the largest margin of the
/// symbolizers that painted it, so strokes, halos and displaced symbols are
/// covered.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Axis-aligned rectangles in display pixels.
    Rects(Vec<Rect>),
    /// Nothing was painted.
    None,
}

impl DamageRegion {
    /// Damage for one bounding box grown by `margin` on every side.
    #[must_use]
    pub fn inflated(bounds: Rect, margin: f64) -> Self {
        Self::Rects(vec![bounds.inflate(margin, margin)])
    }

    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Returns the union of the damaged rectangles.
    ///
    /// `None` for [`Full`](Self::Full) (unbounded) and for no damage.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::Full | Self::None => None,
        }
    }
}
