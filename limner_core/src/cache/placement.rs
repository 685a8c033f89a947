// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchors, displacements and label placements.
//!
//! None of these ever hide anything; they only move it. Their visibility is
//! `Always` when static and `DependsOnFeature` otherwise, and they contribute
//! attributes to their parents.

use std::sync::{Arc, OnceLock};

use kurbo::{Point, Vec2};

use super::{CacheContext, CacheStatus, StatusBuilder, StyleCache};
use crate::expr::{Expression, Feature};
use crate::style::{AnchorPoint, Displacement, LabelPlacement, LinePlacement, PointPlacement};

/// Caches an [`AnchorPoint`], defaulting to the center `(0.5, 0.5)`.
#[derive(Debug)]
pub struct AnchorCache {
    anchor: Option<Arc<AnchorPoint>>,
    context: Arc<CacheContext>,
    state: OnceLock<AnchorState>,
}

#[derive(Debug)]
struct AnchorState {
    status: CacheStatus,
    x: Option<f64>,
    y: Option<f64>,
}

impl AnchorCache {
    /// Creates a cache; `None` means the default center anchor.
    #[must_use]
    pub fn new(anchor: Option<Arc<AnchorPoint>>, context: Arc<CacheContext>) -> Self {
        Self {
            anchor,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &AnchorState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let (x, y) = match &self.anchor {
                Some(a) => (a.x.as_ref(), a.y.as_ref()),
                None => (None, None),
            };
            let mut b = StatusBuilder::new(oracle);
            let x_static = b.expression(x);
            let y_static = b.expression(y);
            AnchorState {
                status: b.finish(),
                x: x_static.then(|| oracle.evaluate_f64(x, None, 0.5)),
                y: y_static.then(|| oracle.evaluate_f64(y, None, 0.5)),
            }
        })
    }

    /// Returns the anchor as fractions of the anchored extent.
    #[must_use]
    pub fn point(&self, feature: Option<&dyn Feature>) -> Point {
        let state = self.state();
        let oracle = &*self.context.oracle;
        let (x, y) = match &self.anchor {
            Some(a) => (a.x.as_ref(), a.y.as_ref()),
            None => (None, None),
        };
        Point::new(
            state
                .x
                .unwrap_or_else(|| oracle.evaluate_f64(x, feature, 0.5)),
            state
                .y
                .unwrap_or_else(|| oracle.evaluate_f64(y, feature, 0.5)),
        )
    }

    /// Returns the anchor's distance from the center, as a fraction.
    #[must_use]
    pub fn offset_from_center(&self, feature: Option<&dyn Feature>) -> Vec2 {
        self.point(feature) - Point::new(0.5, 0.5)
    }
}

impl StyleCache for AnchorCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        true
    }
}

/// Caches a [`Displacement`], defaulting to no offset.
#[derive(Debug)]
pub struct DisplacementCache {
    displacement: Option<Arc<Displacement>>,
    context: Arc<CacheContext>,
    state: OnceLock<DisplacementState>,
}

#[derive(Debug)]
struct DisplacementState {
    status: CacheStatus,
    x: Option<f64>,
    y: Option<f64>,
}

impl DisplacementCache {
    /// Creates a cache; `None` means no displacement.
    #[must_use]
    pub fn new(displacement: Option<Arc<Displacement>>, context: Arc<CacheContext>) -> Self {
        Self {
            displacement,
            context,
            state: OnceLock::new(),
        }
    }

    fn parts(&self) -> (Option<&Expression>, Option<&Expression>) {
        match &self.displacement {
            Some(d) => (d.x.as_ref(), d.y.as_ref()),
            None => (None, None),
        }
    }

    fn state(&self) -> &DisplacementState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let (x, y) = self.parts();
            let mut b = StatusBuilder::new(oracle);
            let x_static = b.expression(x);
            let y_static = b.expression(y);
            DisplacementState {
                status: b.finish(),
                x: x_static.then(|| oracle.evaluate_f64(x, None, 0.0)),
                y: y_static.then(|| oracle.evaluate_f64(y, None, 0.0)),
            }
        })
    }

    /// Returns the pixel offset scaled by `coefficient`.
    #[must_use]
    pub fn offset(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Vec2 {
        let state = self.state();
        let oracle = &*self.context.oracle;
        let (x, y) = self.parts();
        let x = state
            .x
            .unwrap_or_else(|| oracle.evaluate_f64(x, feature, 0.0));
        let y = state
            .y
            .unwrap_or_else(|| oracle.evaluate_f64(y, feature, 0.0));
        Vec2::new(x, y) * coefficient
    }
}

impl StyleCache for DisplacementCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        true
    }
}

/// A resolved label placement.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// Around a point.
    Point {
        /// Anchor inside the label box, as fractions.
        anchor: Point,
        /// Pixel displacement, scaled.
        displacement: Vec2,
        /// Clockwise rotation in degrees.
        rotation: f64,
    },
    /// Along a line.
    Line {
        /// Perpendicular offset in pixels, scaled.
        perpendicular_offset: f64,
        /// Distance before the first label, scaled.
        initial_gap: f64,
        /// Distance between repetitions, scaled.
        gap: f64,
        /// Repeat along the line.
        repeated: bool,
        /// Bend glyphs along the line.
        aligned: bool,
        /// Allow line simplification.
        generalize_line: bool,
    },
}

/// Caches a [`PointPlacement`].
#[derive(Debug)]
pub struct PointPlacementCache {
    placement: Arc<PointPlacement>,
    context: Arc<CacheContext>,
    anchor: AnchorCache,
    displacement: DisplacementCache,
    state: OnceLock<PointPlacementState>,
}

#[derive(Debug)]
struct PointPlacementState {
    status: CacheStatus,
    rotation: Option<f64>,
}

impl PointPlacementCache {
    /// Creates a cache.
    #[must_use]
    pub fn new(placement: Arc<PointPlacement>, context: Arc<CacheContext>) -> Self {
        Self {
            anchor: AnchorCache::new(placement.anchor_point.clone(), context.clone()),
            displacement: DisplacementCache::new(placement.displacement.clone(), context.clone()),
            placement,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &PointPlacementState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            b.absorb(self.anchor.status());
            b.absorb(self.displacement.status());
            let rotation = self.placement.rotation.as_ref();
            let rotation_static = b.expression(rotation);
            PointPlacementState {
                status: b.finish(),
                rotation: rotation_static.then(|| oracle.evaluate_f64(rotation, None, 0.0)),
            }
        })
    }

    /// Resolves the placement for `feature`.
    #[must_use]
    pub fn placement(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Placement {
        let rotation = self.state().rotation.unwrap_or_else(|| {
            self.context
                .oracle
                .evaluate_f64(self.placement.rotation.as_ref(), feature, 0.0)
        });
        Placement::Point {
            anchor: self.anchor.point(feature),
            displacement: self.displacement.offset(feature, coefficient),
            rotation,
        }
    }

    /// Returns the displacement magnitude in pixels.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        self.displacement.offset(feature, coefficient).hypot()
    }
}

impl StyleCache for PointPlacementCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        true
    }
}

/// Caches a [`LinePlacement`].
#[derive(Debug)]
pub struct LinePlacementCache {
    placement: Arc<LinePlacement>,
    context: Arc<CacheContext>,
    state: OnceLock<LinePlacementState>,
}

#[derive(Debug)]
struct LinePlacementState {
    status: CacheStatus,
    perpendicular_offset: Option<f64>,
    initial_gap: Option<f64>,
    gap: Option<f64>,
}

impl LinePlacementCache {
    /// Creates a cache.
    #[must_use]
    pub fn new(placement: Arc<LinePlacement>, context: Arc<CacheContext>) -> Self {
        Self {
            placement,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &LinePlacementState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let p = &*self.placement;
            let mut b = StatusBuilder::new(oracle);
            let mut eval = |expr: Option<&Expression>| {
                b.expression(expr)
                    .then(|| oracle.evaluate_f64(expr, None, 0.0))
            };
            let perpendicular_offset = eval(p.perpendicular_offset.as_ref());
            let initial_gap = eval(p.initial_gap.as_ref());
            let gap = eval(p.gap.as_ref());
            LinePlacementState {
                status: b.finish(),
                perpendicular_offset,
                initial_gap,
                gap,
            }
        })
    }

    /// Resolves the placement for `feature`.
    #[must_use]
    pub fn placement(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Placement {
        let state = self.state();
        let oracle = &*self.context.oracle;
        let p = &*self.placement;
        let resolve = |cached: Option<f64>, expr: Option<&Expression>| {
            cached.unwrap_or_else(|| oracle.evaluate_f64(expr, feature, 0.0)) * coefficient
        };
        Placement::Line {
            perpendicular_offset: resolve(state.perpendicular_offset, p.perpendicular_offset.as_ref()),
            initial_gap: resolve(state.initial_gap, p.initial_gap.as_ref()),
            gap: resolve(state.gap, p.gap.as_ref()),
            repeated: p.repeated,
            aligned: p.aligned,
            generalize_line: p.generalize_line,
        }
    }

    /// Returns the perpendicular offset magnitude in pixels.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        match self.placement(feature, coefficient) {
            Placement::Line {
                perpendicular_offset,
                ..
            } => perpendicular_offset.abs(),
            Placement::Point { .. } => 0.0,
        }
    }
}

impl StyleCache for LinePlacementCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        true
    }
}

/// A point or line placement cache, chosen by the declared placement kind.
#[derive(Debug)]
pub enum PlacementCache {
    /// Point placement.
    Point(PointPlacementCache),
    /// Line placement.
    Line(LinePlacementCache),
}

impl PlacementCache {
    /// Creates the cache matching `placement`; `None` yields the default
    /// point placement.
    #[must_use]
    pub fn new(placement: Option<&LabelPlacement>, context: Arc<CacheContext>) -> Self {
        match placement {
            Some(LabelPlacement::Line(line)) => {
                Self::Line(LinePlacementCache::new(line.clone(), context))
            }
            Some(LabelPlacement::Point(point)) => {
                Self::Point(PointPlacementCache::new(point.clone(), context))
            }
            None => Self::Point(PointPlacementCache::new(
                Arc::new(PointPlacement::default()),
                context,
            )),
        }
    }

    /// Resolves the placement for `feature`.
    #[must_use]
    pub fn placement(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Placement {
        match self {
            Self::Point(p) => p.placement(feature, coefficient),
            Self::Line(l) => l.placement(feature, coefficient),
        }
    }

    /// Returns how far the placement moves a label, in pixels.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        match self {
            Self::Point(p) => p.margin(feature, coefficient),
            Self::Line(l) => l.margin(feature, coefficient),
        }
    }
}

impl StyleCache for PlacementCache {
    fn status(&self) -> &CacheStatus {
        match self {
            Self::Point(p) => p.status(),
            Self::Line(l) => l.status(),
        }
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SimpleFeature;

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    #[test]
    fn defaults_center_and_zero() {
        let anchor = AnchorCache::new(None, context());
        assert_eq!(anchor.point(None), Point::new(0.5, 0.5));
        assert!(anchor.is_static());

        let displacement = DisplacementCache::new(None, context());
        assert_eq!(displacement.offset(None, 2.0), Vec2::ZERO);
        assert_eq!(displacement.status(), &CacheStatus::ALWAYS);
    }

    #[test]
    fn dynamic_displacement_reads_feature() {
        let d = Displacement {
            x: Some(Expression::property("dx")),
            y: Some(Expression::number(3.0)),
        };
        let cache = DisplacementCache::new(Some(Arc::new(d)), context());
        assert!(!cache.is_static());
        assert!(cache.required_attributes().contains("dx"));
        let f = SimpleFeature::new().with_attribute("dx", 4.0);
        assert_eq!(cache.offset(Some(&f), 2.0), Vec2::new(8.0, 6.0));
    }

    #[test]
    fn placement_kind_follows_declaration() {
        let line = LabelPlacement::Line(Arc::new(LinePlacement {
            perpendicular_offset: Some(Expression::number(-4.0)),
            ..LinePlacement::default()
        }));
        let cache = PlacementCache::new(Some(&line), context());
        assert!(matches!(cache, PlacementCache::Line(_)));
        assert_eq!(cache.margin(None, 1.5), 6.0);

        let default = PlacementCache::new(None, context());
        assert!(matches!(
            default.placement(None, 1.0),
            Placement::Point { rotation, .. } if rotation == 0.0
        ));
    }
}
