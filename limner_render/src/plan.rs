// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of paint calls.

use kurbo::Point;
use limner_core::geometry::Geometry;
use limner_core::portray::{Canvas, FillStyle, LabelStyle, StrokeStyle, SymbolStyle};

/// A single recorded paint call.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderItem {
    /// Area fill.
    Fill {
        /// Area to fill.
        geometry: Geometry,
        /// Fill style.
        style: FillStyle,
    },
    /// Pen stroke.
    Stroke {
        /// Path to stroke.
        geometry: Geometry,
        /// Stroke style.
        style: StrokeStyle,
    },
    /// Point symbol.
    Symbol {
        /// Where the symbol's anchor lands.
        position: Point,
        /// Symbol style.
        style: SymbolStyle,
    },
    /// Label.
    Label {
        /// Labelled geometry.
        geometry: Geometry,
        /// Label style.
        style: LabelStyle,
    },
    /// Coverage composite.
    Coverage {
        /// Coverage footprint.
        footprint: Geometry,
        /// Coverage opacity.
        opacity: f64,
    },
}

/// An ordered list of paint calls, back to front.
///
/// A plan records whatever is painted on it as a [`Canvas`]; a rasterizer
/// replays [`items`](Self::items) later.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Paint calls in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Canvas for RenderPlan {
    fn fill(&mut self, geometry: &Geometry, style: &FillStyle) {
        self.items.push(RenderItem::Fill {
            geometry: geometry.clone(),
            style: style.clone(),
        });
    }

    fn stroke(&mut self, geometry: &Geometry, style: &StrokeStyle) {
        self.items.push(RenderItem::Stroke {
            geometry: geometry.clone(),
            style: style.clone(),
        });
    }

    fn draw_symbol(&mut self, position: Point, style: &SymbolStyle) {
        self.items.push(RenderItem::Symbol {
            position,
            style: style.clone(),
        });
    }

    fn draw_label(&mut self, geometry: &Geometry, style: &LabelStyle) {
        self.items.push(RenderItem::Label {
            geometry: geometry.clone(),
            style: style.clone(),
        });
    }

    fn draw_coverage(&mut self, footprint: &Geometry, opacity: f64) {
        self.items.push(RenderItem::Coverage {
            footprint: footprint.clone(),
            opacity,
        });
    }
}
