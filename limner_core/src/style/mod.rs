// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable style graph.
//!
//! These types are what a style parser produces. Caches reference them
//! through [`Arc`] and never mutate them; [`Rule`] and [`Symbolizer`] values
//! are additionally used as identity keys by the
//! [`CacheRegistry`](crate::registry::CacheRegistry), so share them by
//! cloning the `Arc`, not the value.
//!
//! Every property is optional. A missing property takes the SLD default
//! documented on the field (some are tunable through
//! [`CacheConfig`](crate::config::CacheConfig)).

mod graphic;
mod symbolizer;
mod text;

use std::sync::Arc;

pub use graphic::{
    AnchorPoint, Displacement, ExternalGraphic, Fill, Graphic, GraphicSource, GraphicStroke,
    GraphicalSymbol, Mark, Stroke,
};
pub use symbolizer::{
    LineSymbolizer, PointSymbolizer, PolygonSymbolizer, RasterSymbolizer, Symbolizer,
    SymbolizerKind, TextSymbolizer,
};
pub use text::{Font, Halo, LabelPlacement, LinePlacement, PointPlacement};

use crate::expr::Filter;

/// A filter plus ordered symbolizers, applied to matching features within a
/// scale range.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    /// Human-readable name.
    pub name: Option<String>,
    /// Selection predicate; `None` accepts everything.
    pub filter: Option<Filter>,
    /// Applies only to features no regular rule of the same style accepted.
    pub is_else: bool,
    /// Inclusive lower bound of the scale denominator.
    pub min_scale: f64,
    /// Exclusive upper bound of the scale denominator.
    pub max_scale: f64,
    /// Symbolizers, painted in order.
    pub symbolizers: Vec<Arc<Symbolizer>>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            name: None,
            filter: None,
            is_else: false,
            min_scale: 0.0,
            max_scale: f64::INFINITY,
            symbolizers: Vec::new(),
        }
    }
}

impl Rule {
    /// A rule accepting everything at every scale.
    #[must_use]
    pub fn new(symbolizers: Vec<Arc<Symbolizer>>) -> Self {
        Self {
            symbolizers,
            ..Self::default()
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}
