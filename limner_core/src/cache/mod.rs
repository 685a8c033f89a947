// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The evaluation cache contract and the leaf caches.
//!
//! Every cache wraps one immutable style element and evaluates it lazily,
//! exactly once, on the first query. Evaluation classifies each expression
//! of the element through the [`ExpressionOracle`], precomputes the static
//! ones and settles a [`CacheStatus`]:
//!
//! - **static**: every value is precomputed, visibility is
//!   [`Always`](Visibility::Always) or [`Never`](Visibility::Never) and no
//!   feature attribute is required;
//! - **dynamic**: static values are still precomputed, the dynamic ones are
//!   recomputed per feature, visibility is usually
//!   [`DependsOnFeature`](Visibility::DependsOnFeature) and the attribute
//!   names read by the dynamic parts are listed.
//!
//! A cache that evaluates to `Never` retains nothing to paint: all of its
//! typed accessors return `None`.
//!
//! Precomputed values are stored as `Option<T>`: `Some` is the static
//! result, `None` means "evaluate against the feature".

mod attributes;
mod external;
mod fill;
mod font;
mod graphic;
mod halo;
mod mark;
mod placement;
mod stroke;
mod visibility;

use core::fmt;
use std::sync::Arc;

pub use attributes::{AttributeSetBuilder, RequiredAttributes};
pub use external::ExternalCache;
pub use fill::FillCache;
pub use font::FontCache;
pub use graphic::{GraphicCache, SymbolCache};
pub use halo::HaloCache;
pub use mark::{MarkCache, MarkShape};
pub use placement::{
    AnchorCache, DisplacementCache, LinePlacementCache, Placement, PlacementCache,
    PointPlacementCache,
};
pub use stroke::{GraphicStrokeCache, SimpleStrokeCache, StrokeCache};
pub use visibility::Visibility;

use crate::config::CacheConfig;
use crate::expr::{DefaultOracle, Expression, ExpressionOracle, Feature, Filter};
use crate::resource::{NoResources, ResourceResolver};

/// The settled outcome of a cache evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStatus {
    /// Every value was precomputed without a feature.
    pub is_static: bool,
    /// Whether the element paints anything.
    pub visibility: Visibility,
    /// Attributes read by the dynamic parts. Empty when static.
    pub required: RequiredAttributes,
}

impl CacheStatus {
    /// Static and invisible.
    pub const NEVER: Self = Self {
        is_static: true,
        visibility: Visibility::Never,
        required: RequiredAttributes::EMPTY,
    };

    /// Static and visible.
    pub const ALWAYS: Self = Self {
        is_static: true,
        visibility: Visibility::Always,
        required: RequiredAttributes::EMPTY,
    };
}

/// Shared collaborators of every cache built from one registry.
#[derive(Clone, Debug)]
pub struct CacheContext {
    /// Classifies and evaluates expressions.
    pub oracle: Arc<dyn ExpressionOracle>,
    /// Fetches external graphics.
    pub resources: Arc<dyn ResourceResolver>,
    /// Tunable defaults.
    pub config: CacheConfig,
}

impl Default for CacheContext {
    fn default() -> Self {
        Self {
            oracle: Arc::new(DefaultOracle),
            resources: Arc::new(NoResources),
            config: CacheConfig::default(),
        }
    }
}

impl CacheContext {
    /// Creates a context.
    #[must_use]
    pub fn new(
        oracle: Arc<dyn ExpressionOracle>,
        resources: Arc<dyn ResourceResolver>,
        config: CacheConfig,
    ) -> Self {
        Self {
            oracle,
            resources,
            config,
        }
    }

    /// Replaces the resource resolver.
    #[must_use]
    pub fn with_resources(mut self, resources: Arc<dyn ResourceResolver>) -> Self {
        self.resources = resources;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }
}

/// The query surface shared by every cache.
///
/// Implementors provide [`status`](Self::status), which evaluates on first
/// call, and the per-feature [`is_visible`](Self::is_visible). Everything else
/// derives from the status.
pub trait StyleCache: fmt::Debug + Send + Sync {
    /// Returns the evaluation outcome, evaluating first if needed.
    fn status(&self) -> &CacheStatus;

    /// Returns whether this element paints anything for `feature`.
    ///
    /// A decided visibility answers without reading the feature.
    fn is_visible(&self, feature: &dyn Feature) -> bool;

    /// Forces evaluation. Idempotent.
    fn evaluate(&self) {
        let _ = self.status();
    }

    /// Returns `true` if no query needs a feature.
    fn is_static(&self) -> bool {
        self.status().is_static
    }

    /// Returns the settled visibility.
    fn visibility(&self) -> Visibility {
        self.status().visibility
    }

    /// Returns the attribute names the dynamic parts read.
    fn required_attributes(&self) -> &RequiredAttributes {
        &self.status().required
    }
}

/// Answers a visibility query from the status, running `residual` only when
/// the outcome depends on the feature.
pub(crate) fn visible_with(status: &CacheStatus, residual: impl FnOnce() -> bool) -> bool {
    match status.visibility {
        Visibility::Always => true,
        Visibility::Never => false,
        Visibility::DependsOnFeature | Visibility::Undetermined => residual(),
    }
}

/// Accumulates a [`CacheStatus`] while a cache evaluates.
///
/// Children are combined conjunctively by [`absorb`](Self::absorb).
/// Disjunctive composites collect attributes with
/// [`absorb_attributes`](Self::absorb_attributes) and set the combined
/// visibility through [`override_visibility`](Self::override_visibility).
pub(crate) struct StatusBuilder<'a> {
    oracle: &'a dyn ExpressionOracle,
    visibility: Visibility,
    overridden: Option<Visibility>,
    dynamic: bool,
    attributes: AttributeSetBuilder,
}

impl<'a> StatusBuilder<'a> {
    pub(crate) fn new(oracle: &'a dyn ExpressionOracle) -> Self {
        Self {
            oracle,
            visibility: Visibility::Always,
            overridden: None,
            dynamic: false,
            attributes: AttributeSetBuilder::new(),
        }
    }

    /// Classifies an optional expression. Returns `true` if it is static;
    /// otherwise records its attributes.
    pub(crate) fn expression(&mut self, expr: Option<&Expression>) -> bool {
        match expr {
            Some(expr) if !self.oracle.is_static(expr) => {
                self.dynamic = true;
                self.oracle.collect_attributes(expr, &mut self.attributes);
                false
            }
            _ => true,
        }
    }

    /// Classifies a filter like [`expression`](Self::expression).
    pub(crate) fn filter(&mut self, filter: &Filter) -> bool {
        if self.oracle.is_filter_static(filter) {
            true
        } else {
            self.dynamic = true;
            self.oracle
                .collect_filter_attributes(filter, &mut self.attributes);
            false
        }
    }

    /// Folds in a child that must be visible for this cache to be visible.
    pub(crate) fn absorb(&mut self, child: &CacheStatus) {
        self.visibility = self.visibility.and(child.visibility);
        self.absorb_attributes(child);
    }

    /// Folds in a child's attributes and dynamism, not its visibility.
    pub(crate) fn absorb_attributes(&mut self, child: &CacheStatus) {
        self.dynamic |= !child.is_static;
        self.attributes.extend(&child.required);
    }

    pub(crate) fn mark_never(&mut self) {
        self.visibility = Visibility::Never;
    }

    pub(crate) fn mark_dynamic(&mut self) {
        self.dynamic = true;
    }

    /// Sets the final visibility, bypassing the conjunctive fold.
    pub(crate) fn override_visibility(&mut self, visibility: Visibility) {
        self.overridden = Some(visibility);
    }

    pub(crate) fn is_never(&self) -> bool {
        self.overridden.unwrap_or(self.visibility).is_never()
    }

    pub(crate) fn finish(self) -> CacheStatus {
        let visibility = self.overridden.unwrap_or(self.visibility);
        if visibility.is_never() {
            return CacheStatus::NEVER;
        }
        if !self.dynamic && visibility.is_decided() {
            return CacheStatus::ALWAYS;
        }
        let visibility = match self.overridden {
            Some(v) if v != Visibility::Undetermined => v,
            _ => visibility.escalate_to_dynamic(),
        };
        CacheStatus {
            is_static: false,
            visibility,
            required: self.attributes.freeze(),
        }
    }
}
