// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display lists and damage tracking for limner portrayal.
//!
//! This crate sits between [`limner_core`]'s caches and a concrete
//! rasterizer. It defines:
//!
//! - [`RenderItem`]: a single recorded paint call
//! - [`RenderPlan`]: an ordered list of paint calls, itself a
//!   [`Canvas`](limner_core::portray::Canvas)
//! - [`DamageRegion`]: the area a set of features may have painted
//! - [`Portrayer`]: applies rule selection (scale range, filter, else rules)
//!   and dispatches every symbolizer to its registered renderer

#![cfg_attr(docsrs, feature(doc_cfg))]

mod damage;
mod plan;
mod portrayer;

pub use damage::DamageRegion;
pub use plan::{RenderItem, RenderPlan};
pub use portrayer::Portrayer;
