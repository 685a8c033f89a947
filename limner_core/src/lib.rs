// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style evaluation cache for feature portrayal.
//!
//! `limner_core` turns a cartographic style (fills, strokes, graphics, labels
//! whose properties are [expressions](expr::Expression) over feature
//! attributes) into reusable runtime caches. Each cache inspects its
//! expressions once, classifies them as *static* or *dynamic*, precomputes
//! whatever it can, and afterwards hands out ready-to-paint attributes either
//! instantly or by evaluating only the dynamic residue for a feature.
//!
//! # Architecture
//!
//! ```text
//!   Rule / Symbolizer (Arc style graph)
//!       │
//!       ▼
//!   CacheRegistry::get_rule() ──► RuleCache ──► [SymbolizerCache]
//!                                                    │ (lazy, once)
//!                 ┌──────────────────────────────────┘
//!                 ▼
//!   leaf caches (fill, stroke, graphic, font, ...) ──► CacheStatus
//!                                                    │
//!                 ┌──────────────────────────────────┘
//!                 ▼
//!   CacheRegistry::find_handler(kind) ──► SymbolizerRenderer ──► Canvas
//! ```
//!
//! **[`expr`]** — Values, expressions, filters, the [`Feature`](expr::Feature)
//! trait and the [`ExpressionOracle`](expr::ExpressionOracle) that decides
//! what is static and evaluates what is not.
//!
//! **[`style`]** — The immutable style graph the caches read from.
//!
//! **[`cache`]** — The [`StyleCache`](cache::StyleCache) contract, the
//! three-valued [`Visibility`](cache::Visibility) lattice, required attribute
//! sets, and every leaf cache.
//!
//! **[`symbolizer`]** — Composite caches for point, line, polygon, raster and
//! text symbolizers.
//!
//! **[`rule`]** — [`RuleCache`](rule::RuleCache): filter plus ordered
//! symbolizer caches.
//!
//! **[`registry`]** — Identity-keyed [`CacheRegistry`](registry::CacheRegistry)
//! with at-most-once construction and the per-kind handler table.
//!
//! **[`portray`]** — The [`Canvas`](portray::Canvas) seam and the default
//! [`SymbolizerRenderer`](portray::SymbolizerRenderer)s.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): derives `Serialize`/`Deserialize` for
//!   [`CacheConfig`](config::CacheConfig).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod cache;
pub mod config;
pub mod error;
pub mod expr;
pub mod geometry;
pub mod paint;
pub mod portray;
pub mod registry;
pub mod resource;
pub mod rule;
pub mod style;
pub mod symbolizer;

mod raster;
