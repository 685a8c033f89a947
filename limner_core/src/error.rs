// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! None of these ever abort a render pass. They explain why a cache was
//! degraded to painting nothing, or why a symbolizer was left out of its
//! rule.

use thiserror::Error;

use crate::style::SymbolizerKind;

/// Failure to fetch an external resource.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// No resource is registered under this URI.
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// Failure while building or evaluating a cache.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A mark's well-known name is not a shape this crate can draw.
    #[error("unknown mark shape {0:?}")]
    UnknownMark(String),
    /// An external graphic could not be fetched.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// External graphic bytes could not be decoded as an image.
    #[error("cannot decode external graphic: {0}")]
    Decode(String),
    /// A factory was asked to build a cache for the wrong symbolizer kind.
    #[error("factory for {expected:?} symbolizers received a {found:?} symbolizer")]
    KindMismatch {
        /// Kind the factory handles.
        expected: SymbolizerKind,
        /// Kind it was given.
        found: SymbolizerKind,
    },
    /// A raster outline must be a line or polygon symbolizer.
    #[error("raster outline must be a line or polygon symbolizer, not {0:?}")]
    InvalidOutline(SymbolizerKind),
}
