// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable defaults for cache construction.

/// Defaults applied when a style element leaves a property unspecified, and
/// limits for symbol rasterization.
///
/// [`Default`] follows the usual SLD/SE defaults.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    /// Size in pixels of a mark whose graphic has no size.
    pub default_mark_size: f64,
    /// Family used when a font names none.
    pub default_font_family: String,
    /// Font size in pixels when unspecified.
    pub default_font_size: f64,
    /// Halo radius in pixels when unspecified.
    pub default_halo_radius: f64,
    /// Samples per pixel axis when rasterizing marks (clamped to `1..=8`).
    pub supersampling: u8,
    /// Largest width or height of a rasterized symbol.
    pub max_image_dimension: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_mark_size: 6.0,
            default_font_family: String::from("SansSerif"),
            default_font_size: 10.0,
            default_halo_radius: 1.0,
            supersampling: 4,
            max_image_dimension: 2048,
        }
    }
}
