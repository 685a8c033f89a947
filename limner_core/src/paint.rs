// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ready-to-paint attribute types produced by the caches.

use core::fmt;
use std::sync::Arc;

use image::RgbaImage;

/// A straight (non-premultiplied) 8-bit RGBA color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (0 = fully transparent).
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque mid gray (`#808080`).
    pub const GRAY: Self = Self::rgb(128, 128, 128);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Creates an opaque color.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with an explicit alpha.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb`, `#rrggbbaa` or the same without the leading `#`.
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Returns `true` if the alpha channel is zero.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Returns this color with its alpha multiplied by `factor` (clamped to
    /// `0.0..=1.0`).
    #[must_use]
    pub fn with_opacity(self, factor: f64) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is clamped to 0..=255 before the cast"
        )]
        let a = (f64::from(self.a) * factor).round().clamp(0.0, 255.0) as u8;
        Self { a, ..self }
    }

    /// Returns the channels as `[r, g, b, a]`.
    #[inline]
    #[must_use]
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Color(#{:02x}{:02x}{:02x}{:02x})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// What a fill or stroke paints with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A flat color.
    Solid(Color),
    /// A tiled raster pattern produced from a nested graphic.
    Pattern(Arc<RgbaImage>),
}

impl Paint {
    /// Returns the flat color, if this is a solid paint.
    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Solid(color) => Some(*color),
            Self::Pattern(_) => None,
        }
    }
}

/// Font slant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright glyphs.
    #[default]
    Normal,
    /// Cursive italic glyphs.
    Italic,
    /// Slanted upright glyphs.
    Oblique,
}

impl FontStyle {
    /// Parses a CSS-like style keyword, case-insensitively.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "italic" => Some(Self::Italic),
            "oblique" => Some(Self::Oblique),
            _ => None,
        }
    }
}

/// Font weight on the usual 100–900 scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Regular weight.
    pub const NORMAL: Self = Self(400);
    /// Bold weight.
    pub const BOLD: Self = Self(700);

    /// Parses `normal`, `bold` or a numeric weight.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "normal" => Some(Self::NORMAL),
            "bold" => Some(Self::BOLD),
            _ => text
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(Self),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// A resolved font request for label rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family names in preference order.
    pub families: Vec<Arc<str>>,
    /// Slant.
    pub style: FontStyle,
    /// Weight.
    pub weight: FontWeight,
    /// Size in pixels, already multiplied by the display coefficient.
    pub size: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_variants() {
        assert_eq!(Color::parse_hex("#ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse_hex("00ff0080"), Some(Color::rgba(0, 255, 0, 128)));
        assert_eq!(Color::parse_hex("#fff"), None);
        assert_eq!(Color::parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn opacity_scales_alpha() {
        assert_eq!(Color::BLACK.with_opacity(0.5).a, 128);
        assert!(Color::BLACK.with_opacity(0.0).is_transparent());
        assert_eq!(Color::BLACK.with_opacity(2.0).a, 255);
    }

    #[test]
    fn font_weight_keywords() {
        assert_eq!(FontWeight::parse("Bold"), Some(FontWeight::BOLD));
        assert_eq!(FontWeight::parse("300"), Some(FontWeight(300)));
        assert_eq!(FontWeight::parse("heavy"), None);
        assert_eq!(FontStyle::parse("ITALIC"), Some(FontStyle::Italic));
    }
}
