// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label fonts.

use std::sync::{Arc, OnceLock};

use super::{CacheContext, CacheStatus, StatusBuilder, StyleCache, visible_with};
use crate::expr::Feature;
use crate::paint::{FontSpec, FontStyle, FontWeight};
use crate::style::Font;

/// Caches a [`Font`] and resolves it to a [`FontSpec`].
///
/// An empty family list resolves to the configured default family. A static
/// zero size makes the font [`Never`](super::Visibility::Never).
#[derive(Debug)]
pub struct FontCache {
    font: Arc<Font>,
    context: Arc<CacheContext>,
    state: OnceLock<FontState>,
}

#[derive(Debug)]
struct FontState {
    status: CacheStatus,
    families: Option<Vec<Arc<str>>>,
    style: Option<FontStyle>,
    weight: Option<FontWeight>,
    size: Option<f64>,
    shared: Option<Arc<FontSpec>>,
}

impl FontCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(font: Arc<Font>, context: Arc<CacheContext>) -> Self {
        Self {
            font,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &FontState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let font = &*self.font;
            let mut b = StatusBuilder::new(oracle);

            let mut families_static = true;
            for family in &font.family {
                families_static &= b.expression(Some(family));
            }
            let families = families_static.then(|| self.families(None));
            let style = b
                .expression(font.style.as_ref())
                .then(|| self.style(None));
            let weight = b
                .expression(font.weight.as_ref())
                .then(|| self.weight(None));
            let size = b.expression(font.size.as_ref()).then(|| {
                oracle.evaluate_f64(
                    font.size.as_ref(),
                    None,
                    self.context.config.default_font_size,
                )
            });
            if size.is_some_and(|s| s <= 0.0) {
                b.mark_never();
            }

            let status = b.finish();
            tracing::trace!(?status, "evaluated font");
            if status.visibility.is_never() {
                return FontState {
                    status,
                    families: None,
                    style: None,
                    weight: None,
                    size: None,
                    shared: None,
                };
            }
            let shared = match (&families, style, weight, size) {
                (Some(families), Some(style), Some(weight), Some(size)) => {
                    Some(Arc::new(FontSpec {
                        families: families.clone(),
                        style,
                        weight,
                        size,
                    }))
                }
                _ => None,
            };
            FontState {
                status,
                families,
                style,
                weight,
                size,
                shared,
            }
        })
    }

    fn families(&self, feature: Option<&dyn Feature>) -> Vec<Arc<str>> {
        let oracle = &*self.context.oracle;
        let families: Vec<Arc<str>> = self
            .font
            .family
            .iter()
            .filter_map(|f| oracle.evaluate_text(Some(f), feature))
            .filter(|f| !f.trim().is_empty())
            .collect();
        if families.is_empty() {
            vec![Arc::from(self.context.config.default_font_family.as_str())]
        } else {
            families
        }
    }

    fn style(&self, feature: Option<&dyn Feature>) -> FontStyle {
        self.context
            .oracle
            .evaluate_text(self.font.style.as_ref(), feature)
            .and_then(|t| FontStyle::parse(&t))
            .unwrap_or_default()
    }

    fn weight(&self, feature: Option<&dyn Feature>) -> FontWeight {
        self.context
            .oracle
            .evaluate_text(self.font.weight.as_ref(), feature)
            .and_then(|t| FontWeight::parse(&t))
            .unwrap_or_default()
    }

    /// Returns the unscaled size for `feature`.
    #[must_use]
    pub fn size(&self, feature: Option<&dyn Feature>) -> f64 {
        let state = self.state();
        if state.status.visibility.is_never() {
            return 0.0;
        }
        state.size.unwrap_or_else(|| {
            self.context.oracle.evaluate_f64(
                self.font.size.as_ref(),
                feature,
                self.context.config.default_font_size,
            )
        })
    }

    /// Resolves the font for `feature` with its size scaled by
    /// `coefficient`. `None` when the size is not positive.
    #[must_use]
    pub fn font(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Arc<FontSpec>> {
        let state = self.state();
        if state.status.visibility.is_never() {
            return None;
        }
        if coefficient == 1.0 {
            if let Some(shared) = &state.shared {
                return Some(shared.clone());
            }
        }
        let size = self.size(feature) * coefficient;
        if size <= 0.0 {
            return None;
        }
        Some(Arc::new(FontSpec {
            families: state
                .families
                .clone()
                .unwrap_or_else(|| self.families(feature)),
            style: state.style.unwrap_or_else(|| self.style(feature)),
            weight: state.weight.unwrap_or_else(|| self.weight(feature)),
            size,
        }))
    }
}

impl StyleCache for FontCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || self.size(Some(feature)) > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Visibility;
    use crate::expr::{Expression, SimpleFeature};

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    #[test]
    fn empty_font_uses_configured_defaults() {
        let cache = FontCache::new(Arc::new(Font::default()), context());
        assert_eq!(cache.status(), &CacheStatus::ALWAYS);
        let spec = cache.font(None, 1.0).expect("font");
        assert_eq!(spec.families, vec![Arc::<str>::from("SansSerif")]);
        assert_eq!(spec.size, 10.0);
        assert_eq!(spec.weight, FontWeight::NORMAL);
        assert!(Arc::ptr_eq(&spec, &cache.font(None, 1.0).expect("font")));
        assert_eq!(cache.font(None, 1.5).map(|f| f.size), Some(15.0));
    }

    #[test]
    fn zero_size_is_never() {
        let font = Font {
            size: Some(Expression::number(0.0)),
            family: vec![Expression::property("family")],
            ..Font::default()
        };
        let cache = FontCache::new(Arc::new(font), context());
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert!(cache.font(None, 1.0).is_none());
    }

    #[test]
    fn dynamic_family_and_weight() {
        let font = Font {
            family: vec![Expression::property("family"), Expression::text("Serif")],
            style: Some(Expression::text("italic")),
            weight: Some(Expression::property("weight")),
            size: Some(Expression::number(12.0)),
        };
        let cache = FontCache::new(Arc::new(font), context());
        assert_eq!(cache.visibility(), Visibility::DependsOnFeature);
        assert_eq!(cache.required_attributes().to_vec(), ["family", "weight"]);

        let f = SimpleFeature::new()
            .with_attribute("family", "Noto Sans")
            .with_attribute("weight", "bold");
        let spec = cache.font(Some(&f), 2.0).expect("font");
        assert_eq!(
            spec.families,
            vec![Arc::<str>::from("Noto Sans"), Arc::from("Serif")]
        );
        assert_eq!(spec.style, FontStyle::Italic);
        assert_eq!(spec.weight, FontWeight::BOLD);
        assert_eq!(spec.size, 24.0);
        assert!(cache.is_visible(&f));
    }
}
