// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::{Arc, OnceLock};

use crate::cache::{
    CacheContext, CacheStatus, FillCache, FontCache, HaloCache, PlacementCache, StatusBuilder,
    StyleCache, visible_with,
};
use crate::expr::{Expression, Feature};
use crate::paint::{Color, FontSpec, Paint};
use crate::style::{Fill, Font, TextSymbolizer};

/// Caches a [`TextSymbolizer`].
///
/// Labels are never static: the label text is assumed to change per feature.
/// The cache is `Never` only when the label, font or glyph fill can never
/// show. Halo and placement contribute attributes but not visibility.
#[derive(Debug)]
pub struct TextSymbolizerCache {
    label: Option<Expression>,
    font: FontCache,
    fill: FillCache,
    halo: Option<HaloCache>,
    placement: PlacementCache,
    context: Arc<CacheContext>,
    status: OnceLock<CacheStatus>,
}

impl TextSymbolizerCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(text: &TextSymbolizer, context: Arc<CacheContext>) -> Self {
        let font = text
            .font
            .clone()
            .unwrap_or_else(|| Arc::new(Font::default()));
        let fill = text
            .fill
            .clone()
            .unwrap_or_else(|| Arc::new(Fill::solid(Color::BLACK)));
        Self {
            label: text.label.clone(),
            font: FontCache::new(font, context.clone()),
            fill: FillCache::new(fill, context.clone()),
            halo: text
                .halo
                .clone()
                .map(|h| HaloCache::new(h, context.clone())),
            placement: PlacementCache::new(text.placement.as_ref(), context.clone()),
            context,
            status: OnceLock::new(),
        }
    }

    /// Returns the label text for `feature`; `None` when missing or blank.
    #[must_use]
    pub fn label(&self, feature: Option<&dyn Feature>) -> Option<Arc<str>> {
        if self.status().visibility.is_never() {
            return None;
        }
        self.context
            .oracle
            .evaluate_text(self.label.as_ref(), feature)
            .filter(|t| !t.trim().is_empty())
    }

    /// Returns the font cache.
    #[must_use]
    pub fn font_cache(&self) -> &FontCache {
        &self.font
    }

    /// Resolves the font, scaled.
    #[must_use]
    pub fn font(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Arc<FontSpec>> {
        self.font.font(feature, coefficient)
    }

    /// Returns the glyph fill cache.
    #[must_use]
    pub fn fill(&self) -> &FillCache {
        &self.fill
    }

    /// Returns the halo cache, if any.
    #[must_use]
    pub fn halo(&self) -> Option<&HaloCache> {
        self.halo.as_ref()
    }

    /// Returns the placement cache.
    #[must_use]
    pub fn placement(&self) -> &PlacementCache {
        &self.placement
    }

    /// Resolves the glyph paint.
    #[must_use]
    pub fn paint(&self, feature: Option<&dyn Feature>, coefficient: f64) -> Option<Paint> {
        self.fill.paint(feature, coefficient)
    }

    /// Returns the halo radius plus the placement margin.
    #[must_use]
    pub fn margin(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        if self.status().visibility.is_never() {
            return 0.0;
        }
        let halo = self
            .halo
            .as_ref()
            .map_or(0.0, |h| h.radius(feature, coefficient));
        halo + self.placement.margin(feature, coefficient)
    }
}

impl StyleCache for TextSymbolizerCache {
    fn status(&self) -> &CacheStatus {
        self.status.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let mut b = StatusBuilder::new(oracle);
            match &self.label {
                Some(label) => {
                    if b.expression(Some(label))
                        && oracle
                            .evaluate_text(Some(label), None)
                            .is_none_or(|t| t.trim().is_empty())
                    {
                        b.mark_never();
                    }
                }
                None => b.mark_never(),
            }
            b.absorb(self.font.status());
            b.absorb(self.fill.status());
            if let Some(halo) = &self.halo {
                b.absorb_attributes(halo.status());
            }
            b.absorb_attributes(self.placement.status());
            b.mark_dynamic();
            let status = b.finish();
            tracing::trace!(?status, "evaluated text symbolizer");
            status
        })
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.label(Some(feature)).is_some()
                && self.font.is_visible(feature)
                && self.fill.is_visible(feature)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Visibility;
    use crate::expr::SimpleFeature;
    use crate::style::Halo;

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    fn labelled(label: Expression) -> TextSymbolizer {
        TextSymbolizer {
            label: Some(label),
            ..TextSymbolizer::default()
        }
    }

    #[test]
    fn labels_are_never_static() {
        let cache = TextSymbolizerCache::new(&labelled(Expression::text("Paris")), context());
        assert!(!cache.is_static());
        assert_eq!(cache.visibility(), Visibility::DependsOnFeature);
        assert!(cache.required_attributes().is_empty());
        assert_eq!(cache.label(None).as_deref(), Some("Paris"));
        assert_eq!(cache.paint(None, 1.0), Some(Paint::Solid(Color::BLACK)));
    }

    #[test]
    fn missing_label_is_never() {
        let cache = TextSymbolizerCache::new(&TextSymbolizer::default(), context());
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert_eq!(cache.margin(None, 1.0), 0.0);
    }

    #[test]
    fn invisible_fill_is_never() {
        let text = TextSymbolizer {
            fill: Some(Arc::new(Fill::solid(Color::TRANSPARENT))),
            ..labelled(Expression::property("name"))
        };
        let cache = TextSymbolizerCache::new(&text, context());
        assert_eq!(cache.status(), &CacheStatus::NEVER);
    }

    #[test]
    fn halo_adds_attributes_and_margin() {
        let text = TextSymbolizer {
            halo: Some(Arc::new(Halo {
                radius: Some(Expression::property("glow")),
                fill: None,
            })),
            ..labelled(Expression::property("name"))
        };
        let cache = TextSymbolizerCache::new(&text, context());
        assert_eq!(cache.required_attributes().to_vec(), ["glow", "name"]);

        let f = SimpleFeature::new()
            .with_attribute("name", "Lyon")
            .with_attribute("glow", 2.0);
        assert!(cache.is_visible(&f));
        assert_eq!(cache.margin(Some(&f), 2.0), 4.0);
        assert!(!cache.is_visible(&SimpleFeature::new().with_attribute("name", "  ")));
    }
}
