// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Label halos.

use std::sync::{Arc, OnceLock};

use super::{CacheContext, CacheStatus, FillCache, StatusBuilder, StyleCache, visible_with};
use crate::expr::Feature;
use crate::paint::{Color, Paint};
use crate::style::{Fill, Halo};

/// Caches a [`Halo`]: a radius and a fill (white when missing).
#[derive(Debug)]
pub struct HaloCache {
    halo: Arc<Halo>,
    context: Arc<CacheContext>,
    fill: FillCache,
    state: OnceLock<HaloState>,
}

#[derive(Debug)]
struct HaloState {
    status: CacheStatus,
    radius: Option<f64>,
}

impl HaloCache {
    /// Creates a cache. Nothing is evaluated yet.
    #[must_use]
    pub fn new(halo: Arc<Halo>, context: Arc<CacheContext>) -> Self {
        let fill = halo
            .fill
            .clone()
            .unwrap_or_else(|| Arc::new(Fill::solid(Color::WHITE)));
        Self {
            fill: FillCache::new(fill, context.clone()),
            halo,
            context,
            state: OnceLock::new(),
        }
    }

    fn state(&self) -> &HaloState {
        self.state.get_or_init(|| {
            let oracle = &*self.context.oracle;
            let expr = self.halo.radius.as_ref();
            let mut b = StatusBuilder::new(oracle);
            b.absorb(self.fill.status());
            let default = self.context.config.default_halo_radius;
            let radius = b
                .expression(expr)
                .then(|| oracle.evaluate_f64(expr, None, default));
            if radius.is_some_and(|r| r <= 0.0) {
                b.mark_never();
            }
            let status = b.finish();
            let radius = radius.filter(|_| !status.visibility.is_never());
            HaloState { status, radius }
        })
    }

    /// Returns the halo fill cache.
    #[must_use]
    pub fn fill(&self) -> &FillCache {
        &self.fill
    }

    /// Returns the radius scaled by `coefficient`; zero when the halo never
    /// paints.
    #[must_use]
    pub fn radius(&self, feature: Option<&dyn Feature>, coefficient: f64) -> f64 {
        let state = self.state();
        if state.status.visibility.is_never() {
            return 0.0;
        }
        let radius = state.radius.unwrap_or_else(|| {
            self.context.oracle.evaluate_f64(
                self.halo.radius.as_ref(),
                feature,
                self.context.config.default_halo_radius,
            )
        });
        radius.max(0.0) * coefficient
    }

    /// Returns the radius and paint for `feature`, or `None` when no halo
    /// would show.
    #[must_use]
    pub fn resolve(
        &self,
        feature: Option<&dyn Feature>,
        coefficient: f64,
    ) -> Option<(f64, Paint)> {
        let radius = self.radius(feature, coefficient);
        if radius <= 0.0 {
            return None;
        }
        Some((radius, self.fill.paint(feature, coefficient)?))
    }
}

impl StyleCache for HaloCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, feature: &dyn Feature) -> bool {
        visible_with(self.status(), || {
            self.radius(Some(feature), 1.0) > 0.0 && self.fill.is_visible(feature)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expression, SimpleFeature};

    fn context() -> Arc<CacheContext> {
        Arc::new(CacheContext::default())
    }

    #[test]
    fn missing_fill_defaults_to_white() {
        let cache = HaloCache::new(Arc::new(Halo::default()), context());
        assert_eq!(cache.status(), &CacheStatus::ALWAYS);
        assert_eq!(
            cache.resolve(None, 2.0),
            Some((2.0, Paint::Solid(Color::WHITE)))
        );
    }

    #[test]
    fn zero_radius_is_never() {
        let halo = Halo {
            radius: Some(Expression::number(0.0)),
            fill: None,
        };
        let cache = HaloCache::new(Arc::new(halo), context());
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert!(cache.resolve(None, 1.0).is_none());
    }

    #[test]
    fn dynamic_radius() {
        let halo = Halo {
            radius: Some(Expression::property("halo")),
            fill: Some(Arc::new(Fill::solid(Color::BLACK))),
        };
        let cache = HaloCache::new(Arc::new(halo), context());
        assert!(cache.required_attributes().contains("halo"));
        let f = SimpleFeature::new().with_attribute("halo", 3.0);
        assert_eq!(cache.radius(Some(&f), 1.0), 3.0);
        assert!(cache.is_visible(&f));
        assert!(!cache.is_visible(&SimpleFeature::new().with_attribute("halo", 0.0)));
        assert_eq!(cache.radius(Some(&SimpleFeature::new()), 1.0), 1.0);
    }
}
