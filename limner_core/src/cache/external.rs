// Copyright 2026 the Limner Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! External raster graphics.

use std::sync::{Arc, OnceLock};

use image::RgbaImage;

use super::{CacheContext, CacheStatus, StyleCache};
use crate::error::CacheError;
use crate::expr::Feature;
use crate::style::{ExternalGraphic, GraphicSource};

/// Caches an [`ExternalGraphic`]: the fetched and decoded image.
///
/// Fetching happens on evaluation. A failed fetch or decode is logged and
/// leaves the cache invalid and [`Never`](super::Visibility::Never), so the
/// owning graphic moves on to its next candidate symbol.
#[derive(Debug)]
pub struct ExternalCache {
    external: Arc<ExternalGraphic>,
    context: Arc<CacheContext>,
    state: OnceLock<ExternalState>,
}

#[derive(Debug)]
struct ExternalState {
    status: CacheStatus,
    image: Result<Arc<RgbaImage>, CacheError>,
}

impl ExternalCache {
    /// Creates a cache. Nothing is fetched yet.
    #[must_use]
    pub fn new(external: Arc<ExternalGraphic>, context: Arc<CacheContext>) -> Self {
        Self {
            external,
            context,
            state: OnceLock::new(),
        }
    }

    fn load(&self) -> Result<Arc<RgbaImage>, CacheError> {
        let bytes = match &self.external.source {
            GraphicSource::Inline(bytes) => bytes.clone(),
            GraphicSource::Uri(uri) => self.context.resources.fetch(uri)?,
        };
        let image =
            image::load_from_memory(&bytes).map_err(|e| CacheError::Decode(e.to_string()))?;
        Ok(Arc::new(image.to_rgba8()))
    }

    fn state(&self) -> &ExternalState {
        self.state.get_or_init(|| {
            let image = self.load();
            let status = match &image {
                Ok(_) => CacheStatus::ALWAYS,
                Err(error) => {
                    let source = match &self.external.source {
                        GraphicSource::Inline(_) => "<inline>",
                        GraphicSource::Uri(uri) => uri.as_str(),
                    };
                    tracing::warn!(%error, source, "external graphic unavailable");
                    CacheStatus::NEVER
                }
            };
            ExternalState { status, image }
        })
    }

    /// Returns `true` if the image was fetched and decoded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state().image.is_ok()
    }

    /// Returns the decoded image at its native size.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.state().image.as_ref().ok()
    }

    /// Returns why the image is unavailable, if it is.
    #[must_use]
    pub fn error(&self) -> Option<&CacheError> {
        self.state().image.as_ref().err()
    }

    /// Returns the native `(width, height)` in pixels.
    #[must_use]
    pub fn native_size(&self) -> Option<(u32, u32)> {
        self.image().map(|image| image.dimensions())
    }
}

impl StyleCache for ExternalCache {
    fn status(&self) -> &CacheStatus {
        &self.state().status
    }

    fn is_visible(&self, _feature: &dyn Feature) -> bool {
        self.is_valid()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba};

    use super::*;
    use crate::error::ResourceError;
    use crate::resource::MemoryResources;

    /// Encodes a solid `width × height` PNG.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    fn uri(uri: &str) -> Arc<ExternalGraphic> {
        Arc::new(ExternalGraphic {
            source: GraphicSource::Uri(uri.into()),
            format: Some("image/png".into()),
        })
    }

    #[test]
    fn resolves_through_resources() {
        let resources = MemoryResources::new().with("icons/pin.png", png(3, 5));
        let context = CacheContext::default().with_resources(Arc::new(resources));
        let cache = ExternalCache::new(uri("icons/pin.png"), Arc::new(context));
        assert!(cache.is_valid());
        assert_eq!(cache.native_size(), Some((3, 5)));
        assert_eq!(cache.status(), &CacheStatus::ALWAYS);
    }

    #[test]
    fn inline_bytes_decode() {
        let external = ExternalGraphic {
            source: GraphicSource::Inline(png(2, 2).into()),
            format: None,
        };
        let cache = ExternalCache::new(Arc::new(external), Arc::new(CacheContext::default()));
        assert_eq!(cache.native_size(), Some((2, 2)));
    }

    #[test]
    fn missing_resource_is_never() {
        let cache = ExternalCache::new(uri("nowhere.png"), Arc::new(CacheContext::default()));
        assert!(!cache.is_valid());
        assert_eq!(cache.status(), &CacheStatus::NEVER);
        assert_eq!(
            cache.error(),
            Some(&CacheError::Resource(ResourceError::NotFound(
                "nowhere.png".into()
            )))
        );
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let external = ExternalGraphic {
            source: GraphicSource::Inline(Arc::from(&b"not an image"[..])),
            format: None,
        };
        let cache = ExternalCache::new(Arc::new(external), Arc::new(CacheContext::default()));
        assert!(matches!(cache.error(), Some(CacheError::Decode(_))));
    }
}
