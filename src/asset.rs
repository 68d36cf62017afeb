//! Asset loading with a shared, read-only decode cache.
//!
//! Raster assets (PNG, JPEG, ...) are decoded with `image`. SVG assets are
//! rasterized at their intrinsic size with resvg so they go through the same
//! crop/resize path as any other image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{CardError, Result};

/// Loads assets from a root folder.
///
/// Assets marked as shared are decoded once and reused; the cache is only
/// locked for writing when a new entry is inserted, so the store can be used
/// from several workers at once.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    cache: RwLock<HashMap<PathBuf, Arc<RgbaImage>>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads `relative` (under the root). `step` names the failure.
    pub fn load(&self, step: &'static str, relative: &Path, shared: bool) -> Result<Arc<RgbaImage>> {
        if shared {
            if let Some(hit) = self.cached(relative) {
                return Ok(hit);
            }
        }

        let path = self.root.join(relative);
        let image = Arc::new(decode_file(&path).map_err(|reason| CardError::asset(step, &path, reason))?);
        tracing::debug!(step, path = %path.display(), "asset decoded");

        if shared {
            if let Ok(mut cache) = self.cache.write() {
                cache.insert(relative.to_path_buf(), Arc::clone(&image));
            }
        }
        Ok(image)
    }

    fn cached(&self, relative: &Path) -> Option<Arc<RgbaImage>> {
        self.cache.read().ok()?.get(relative).cloned()
    }

    /// Number of decoded assets held in the cache.
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Drops every cached asset.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

fn decode_file(path: &Path) -> std::result::Result<RgbaImage, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let is_svg = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        render_svg(&bytes).ok_or_else(|| "unreadable SVG".to_string())
    } else {
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|e| e.to_string())
    }
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Rasterizes SVG data at its intrinsic size.
///
/// Returns `None` if the SVG cannot be parsed or has an empty size.
pub fn render_svg(svg_data: &[u8]) -> Option<RgbaImage> {
    let tree = Tree::from_data(svg_data, &Options::default()).ok()?;

    let svg_size = tree.size();
    let width = svg_size.width().ceil() as u32;
    let height = svg_size.height().ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    Some(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    // tiny_skia pixels are premultiplied.
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }

    img
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#00ff00"/></svg>"##;

    #[test]
    fn render_simple_svg() {
        let img = render_svg(SIMPLE_SVG.as_bytes()).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
        assert_eq!(img.get_pixel(10, 5).0, [0, 255, 0, 255]);
    }

    #[test]
    fn invalid_svg_is_none() {
        assert!(render_svg(b"<svg").is_none());
    }

    #[test]
    fn loads_png_and_svg_from_root() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("icon.png"))
            .unwrap();
        std::fs::write(dir.path().join("art.svg"), SIMPLE_SVG).unwrap();

        let store = AssetStore::new(dir.path());
        let png = store.load("Rank", Path::new("icon.png"), true).unwrap();
        assert_eq!(png.get_pixel(0, 0).0, [1, 2, 3, 255]);

        let svg = store.load("Artwork", Path::new("art.svg"), false).unwrap();
        assert_eq!(svg.width(), 20);
        assert_eq!(store.cached_len(), 1);

        let again = store.load("Rank", Path::new("icon.png"), true).unwrap();
        assert!(Arc::ptr_eq(&png, &again));

        store.clear_cache();
        assert_eq!(store.cached_len(), 0);
    }

    #[test]
    fn missing_asset_reports_step() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let err = store
            .load("Banner", Path::new("banner/monsters.png"), true)
            .unwrap_err();
        assert_eq!(err.step(), Some("Banner"));
        assert_eq!(err.kind(), crate::error::ErrorKind::AssetNotFound);
    }
}
