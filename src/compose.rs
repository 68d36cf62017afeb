//! Runs a layer plan against the background layout.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::asset::AssetStore;
use crate::error::Result;
use crate::layer::{LayerDirective, LayerPlan, SourceFit};
use crate::raster::{CardImage, Canvas, SizePx};

/// Composes cards from assets.
///
/// Layers are applied strictly in plan order. The first asset that fails to
/// load aborts the card; there is no partially composed output.
pub struct CompositionEngine<'a> {
    assets: &'a AssetStore,
    filter: FilterType,
}

impl<'a> CompositionEngine<'a> {
    pub fn new(assets: &'a AssetStore, filter: FilterType) -> Self {
        Self { assets, filter }
    }

    pub fn compose(&self, plan: &LayerPlan) -> Result<CardImage> {
        let mut canvas = Canvas::from_image(self.prepare(&plan.base)?);

        for layer in &plan.layers {
            let image = self.prepare(layer)?;
            canvas.draw(&image, layer.offset);
            tracing::trace!(step = layer.step.name(), x = layer.offset.x, y = layer.offset.y, "layer drawn");
        }

        Ok(canvas.seal())
    }

    /// Loads a layer's asset and brings it to its target size.
    fn prepare(&self, layer: &LayerDirective) -> Result<RgbaImage> {
        let source = self
            .assets
            .load(layer.step.name(), &layer.source, layer.shared)?;

        let fitted = match layer.fit {
            SourceFit::AsIs => None,
            SourceFit::Crop(window) => Some(crop_top_left(&source, window)),
            SourceFit::CoverThenCrop(window) => Some(cover_then_crop(&source, window, self.filter)),
        };

        Ok(match (fitted, layer.size) {
            (Some(img), Some(size)) => resize_to(&img, size, self.filter),
            (Some(img), None) => img,
            (None, Some(size)) => resize_to(&source, size, self.filter),
            (None, None) => (*source).clone(),
        })
    }
}

fn resize_to(image: &RgbaImage, size: SizePx, filter: FilterType) -> RgbaImage {
    if SizePx::of(image) == size {
        return image.clone();
    }
    imageops::resize(image, size.width, size.height, filter)
}

/// Keeps the top-left `window`, clamped to the image bounds.
pub fn crop_top_left(image: &RgbaImage, window: SizePx) -> RgbaImage {
    imageops::crop_imm(image, 0, 0, window.width, window.height).to_image()
}

/// Size an image must be scaled to so it covers `window` while keeping its
/// aspect ratio. The side with the smaller ratio is matched exactly.
pub fn cover_size(source: SizePx, window: SizePx) -> SizePx {
    let (w, h) = (source.width as u64, source.height as u64);
    let (tw, th) = (window.width as u64, window.height as u64);
    if w == 0 || h == 0 {
        return window;
    }
    // h / th < w / tw, compared without division.
    if h * tw < w * th {
        let width = (w * th + h / 2) / h;
        SizePx::new(width.max(tw) as u32, window.height)
    } else {
        let height = (h * tw + w / 2) / w;
        SizePx::new(window.width, height.max(th) as u32)
    }
}

/// Scales an arbitrary image to cover `window`, then keeps its top-left part.
pub fn cover_then_crop(image: &RgbaImage, window: SizePx, filter: FilterType) -> RgbaImage {
    let size = SizePx::of(image);
    if size == window {
        return image.clone();
    }
    let cover = cover_size(size, window);
    let scaled = resize_to(image, cover, filter);
    crop_top_left(&scaled, window)
}
