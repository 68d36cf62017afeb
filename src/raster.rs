//! Raster primitives: pixel geometry, the mutable composition canvas and the
//! sealed card image handed to the exporter.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

// ============================================================================
// Geometry
// ============================================================================

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the size of an image.
    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// A position in pixel units, relative to the top-left corner of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointPx {
    pub x: i32,
    pub y: i32,
}

impl PointPx {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Mutable RGBA raster that layers are composited onto.
///
/// A canvas is seeded from the background layout, mutated by each layer in
/// turn, then sealed into a [`CardImage`]. Nothing can draw on a card once it
/// is sealed.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Creates a canvas seeded with an existing image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Creates a fully transparent canvas.
    pub fn transparent(size: SizePx) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 0])),
        }
    }

    /// Draws `src` over the canvas with its top-left corner at `at`.
    pub fn draw(&mut self, src: &RgbaImage, at: PointPx) {
        composite_over(&mut self.image, src, at.x, at.y);
    }

    /// Finishes composition.
    pub fn seal(self) -> CardImage {
        CardImage { image: self.image }
    }
}

/// A fully composed card. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct CardImage {
    image: RgbaImage,
}

impl CardImage {
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn size(&self) -> SizePx {
        SizePx::of(&self.image)
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Draws `src` over `dest` with its top-left corner at (`x`, `y`).
///
/// Source-over blending in straight alpha. Pixels falling outside `dest`
/// are clipped.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let (dest_w, dest_h) = (i64::from(dest.width()), i64::from(dest.height()));

    for (sx, sy, pixel) in src.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let (dx, dy) = (i64::from(x) + i64::from(sx), i64::from(y) + i64::from(sy));
        if !(0..dest_w).contains(&dx) || !(0..dest_h).contains(&dy) {
            continue;
        }
        let target = dest.get_pixel_mut(dx as u32, dy as u32);
        *target = alpha_blend(*pixel, *target);
    }
}

fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    if src[3] == u8::MAX {
        return src;
    }
    let src_a = f32::from(src[3]) / 255.0;
    // Destination contribution left after the source covers it.
    let dst_a = f32::from(dst[3]) / 255.0 * (1.0 - src_a);
    let alpha = src_a + dst_a;
    if alpha <= 0.0 {
        return Rgba([0; 4]);
    }

    let mix = |s: u8, d: u8| ((f32::from(s) * src_a + f32::from(d) * dst_a) / alpha).round() as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (alpha * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces_destination() {
        let mut canvas = Canvas::from_image(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        canvas.draw(&src, PointPx::new(3, 3));
        let card = canvas.seal();

        assert_eq!(card.as_image().get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(card.as_image().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn translucent_source_blends() {
        let mut dest = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let src = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 128]));

        composite_over(&mut dest, &src, 0, 0);

        let [r, g, b, a] = dest.get_pixel(0, 0).0;
        assert_eq!((r, g, a), (127, 0, 255));
        assert_eq!(b, 128);
    }

    #[test]
    fn transparent_destination_takes_source_color() {
        let mut canvas = Canvas::transparent(SizePx::new(4, 4));
        let src = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 200]));

        canvas.draw(&src, PointPx::new(1, 1));
        let card = canvas.seal();

        assert_eq!(card.as_image().get_pixel(1, 1).0, [10, 20, 30, 200]);
        assert_eq!(card.as_image().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut dest = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));

        composite_over(&mut dest, &src, -2, 3);

        assert_eq!(dest.get_pixel(0, 3).0, [255, 255, 255, 255]);
        assert_eq!(dest.get_pixel(2, 3).0, [0, 0, 0, 255]);
        assert_eq!(dest.get_pixel(0, 2).0, [0, 0, 0, 255]);
    }
}
