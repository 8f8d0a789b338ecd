use image::imageops::{crop_imm, resize, FilterType};
use image::RgbImage;

use crate::utils::coordinate::CropRegion;

/// Draws a source image onto a freshly allocated canvas of the given fixed
/// size. The image is stretched to fill the canvas, not letterboxed, so
/// both acquisition paths end up in the exact same pixel frame. Decoding
/// and rotation of the source file happen upstream.
pub fn to_canvas(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    resize(image, width, height, FilterType::Triangle)
}

/// Copies a clamped crop region out of a source canvas into its own buffer.
/// The source is left untouched; the caller owns the returned image.
pub fn extract_crop(image: &RgbImage, region: &CropRegion) -> RgbImage {
    crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}
