use image::RgbImage;
use tracing::debug;

use crate::config::config::CropConfig;
use crate::error::error::{PipelineError, Result};
use crate::modules::face_detector::FaceDetector;
use crate::utils::coordinate::{BoundingBox, CropRegion};
use crate::utils::image::extract_crop;

/// A face region isolated from a source canvas. `image` is a private buffer
/// owned by this crop; `bbox` is the detection box re-expressed in the
/// normalized [0, 1] frame of the crop itself, which is the frame the
/// landmark extractor reports in.
#[derive(Debug, Clone)]
pub struct FaceCrop {
    pub image: RgbImage,
    pub bbox: BoundingBox,
}

/// Isolates the face region of a canvas via the external detector, with a
/// symmetric padding policy around the detected box.
#[derive(Debug, Clone)]
pub struct FaceLocalizer {
    config: CropConfig,
}

impl FaceLocalizer {
    /// new initializes new instance of the face localizer.
    pub fn new(config: CropConfig) -> Self {
        FaceLocalizer { config }
    }

    /// locate_and_crop runs face detection on a canvas image and returns the
    /// padded, clamped face region as a freshly allocated sub-image.
    ///
    /// Zero detections fail with `NoFaceDetected`; callers must never feed
    /// an un-cropped canvas to the landmark extractor.
    ///
    /// # Arguments
    /// * `image` - source canvas, left untouched
    /// * `detector` - external face detection engine
    /// * `min_confidence` - confidence floor forwarded to the detector
    ///
    /// # Returns
    /// * `Result<FaceCrop>`
    pub async fn locate_and_crop<D: FaceDetector>(
        &self,
        image: &RgbImage,
        detector: &D,
        min_confidence: f32,
    ) -> Result<FaceCrop> {
        let detection = detector.detect_face(image, min_confidence).await?;
        let bbox = match detection {
            None => return Err(PipelineError::NoFaceDetected),
            Some(bbox) => bbox,
        };
        debug!(?bbox, "face detected");

        let region = crop_region(&bbox, image.width(), image.height(), self.config.offset)?;
        debug!(?region, "face region after padding and clamping");

        let face = extract_crop(image, &region);
        let bbox = bbox_in_crop(&bbox, &region, image.width(), image.height());

        Ok(FaceCrop { image: face, bbox })
    }
}

/// crop_region expands a normalized detection box symmetrically by `offset`
/// of its width/height per side and clamps the resulting pixel region so it
/// lies entirely within the source canvas.
///
/// # Arguments
/// * `bbox` - detection box, normalized to the canvas
/// * `canvas_width` - source canvas width in pixels
/// * `canvas_height` - source canvas height in pixels
/// * `offset` - fractional padding per side, non-negative; 0 disables
///
/// # Returns
/// * `Result<CropRegion>`
pub fn crop_region(
    bbox: &BoundingBox,
    canvas_width: u32,
    canvas_height: u32,
    offset: f32,
) -> Result<CropRegion> {
    if bbox.is_degenerate() {
        return Err(PipelineError::DegenerateBoundingBox(*bbox));
    }

    let source_width = canvas_width as f32;
    let source_height = canvas_height as f32;

    let mut width = bbox.width() * source_width;
    let mut height = bbox.height() * source_height;
    let x_offset = width * offset;
    let y_offset = height * offset;

    let x = (bbox.min_x * source_width - x_offset).clamp(0.0, source_width - 1.0);
    let y = (bbox.min_y * source_height - y_offset).clamp(0.0, source_height - 1.0);
    width = (width + 2.0 * x_offset).min(source_width - x);
    height = (height + 2.0 * y_offset).min(source_height - y);

    let x = x.floor() as u32;
    let y = y.floor() as u32;
    let width = (width.round() as u32).clamp(1, canvas_width - x);
    let height = (height.round() as u32).clamp(1, canvas_height - y);

    Ok(CropRegion { x, y, width, height })
}

/// Re-expresses a canvas-normalized detection box in the normalized frame of
/// the pixel crop derived from it.
pub fn bbox_in_crop(
    bbox: &BoundingBox,
    region: &CropRegion,
    canvas_width: u32,
    canvas_height: u32,
) -> BoundingBox {
    let source_width = canvas_width as f32;
    let source_height = canvas_height as f32;
    BoundingBox {
        min_x: (bbox.min_x * source_width - region.x as f32) / region.width as f32,
        min_y: (bbox.min_y * source_height - region.y as f32) / region.height as f32,
        max_x: (bbox.max_x * source_width - region.x as f32) / region.width as f32,
        max_y: (bbox.max_y * source_height - region.y as f32) / region.height as f32,
    }
}
