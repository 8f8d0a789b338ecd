use crate::error::error::{PipelineError, Result};
use crate::utils::coordinate::{BoundingBox, LandmarkSet, Point2D};

/// normalize remaps a landmark set linearly from the span of its source
/// bounding box into a fixed canonical square of side `target_size`.
///
/// This is the single normalization policy of the pipeline: it is
/// scale-invariant, so landmark sets detected at different native
/// resolutions or crop paddings land in the same coordinate frame. The
/// landmarks and `source_bbox` must share one frame (normalized or pixel,
/// as long as it is the same one).
///
/// # Arguments
/// * `landmarks` - raw detector output
/// * `source_bbox` - the face bounding box in the landmarks' frame
/// * `target_size` - side length of the canonical square
///
/// # Returns
/// * `Result<LandmarkSet>` - landmarks in canonical pixel space
pub fn normalize(
    landmarks: &LandmarkSet,
    source_bbox: &BoundingBox,
    target_size: f32,
) -> Result<LandmarkSet> {
    if source_bbox.is_degenerate() {
        return Err(PipelineError::DegenerateBoundingBox(*source_bbox));
    }

    let span_x = source_bbox.width();
    let span_y = source_bbox.height();

    let points = landmarks
        .iter()
        .map(|point| Point2D {
            x: (point.x - source_bbox.min_x) * target_size / span_x,
            y: (point.y - source_bbox.min_y) * target_size / span_y,
        })
        .collect();

    Ok(LandmarkSet::from_points(points))
}

/// scale_to_canvas multiplies normalized [0, 1] landmarks by a fixed canvas
/// size. Scale-fragile fallback: only valid when both compared sides are
/// provably rendered into identically sized canvases. Prefer [`normalize`].
pub fn scale_to_canvas(landmarks: &LandmarkSet, width: u32, height: u32) -> LandmarkSet {
    let points = landmarks
        .iter()
        .map(|point| Point2D {
            x: point.x * width as f32,
            y: point.y * height as f32,
        })
        .collect();
    LandmarkSet::from_points(points)
}
