use image::RgbImage;

use crate::error::error::Result;
use crate::utils::coordinate::{BoundingBox, LandmarkSet};

/// Seam to the external face detection engine.
///
/// Both calls are asynchronous and may fail on the transport level; a clean
/// "nothing found" is reported as `Ok(None)`, never as an empty placeholder.
/// The detector decides internally how many raw detections it keeps, but the
/// contract here is zero-or-one: implementations must return the first (most
/// confident) detection only.
#[allow(async_fn_in_trait)]
pub trait FaceDetector {
    /// Locates at most one face in a full canvas image. The returned box is
    /// in normalized [0, 1] coordinates of that canvas. Detections scoring
    /// below `min_confidence` must be dropped.
    async fn detect_face(
        &self,
        image: &RgbImage,
        min_confidence: f32,
    ) -> Result<Option<BoundingBox>>;

    /// Extracts the fixed-cardinality landmark set from a cropped face
    /// image. Landmarks are in normalized [0, 1] coordinates of the crop.
    async fn detect_landmarks(&self, face: &RgbImage) -> Result<Option<LandmarkSet>>;
}
