use std::future::Future;
use std::path::Path;
use std::time::Duration;

use image::RgbImage;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::config::PipelineConfig;
use crate::error::error::{PipelineError, Result};
use crate::helper::face_helper::FaceLocalizer;
use crate::helper::landmark_helper::normalize;
use crate::modules::face_detector::FaceDetector;
use crate::modules::frontalizer::Frontalizer;
use crate::modules::mesh_renderer::MeshRenderer;
use crate::pipeline::comparator::{compare, ComparisonResult};
use crate::utils::coordinate::LandmarkSet;
use crate::utils::image::to_canvas;

/// Which comparison slot a pipeline run feeds. Every run names its side
/// explicitly; nothing is inferred from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTag {
    /// Set A, extracted from the photograph.
    Photo,
    /// Set B, extracted from the rendered mesh snapshot.
    Model,
}

/// Transient pair of landmark sets awaiting comparison.
#[derive(Debug, Default)]
struct PendingPair {
    set_a: Option<LandmarkSet>,
    set_b: Option<LandmarkSet>,
}

/// Orchestrates the two acquisition pipelines and fires the comparison once
/// both slots are filled.
///
/// The photo side and the model side are triggered independently and may
/// interleave; slot updates are applied atomically under one lock so a
/// comparison never observes a half-updated pair. Emission is one-shot:
/// both slots reset afterwards, so a new comparison needs both sides
/// re-acquired from scratch and can never pair a fresh run with stale data.
pub struct EvalPipeline<D, R> {
    detector: D,
    renderer: R,
    localizer: FaceLocalizer,
    frontalizer: Frontalizer,
    config: PipelineConfig,
    pending: Mutex<PendingPair>,
}

impl<D: FaceDetector, R: MeshRenderer> EvalPipeline<D, R> {
    /// new initializes new instance of the evaluation pipeline.
    pub fn new(detector: D, renderer: R, config: PipelineConfig) -> Self {
        EvalPipeline {
            detector,
            renderer,
            localizer: FaceLocalizer::new(config.crop.clone()),
            frontalizer: Frontalizer::new(config.camera.clone()),
            config,
            pending: Mutex::new(PendingPair::default()),
        }
    }

    /// process_photo runs the photo-side chain: canonical canvas, face
    /// localization, landmark extraction, canonicalization, then fills
    /// slot A.
    ///
    /// Returns the comparison result once the model side is also present,
    /// `None` while the pair is incomplete. On failure the slot keeps
    /// whatever a previous successful run put there.
    ///
    /// # Arguments
    /// * `image` - decoded source photograph, any resolution
    ///
    /// # Returns
    /// * `Result<Option<ComparisonResult>>`
    pub async fn process_photo(&self, image: &RgbImage) -> Result<Option<ComparisonResult>> {
        info!("processing photo side");
        let canvas = to_canvas(
            image,
            self.config.acquisition.canvas_width,
            self.config.acquisition.canvas_height,
        );
        let landmarks = self.canonical_landmarks(&canvas).await?;
        self.submit(SlotTag::Photo, landmarks).await
    }

    /// process_model runs the model-side chain: mesh load, frontal render,
    /// face localization on the snapshot, landmark extraction,
    /// canonicalization, then fills slot B.
    ///
    /// # Arguments
    /// * `asset_path` - path of the 3-D mesh asset (.obj)
    ///
    /// # Returns
    /// * `Result<Option<ComparisonResult>>`
    pub async fn process_model(&self, asset_path: &Path) -> Result<Option<ComparisonResult>> {
        info!(asset = %asset_path.display(), "processing model side");
        let asset = Frontalizer::load_mesh(asset_path)?;
        let snapshot = self
            .bounded(self.frontalizer.render_frontal_snapshot(
                asset,
                &self.renderer,
                self.config.acquisition.canvas_width,
                self.config.acquisition.canvas_height,
            ))
            .await?;
        let landmarks = self.canonical_landmarks(&snapshot).await?;
        self.submit(SlotTag::Model, landmarks).await
    }

    /// submit stores a canonicalized landmark set into its slot and fires
    /// the comparison if the other side is already present.
    ///
    /// Last write wins per side. Read-decide-write happens under a single
    /// lock; on emission both slots reset.
    pub async fn submit(
        &self,
        tag: SlotTag,
        landmarks: LandmarkSet,
    ) -> Result<Option<ComparisonResult>> {
        let mut pending = self.pending.lock().await;
        match tag {
            SlotTag::Photo => pending.set_a = Some(landmarks),
            SlotTag::Model => pending.set_b = Some(landmarks),
        }
        debug!(
            ?tag,
            has_a = pending.set_a.is_some(),
            has_b = pending.set_b.is_some(),
            "slot updated"
        );

        let (Some(set_a), Some(set_b)) = (&pending.set_a, &pending.set_b) else {
            return Ok(None);
        };

        let result = compare(set_a, set_b)?;
        pending.set_a = None;
        pending.set_b = None;
        info!(
            landmarks = result.landmark_count(),
            mean = result.mean_distance(),
            "comparison emitted"
        );
        Ok(Some(result))
    }

    /// Shared tail of both chains: isolate the face, extract landmarks,
    /// remap them into the canonical square.
    async fn canonical_landmarks(&self, canvas: &RgbImage) -> Result<LandmarkSet> {
        let crop = self
            .bounded(self.localizer.locate_and_crop(
                canvas,
                &self.detector,
                self.config.detector.min_confidence,
            ))
            .await?;
        let landmarks = self
            .bounded(self.detector.detect_landmarks(&crop.image))
            .await?;
        let landmarks = match landmarks {
            None => return Err(PipelineError::NoFaceDetected),
            Some(landmarks) => landmarks,
        };
        normalize(&landmarks, &crop.bbox, self.config.normalize.target_size)
    }

    /// Bounds an external call by the configured timeout. A timed-out run
    /// is reported as `Timeout` and is safe for the caller to re-issue from
    /// the start.
    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let seconds = self.config.detector.timeout;
        match timeout(Duration::from_secs(seconds), call).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(seconds)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::mesh_renderer::SoftwareRenderer;
    use crate::utils::coordinate::{BoundingBox, Point2D};
    use image::Rgb;
    use std::collections::VecDeque;
    use std::io::Write;

    const FACE_BOX: BoundingBox = BoundingBox::new(0.2, 0.2, 0.6, 0.6);

    fn unit_landmarks(count: usize) -> LandmarkSet {
        let points = (0..count)
            .map(|i| {
                let t = i as f32 / count as f32;
                Point2D::new(0.2 + 0.6 * t, 0.3 + 0.4 * t)
            })
            .collect();
        LandmarkSet::from_points(points)
    }

    /// Detector whose detect_face answers are scripted per call; landmark
    /// answers are scripted independently.
    struct ScriptedDetector {
        boxes: std::sync::Mutex<VecDeque<Option<BoundingBox>>>,
        landmarks: std::sync::Mutex<VecDeque<Option<LandmarkSet>>>,
    }

    impl ScriptedDetector {
        fn new(
            boxes: Vec<Option<BoundingBox>>,
            landmarks: Vec<Option<LandmarkSet>>,
        ) -> Self {
            ScriptedDetector {
                boxes: std::sync::Mutex::new(boxes.into()),
                landmarks: std::sync::Mutex::new(landmarks.into()),
            }
        }

        fn repeating(bbox: BoundingBox, landmarks: LandmarkSet, times: usize) -> Self {
            ScriptedDetector::new(
                vec![Some(bbox); times],
                vec![Some(landmarks); times],
            )
        }
    }

    impl FaceDetector for ScriptedDetector {
        async fn detect_face(
            &self,
            _image: &RgbImage,
            _min_confidence: f32,
        ) -> Result<Option<BoundingBox>> {
            Ok(self.boxes.lock().unwrap().pop_front().flatten())
        }

        async fn detect_landmarks(&self, _face: &RgbImage) -> Result<Option<LandmarkSet>> {
            Ok(self.landmarks.lock().unwrap().pop_front().flatten())
        }
    }

    struct SlowDetector;

    impl FaceDetector for SlowDetector {
        async fn detect_face(
            &self,
            _image: &RgbImage,
            _min_confidence: f32,
        ) -> Result<Option<BoundingBox>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Some(FACE_BOX))
        }

        async fn detect_landmarks(&self, _face: &RgbImage) -> Result<Option<LandmarkSet>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Some(unit_landmarks(4)))
        }
    }

    fn photo() -> RgbImage {
        RgbImage::from_pixel(640, 480, Rgb([90, 80, 70]))
    }

    fn triangle_asset() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(b"v -1.0 -1.0 0.0\nv 1.0 -1.0 0.0\nv 0.0 1.0 0.0\nf 1 2 3\n")
            .unwrap();
        file
    }

    #[tokio::test]
    async fn test_both_sides_emit_zero_distance_for_identical_faces() {
        let detector =
            ScriptedDetector::repeating(FACE_BOX, unit_landmarks(8), 4);
        let pipeline =
            EvalPipeline::new(detector, SoftwareRenderer::new(), PipelineConfig::new());

        let first = pipeline.process_photo(&photo()).await.unwrap();
        assert!(first.is_none(), "one filled slot must not emit");

        let asset = triangle_asset();
        let second = pipeline.process_model(asset.path()).await.unwrap();
        let result = second.expect("both slots filled must emit");
        assert_eq!(result.landmark_count(), 8);
        assert!(result.mean_distance() < 1e-4);
    }

    #[tokio::test]
    async fn test_slots_reset_after_emission() {
        let detector =
            ScriptedDetector::repeating(FACE_BOX, unit_landmarks(4), 6);
        let pipeline =
            EvalPipeline::new(detector, SoftwareRenderer::new(), PipelineConfig::new());
        let asset = triangle_asset();

        pipeline.process_photo(&photo()).await.unwrap();
        let emitted = pipeline.process_model(asset.path()).await.unwrap();
        assert!(emitted.is_some());

        // one-shot: the next photo run starts a fresh pair
        let after = pipeline.process_photo(&photo()).await.unwrap();
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn test_failed_run_preserves_other_slot() {
        let detector = ScriptedDetector::new(
            vec![Some(FACE_BOX), None, Some(FACE_BOX)],
            vec![Some(unit_landmarks(4)), Some(unit_landmarks(4))],
        );
        let pipeline =
            EvalPipeline::new(detector, SoftwareRenderer::new(), PipelineConfig::new());
        let asset = triangle_asset();

        pipeline.process_photo(&photo()).await.unwrap();

        // model side fails: no face in the rendered snapshot
        let err = pipeline.process_model(asset.path()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoFaceDetected));

        // the photo slot survived the failed model run
        let retried = pipeline.process_model(asset.path()).await.unwrap();
        assert!(retried.is_some());
    }

    #[tokio::test]
    async fn test_resubmitting_a_side_overwrites_it() {
        let detector = ScriptedDetector::new(vec![], vec![]);
        let pipeline =
            EvalPipeline::new(detector, SoftwareRenderer::new(), PipelineConfig::new());

        let stale = LandmarkSet::from_points(vec![Point2D::new(0.0, 0.0)]);
        let fresh = LandmarkSet::from_points(vec![Point2D::new(3.0, 4.0)]);
        let model = LandmarkSet::from_points(vec![Point2D::new(3.0, 4.0)]);

        assert!(pipeline.submit(SlotTag::Photo, stale).await.unwrap().is_none());
        assert!(pipeline.submit(SlotTag::Photo, fresh).await.unwrap().is_none());

        let result = pipeline.submit(SlotTag::Model, model).await.unwrap().unwrap();
        assert_eq!(result.mean_distance(), 0.0, "latest photo submission wins");
    }

    #[tokio::test]
    async fn test_count_mismatch_surfaces_as_hard_error() {
        let detector = ScriptedDetector::new(vec![], vec![]);
        let pipeline =
            EvalPipeline::new(detector, SoftwareRenderer::new(), PipelineConfig::new());

        pipeline
            .submit(SlotTag::Photo, unit_landmarks(468))
            .await
            .unwrap();
        let err = pipeline
            .submit(SlotTag::Model, unit_landmarks(300))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LandmarkCountMismatch { left: 468, right: 300 }
        ));
    }

    #[tokio::test]
    async fn test_slow_detector_times_out() {
        let mut config = PipelineConfig::new();
        config.detector.timeout = 0;
        let pipeline = EvalPipeline::new(SlowDetector, SoftwareRenderer::new(), config);

        let err = pipeline.process_photo(&photo()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(0)));
        assert!(err.is_retryable());
    }
}
