use thiserror::Error;

use crate::utils::coordinate::BoundingBox;

/// Failure taxonomy for the evaluation pipeline.
///
/// Every stage reports the specific kind of failure it hit; nothing is
/// swallowed or silently defaulted. Only [`PipelineError::Timeout`] is safe
/// to retry, and the retry decision belongs to the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no face detected in input image")]
    NoFaceDetected,

    #[error("degenerate bounding box with zero extent: {0:?}")]
    DegenerateBoundingBox(BoundingBox),

    #[error("failed to load mesh asset: {0}")]
    AssetLoadError(String),

    #[error("landmark count mismatch: set A has {left}, set B has {right}")]
    LandmarkCountMismatch { left: usize, right: usize },

    #[error("external call exceeded {0} second(s)")]
    Timeout(u64),

    #[error("detector backend error: {0}")]
    DetectorBackend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether re-running the whole pipeline from the start is a sound
    /// reaction to this failure. Intermediate crops are cheap to recompute,
    /// so a timed-out run holds no state worth salvaging.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
