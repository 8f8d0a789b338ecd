use std::fmt::Write;

use serde::Serialize;

use crate::error::error::{PipelineError, Result};
use crate::utils::coordinate::LandmarkSet;

/// Positional discrepancy between two canonicalized landmark sets.
/// Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    per_landmark_distance: Vec<f32>,
    mean_distance: f32,
    landmark_count: usize,
}

impl ComparisonResult {
    pub fn per_landmark_distance(&self) -> &[f32] {
        &self.per_landmark_distance
    }

    pub fn mean_distance(&self) -> f32 {
        self.mean_distance
    }

    pub fn landmark_count(&self) -> usize {
        self.landmark_count
    }

    /// Line-oriented breakdown, one line per landmark index.
    pub fn detailed_report(&self) -> String {
        let mut report = String::with_capacity(self.per_landmark_distance.len() * 32);
        for (idx, distance) in self.per_landmark_distance.iter().enumerate() {
            writeln!(report, "Distance for landmark {idx}: {distance:.2}")
                .expect("writing to a String cannot fail");
        }
        report
    }

    pub fn summary(&self) -> String {
        format!(
            "Number of Landmarks: {}\nAverage Distance: {:.2}",
            self.landmark_count, self.mean_distance
        )
    }
}

/// compare computes the per-landmark Euclidean distance and its mean over
/// two equal-length, index-aligned landmark sets.
///
/// Pure and deterministic: summation runs in left-to-right index order so
/// the result is bit-stable across runs. Both sets must have been
/// normalized by the same policy and target size; that is a caller
/// obligation the data alone cannot reveal.
///
/// # Arguments
/// * `set_a` - canonicalized photo-side landmarks
/// * `set_b` - canonicalized model-side landmarks
///
/// # Returns
/// * `Result<ComparisonResult>`
pub fn compare(set_a: &LandmarkSet, set_b: &LandmarkSet) -> Result<ComparisonResult> {
    if set_a.len() != set_b.len() {
        return Err(PipelineError::LandmarkCountMismatch {
            left: set_a.len(),
            right: set_b.len(),
        });
    }

    let per_landmark_distance: Vec<f32> = set_a
        .iter()
        .zip(set_b.iter())
        .map(|(a, b)| a.distance(b))
        .collect();

    let mut total = 0.0f32;
    for distance in &per_landmark_distance {
        total += distance;
    }
    let landmark_count = per_landmark_distance.len();
    let mean_distance = if landmark_count == 0 {
        0.0
    } else {
        total / landmark_count as f32
    };

    Ok(ComparisonResult {
        per_landmark_distance,
        mean_distance,
        landmark_count,
    })
}
