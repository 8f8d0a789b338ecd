use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// A 2-D point, either in normalized [0, 1] coordinates relative to the
/// frame it was detected in, or in absolute pixel coordinates of a canvas.
/// Functions taking points document which semantics they expect; the two
/// must never be mixed without an explicit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Point2D { x, y }
    }

    /// Euclidean distance to another point in the same coordinate frame.
    pub fn distance(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx.powi(2) + dy.powi(2)).sqrt()
    }
}

/// An axis-aligned face bounding box in normalized coordinates relative to
/// the frame it was computed from. `max_x >= min_x` and `max_y >= min_y`;
/// a zero-extent box is a detector failure, not a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    /// Builds a box from a center point plus extents, the shape short-range
    /// face detectors report their detections in.
    pub fn from_center_size(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        BoundingBox {
            min_x: x_center - width / 2.0,
            min_y: y_center - height / 2.0,
            max_x: x_center + width / 2.0,
            max_y: y_center + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// True when the box has zero extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// An ordered, index-aligned sequence of facial landmarks. The cardinality
/// is fixed by the external detector and treated as opaque here; two sets
/// are comparable only when index `i` in both refers to the same anatomical
/// point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Point2D>,
}

impl LandmarkSet {
    pub fn from_points(points: Vec<Point2D>) -> Self {
        LandmarkSet { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point2D> {
        self.points.iter()
    }

    /// Converts the set into an (L, 2) array for numeric post-processing.
    pub fn to_array2(&self) -> Array2<f32> {
        let mut flat: Vec<f32> = Vec::with_capacity(self.points.len() * 2);
        for point in &self.points {
            flat.push(point.x);
            flat.push(point.y);
        }
        Array2::from_shape_vec((self.points.len(), 2), flat)
            .expect("landmark buffer length is always 2 * L")
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Point2D;

    fn index(&self, idx: usize) -> &Point2D {
        &self.points[idx]
    }
}

/// A rectangular face region in pixel space of a source canvas, clamped to
/// lie entirely within that canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
