use serde::{Deserialize, Serialize};

/// Fixed canvas both acquisition paths draw into before detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcquisitionConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl AcquisitionConfig {
    pub fn new() -> Self {
        AcquisitionConfig {
            canvas_width: 500,
            canvas_height: 500,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig::new()
    }
}

/// Padding policy applied around a detected face box before cropping.
/// `offset` is the fractional expansion per side, relative to box width and
/// height; any non-negative value is accepted and 0 disables padding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropConfig {
    pub offset: f32,
}

impl CropConfig {
    pub fn new() -> Self {
        CropConfig { offset: 0.3 }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        CropConfig::new()
    }
}

/// Side length of the canonical square landmark sets are rescaled into
/// before comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizeConfig {
    pub target_size: f32,
}

impl NormalizeConfig {
    pub fn new() -> Self {
        NormalizeConfig { target_size: 500.0 }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig::new()
    }
}

/// Bounds on the external detector. `min_confidence` is forwarded to the
/// detector implementation; `timeout` caps every external call in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorConfig {
    pub min_confidence: f32,
    pub timeout: u64,
}

impl DetectorConfig {
    pub fn new() -> Self {
        DetectorConfig {
            min_confidence: 0.5,
            timeout: 20,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CameraProjection {
    /// Symmetric frustum in world units, before zoom is applied.
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
    /// Vertical field of view in degrees.
    Perspective { fov_deg: f32 },
}

/// Virtual camera and lighting preset used to frontalize a mesh. Presets are
/// external configuration tuned per asset family, not derived from the mesh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    pub projection: CameraProjection,
    pub position: [f32; 3],
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    pub light_direction: [f32; 3],
    pub light_intensity: f32,
    pub ambient_intensity: f32,
    pub clear_color: [u8; 3],
}

impl CameraConfig {
    /// Orthographic preset: frustum of +/-2 world units, camera slightly
    /// above center at z = 5, zoom 1.5.
    pub fn orthographic_default() -> Self {
        CameraConfig {
            projection: CameraProjection::Orthographic {
                left: -2.0,
                right: 2.0,
                top: 2.0,
                bottom: -2.0,
            },
            position: [0.0, 0.2, 5.0],
            zoom: 1.5,
            near: 1.0,
            far: 1000.0,
            light_direction: [0.0, 0.0, 1.0],
            light_intensity: 1.0,
            ambient_intensity: 0.05,
            clear_color: [255, 255, 255],
        }
    }

    /// Narrow-angle perspective preset: 6 degree fov from z = 18.
    pub fn perspective_default() -> Self {
        CameraConfig {
            projection: CameraProjection::Perspective { fov_deg: 6.0 },
            position: [0.0, 0.0, 18.0],
            zoom: 1.0,
            near: 0.1,
            far: 1000.0,
            light_direction: [0.0, 0.0, 1.0],
            light_intensity: 1.0,
            ambient_intensity: 0.05,
            clear_color: [255, 255, 255],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig::orthographic_default()
    }
}

/// One deployment profile for the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineConfig {
    pub acquisition: AcquisitionConfig,
    pub crop: CropConfig,
    pub normalize: NormalizeConfig,
    pub detector: DetectorConfig,
    pub camera: CameraConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        PipelineConfig::default()
    }
}
