use std::path::Path;

use image::RgbImage;
use nalgebra::Vector3;
use tracing::debug;

use crate::config::config::CameraConfig;
use crate::error::error::{PipelineError, Result};
use crate::modules::mesh_renderer::{MeshAsset, MeshPart, MeshRenderer};

/// Turns a 3-D mesh asset into a frontal 2-D snapshot comparable to a
/// photograph: load, recenter every part on its own bounding-box centroid,
/// render from the configured fixed camera.
#[derive(Debug, Clone)]
pub struct Frontalizer {
    camera: CameraConfig,
}

impl Frontalizer {
    /// new initializes new instance of the frontalizer.
    pub fn new(camera: CameraConfig) -> Self {
        Frontalizer { camera }
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    /// load_mesh parses a Wavefront OBJ asset through the external loader.
    /// A file that parses to zero geometry is as unusable as one that does
    /// not parse at all, so both fail with `AssetLoadError`. No retry.
    ///
    /// # Arguments
    /// * `path` - path of the .obj asset
    ///
    /// # Returns
    /// * `Result<MeshAsset>`
    pub fn load_mesh(path: &Path) -> Result<MeshAsset> {
        let load_options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &load_options)
            .map_err(|err| PipelineError::AssetLoadError(err.to_string()))?;

        let parts: Vec<MeshPart> = models
            .into_iter()
            .map(|model| MeshPart {
                positions: model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(|xyz| Vector3::new(xyz[0], xyz[1], xyz[2]))
                    .collect(),
                indices: model.mesh.indices,
            })
            .filter(|part| !part.positions.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(PipelineError::AssetLoadError(format!(
                "asset {} contains no geometry",
                path.display()
            )));
        }

        debug!(parts = parts.len(), "mesh asset loaded");
        Ok(MeshAsset { parts })
    }

    /// render_frontal_snapshot recenters the asset and renders one raster
    /// snapshot of it from the configured camera. The recentering is
    /// mandatory: the camera preset assumes a subject centered at the
    /// origin regardless of how the asset was authored.
    ///
    /// # Arguments
    /// * `mesh` - loaded mesh asset, consumed by value
    /// * `renderer` - scene renderer
    /// * `width` - snapshot width in pixels
    /// * `height` - snapshot height in pixels
    ///
    /// # Returns
    /// * `Result<RgbImage>`
    pub async fn render_frontal_snapshot<R: MeshRenderer>(
        &self,
        mut mesh: MeshAsset,
        renderer: &R,
        width: u32,
        height: u32,
    ) -> Result<RgbImage> {
        mesh.recenter_parts();
        renderer.render(&mesh, &self.camera, width, height).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::mesh_renderer::SoftwareRenderer;
    use image::Rgb;
    use std::io::Write;

    const TRIANGLE_OBJ: &str = "\
o face
v 9.0 9.0 9.0
v 11.0 9.0 9.0
v 10.0 11.0 9.0
f 1 2 3
";

    fn write_asset(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_mesh_reads_triangle() {
        let file = write_asset(TRIANGLE_OBJ);
        let asset = Frontalizer::load_mesh(file.path()).unwrap();
        assert_eq!(asset.parts.len(), 1);
        assert_eq!(asset.parts[0].positions.len(), 3);
        assert_eq!(asset.parts[0].indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_load_mesh_missing_file_is_asset_load_error() {
        let err = Frontalizer::load_mesh(Path::new("/nonexistent/face.obj")).unwrap_err();
        assert!(matches!(err, PipelineError::AssetLoadError(_)));
    }

    #[test]
    fn test_load_mesh_without_geometry_is_asset_load_error() {
        let file = write_asset("# just a comment\n");
        let err = Frontalizer::load_mesh(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::AssetLoadError(_)));
    }

    #[tokio::test]
    async fn test_render_frontal_snapshot_recenters_offset_asset() {
        // the triangle is authored around (10, 10, 9); without recentering
        // it would be far outside the orthographic frustum
        let file = write_asset(TRIANGLE_OBJ);
        let asset = Frontalizer::load_mesh(file.path()).unwrap();

        let frontalizer = Frontalizer::new(CameraConfig::orthographic_default());
        let snapshot = frontalizer
            .render_frontal_snapshot(asset, &SoftwareRenderer::new(), 500, 500)
            .await
            .unwrap();

        assert_eq!(snapshot.dimensions(), (500, 500));
        let shaded = snapshot
            .pixels()
            .any(|pixel| pixel != &Rgb([255, 255, 255]));
        assert!(shaded, "recentered asset must land inside the frustum");
    }
}
