use image::{Rgb, RgbImage};
use nalgebra::Vector3;
use ndarray::Array2;
use tracing::debug;

use crate::config::config::{CameraConfig, CameraProjection};
use crate::error::error::Result;

/// Base surface reflectance for untextured assets.
const BASE_ALBEDO: f32 = 204.0;

/// One sub-mesh of a loaded asset: a triangle list in world space.
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub positions: Vec<Vector3<f32>>,
    pub indices: Vec<u32>,
}

impl MeshPart {
    /// Center of the axis-aligned bounding box of this part.
    pub fn bounding_box_center(&self) -> Vector3<f32> {
        let mut min = Vector3::repeat(f32::INFINITY);
        let mut max = Vector3::repeat(f32::NEG_INFINITY);
        for position in &self.positions {
            min = min.inf(position);
            max = max.sup(position);
        }
        (min + max) / 2.0
    }

    /// Translates the part so its bounding-box center sits at the origin.
    pub fn recenter(&mut self) {
        if self.positions.is_empty() {
            return;
        }
        let center = self.bounding_box_center();
        for position in &mut self.positions {
            *position -= center;
        }
    }

    fn triangles(&self) -> Vec<[Vector3<f32>; 3]> {
        if self.indices.is_empty() {
            self.positions
                .chunks_exact(3)
                .map(|chunk| [chunk[0], chunk[1], chunk[2]])
                .collect()
        } else {
            self.indices
                .chunks_exact(3)
                .filter_map(|idx| {
                    let a = *self.positions.get(idx[0] as usize)?;
                    let b = *self.positions.get(idx[1] as usize)?;
                    let c = *self.positions.get(idx[2] as usize)?;
                    Some([a, b, c])
                })
                .collect()
        }
    }
}

/// A 3-D mesh asset, possibly made of several sub-meshes.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub parts: Vec<MeshPart>,
}

impl MeshAsset {
    /// Recenters every part on its own bounding-box centroid. The fixed
    /// virtual camera assumes a centered subject, so this runs before every
    /// render regardless of how the asset was authored.
    pub fn recenter_parts(&mut self) {
        for part in &mut self.parts {
            part.recenter();
        }
    }
}

/// Seam to the scene renderer: mesh in, single raster snapshot out.
#[allow(async_fn_in_trait)]
pub trait MeshRenderer {
    async fn render(
        &self,
        mesh: &MeshAsset,
        camera: &CameraConfig,
        width: u32,
        height: u32,
    ) -> Result<RgbImage>;
}

/// Built-in z-buffered software rasterizer. Flat shading with one
/// directional light plus an ambient term, no textures; enough to hand a
/// recognizable frontal face image to the detector.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRenderer;

impl SoftwareRenderer {
    pub fn new() -> Self {
        SoftwareRenderer
    }

    /// Projects a world-space vertex to (screen x, screen y, view depth).
    /// Returns `None` outside the near/far range.
    fn project(
        &self,
        vertex: &Vector3<f32>,
        camera: &CameraConfig,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let view = vertex - Vector3::from(camera.position);
        let depth = -view.z;
        if depth < camera.near || depth > camera.far {
            return None;
        }

        let (ndc_x, ndc_y) = match camera.projection {
            CameraProjection::Orthographic { left, right, top, bottom } => {
                let half_width = (right - left) / 2.0 / camera.zoom;
                let half_height = (top - bottom) / 2.0 / camera.zoom;
                let center_x = (left + right) / 2.0;
                let center_y = (top + bottom) / 2.0;
                ((view.x - center_x) / half_width, (view.y - center_y) / half_height)
            }
            CameraProjection::Perspective { fov_deg } => {
                let focal = camera.zoom / (fov_deg.to_radians() / 2.0).tan();
                let aspect = width as f32 / height as f32;
                (focal * view.x / depth / aspect, focal * view.y / depth)
            }
        };

        let screen_x = (ndc_x + 1.0) * 0.5 * (width - 1) as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * (height - 1) as f32;
        Some((screen_x, screen_y, depth))
    }

    fn shade(&self, triangle: &[Vector3<f32>; 3], camera: &CameraConfig) -> Option<Rgb<u8>> {
        let normal = (triangle[1] - triangle[0]).cross(&(triangle[2] - triangle[0]));
        if normal.norm() == 0.0 {
            return None;
        }
        let normal = normal.normalize();
        let light = Vector3::from(camera.light_direction).normalize();
        // asset normals are unoriented, so light both sides
        let lambert = normal.dot(&light).abs();
        let intensity =
            (camera.ambient_intensity + camera.light_intensity * lambert).clamp(0.0, 1.0);
        let level = (BASE_ALBEDO * intensity).round() as u8;
        Some(Rgb([level, level, level]))
    }

    fn raster_triangle(
        &self,
        frame: &mut RgbImage,
        depth_buffer: &mut Array2<f32>,
        corners: [(f32, f32, f32); 3],
        color: Rgb<u8>,
    ) {
        let (width, height) = frame.dimensions();
        let [(ax, ay, az), (bx, by, bz), (cx, cy, cz)] = corners;

        let area = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
        if area == 0.0 {
            return;
        }

        let x_min = ax.min(bx).min(cx).floor().max(0.0) as u32;
        let y_min = ay.min(by).min(cy).floor().max(0.0) as u32;
        let x_max = (ax.max(bx).max(cx).ceil() as i64).clamp(0, (width - 1) as i64) as u32;
        let y_max = (ay.max(by).max(cy).ceil() as i64).clamp(0, (height - 1) as i64) as u32;

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let w0 = ((bx - ax) * (py - ay) - (by - ay) * (px - ax)) / area;
                let w1 = ((cx - bx) * (py - by) - (cy - by) * (px - bx)) / area;
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w1 * az + w2 * bz + w0 * cz;
                if depth < depth_buffer[[y as usize, x as usize]] {
                    depth_buffer[[y as usize, x as usize]] = depth;
                    frame.put_pixel(x, y, color);
                }
            }
        }
    }
}

impl MeshRenderer for SoftwareRenderer {
    async fn render(
        &self,
        mesh: &MeshAsset,
        camera: &CameraConfig,
        width: u32,
        height: u32,
    ) -> Result<RgbImage> {
        let mut frame = RgbImage::from_pixel(width, height, Rgb(camera.clear_color));
        let mut depth_buffer =
            Array2::<f32>::from_elem((height as usize, width as usize), f32::INFINITY);

        let mut drawn = 0usize;
        for part in &mesh.parts {
            for triangle in part.triangles() {
                let projected = [
                    self.project(&triangle[0], camera, width, height),
                    self.project(&triangle[1], camera, width, height),
                    self.project(&triangle[2], camera, width, height),
                ];
                let (Some(a), Some(b), Some(c)) = (projected[0], projected[1], projected[2])
                else {
                    continue;
                };
                let Some(color) = self.shade(&triangle, camera) else {
                    continue;
                };
                self.raster_triangle(&mut frame, &mut depth_buffer, [a, b, c], color);
                drawn += 1;
            }
        }
        debug!(triangles = drawn, width, height, "rendered frontal snapshot");

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_triangle() -> MeshAsset {
        MeshAsset {
            parts: vec![MeshPart {
                positions: vec![
                    Vector3::new(-1.0, -1.0, 0.0),
                    Vector3::new(1.0, -1.0, 0.0),
                    Vector3::new(0.0, 1.0, 0.0),
                ],
                indices: vec![],
            }],
        }
    }

    #[test]
    fn test_recenter_moves_bounding_box_center_to_origin() {
        let mut part = MeshPart {
            positions: vec![
                Vector3::new(10.0, 20.0, 30.0),
                Vector3::new(14.0, 26.0, 38.0),
            ],
            indices: vec![],
        };
        part.recenter();
        let center = part.bounding_box_center();
        assert!(center.norm() < 1e-6);
        assert_eq!(part.positions[0], Vector3::new(-2.0, -3.0, -4.0));
    }

    #[test]
    fn test_recenter_parts_is_per_part() {
        let mut asset = MeshAsset {
            parts: vec![
                MeshPart {
                    positions: vec![Vector3::new(5.0, 5.0, 5.0), Vector3::new(7.0, 7.0, 7.0)],
                    indices: vec![],
                },
                MeshPart {
                    positions: vec![Vector3::new(-9.0, 0.0, 0.0), Vector3::new(-3.0, 2.0, 2.0)],
                    indices: vec![],
                },
            ],
        };
        asset.recenter_parts();
        for part in &asset.parts {
            assert!(part.bounding_box_center().norm() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_render_clears_to_background_color() {
        let renderer = SoftwareRenderer::new();
        let empty = MeshAsset { parts: vec![] };
        let camera = CameraConfig::orthographic_default();

        let frame = renderer.render(&empty, &camera, 500, 500).await.unwrap();
        assert_eq!(frame.dimensions(), (500, 500));
        assert_eq!(frame.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(frame.get_pixel(250, 250), &Rgb([255, 255, 255]));
    }

    #[tokio::test]
    async fn test_render_shades_facing_triangle() {
        let renderer = SoftwareRenderer::new();
        let camera = CameraConfig::orthographic_default();

        let frame = renderer
            .render(&facing_triangle(), &camera, 500, 500)
            .await
            .unwrap();

        // world origin lies inside the triangle; the light is head-on so the
        // surface renders at full albedo
        assert_eq!(frame.get_pixel(250, 287), &Rgb([204, 204, 204]));
        // corners stay at the clear color
        assert_eq!(frame.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(frame.get_pixel(499, 499), &Rgb([255, 255, 255]));
    }

    #[tokio::test]
    async fn test_render_culls_geometry_inside_near_plane() {
        let renderer = SoftwareRenderer::new();
        let camera = CameraConfig::orthographic_default();

        // depth from the camera at z = 5 is 0.5, inside the near plane of 1
        let mut asset = facing_triangle();
        for position in &mut asset.parts[0].positions {
            position.z = 4.5;
        }

        let frame = renderer.render(&asset, &camera, 500, 500).await.unwrap();
        assert_eq!(frame.get_pixel(250, 287), &Rgb([255, 255, 255]));
    }

    #[tokio::test]
    async fn test_render_perspective_preset() {
        let renderer = SoftwareRenderer::new();
        let camera = CameraConfig::perspective_default();

        let frame = renderer
            .render(&facing_triangle(), &camera, 500, 500)
            .await
            .unwrap();
        // fov 6 degrees from z = 18 keeps a 2-unit triangle in frame
        assert_eq!(frame.get_pixel(250, 280), &Rgb([204, 204, 204]));
    }
}
