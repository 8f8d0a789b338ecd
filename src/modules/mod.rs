pub mod face_detector;
pub mod frontalizer;
pub mod mesh_renderer;
