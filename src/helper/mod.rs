pub mod face_helper;
pub mod landmark_helper;
