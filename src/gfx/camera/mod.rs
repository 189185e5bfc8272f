pub mod camera;
pub mod camera_utils;

// Re-export main types
pub use camera::Camera;
pub use camera_utils::{convert_matrix4_to_array, perspective_lh};
