//! Math type aliases and helper functions.
//!
//! Thin f32 aliases over `nalgebra` so the rest of the crate never names
//! the generic nalgebra types directly.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a 4x4 matrix from 16 floats in column-major order (the glTF
/// `node.matrix` layout).
pub fn mat4_from_column_major(m: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(m)
}
