//! Math utilities and types
//!
//! Provides the math types used for light-space transforms.
//!
//! # Conventions
//! - Column vectors: `clip = projection * view * world`
//! - Light space is left-handed with +Z pointing along the light direction
//! - The canonical clip space is OpenGL style (`[-1, 1]` on every axis);
//!   API-specific clip spaces are reached through the edits in [`Mat4Ext`]

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Lengths at or below this count as zero
    pub const MIN_DIRECTION_LENGTH: f32 = f32::EPSILON;

    /// Whether every component of `v` is finite
    pub fn is_finite(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }

    /// Normalize a direction, or `None` if it is non-finite or zero-length
    ///
    /// Scales by the largest component first so `norm_squared` cannot
    /// overflow for large finite inputs.
    pub fn unit_direction(v: &Vec3) -> Option<Vec3> {
        if !is_finite(v) {
            return None;
        }
        let scale = v.amax();
        if scale <= 0.0 {
            return None;
        }
        let scaled = v / scale;
        let norm = scaled.norm();
        if scale * norm <= MIN_DIRECTION_LENGTH {
            return None;
        }
        let unit = scaled / norm;
        is_finite(&unit).then_some(unit)
    }
}

/// Extension trait for Mat4 with the clip-space constructors and edits
/// needed by the light projection
pub trait Mat4Ext {
    /// Create an orthographic projection for a +Z-forward view space
    ///
    /// Maps `[left, right]` and `[bottom, top]` to `[-1, 1]`, and
    /// `[near, far]` to `[-1, 1]` with the near plane at -1.
    fn orthographic_lh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Build a view matrix from an orthonormal basis and an origin
    ///
    /// Each basis vector becomes a row, with translation `-dot(axis, origin)`.
    fn from_basis_and_origin(right: &Vec3, up: &Vec3, forward: &Vec3, origin: &Vec3) -> Mat4;

    /// Negate the clip-space Z row, swapping which plane lands on +1
    fn reverse_depth(&self) -> Mat4;

    /// Negate the clip-space Y row
    fn flip_y(&self) -> Mat4;

    /// Remap clip-space depth from `[-1, 1]` to `[0, 1]`
    fn depth_zero_to_one(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn orthographic_lh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        // P = [2/(r-l)   0         0         -(r+l)/(r-l)]
        //     [0         2/(t-b)   0         -(t+b)/(t-b)]
        //     [0         0         2/(f-n)   -(f+n)/(f-n)]
        //     [0         0         0          1          ]
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        Mat4::new(
            2.0 / width, 0.0, 0.0, -(right + left) / width,
            0.0, 2.0 / height, 0.0, -(top + bottom) / height,
            0.0, 0.0, 2.0 / depth, -(far + near) / depth,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn from_basis_and_origin(right: &Vec3, up: &Vec3, forward: &Vec3, origin: &Vec3) -> Mat4 {
        Mat4::new(
            right.x, right.y, right.z, -right.dot(origin),
            up.x, up.y, up.z, -up.dot(origin),
            forward.x, forward.y, forward.z, -forward.dot(origin),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn reverse_depth(&self) -> Mat4 {
        let mut result = *self;
        let mut z_row = result.row_mut(2);
        z_row.neg_mut();
        result
    }

    fn flip_y(&self) -> Mat4 {
        let mut result = *self;
        let mut y_row = result.row_mut(1);
        y_row.neg_mut();
        result
    }

    fn depth_zero_to_one(&self) -> Mat4 {
        // z' = 0.5 * z + 0.5 * w
        let remap = Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        remap * self
    }
}
