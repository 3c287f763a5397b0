//! GPU-ready layout of the published shadow data
//!
//! Matches the `ShadowUBO` block a shading pass declares:
//! ```glsl
//! layout(set = 0, binding = 2) uniform ShadowUBO {
//!     mat4 light_view_projection;
//!     vec4 shadow_params; // texel w, texel h, enabled, depth sign
//! };
//! ```

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;
use super::{GraphicsConvention, TargetDescriptor};

/// Shadow uniform block, 80 bytes, std140 compatible
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniformData {
    /// Column-major light view-projection matrix
    pub light_view_projection: [[f32; 4]; 4],
    /// `[texel_width, texel_height, enabled, depth_sign]`
    ///
    /// `depth_sign` is -1 with reversed depth so shaders can flip the
    /// comparison without a branch on the convention.
    pub shadow_params: [f32; 4],
}

impl ShadowUniformData {
    /// Pack a light view-projection matrix for upload
    pub fn new(
        light_view_projection: &Mat4,
        descriptor: &TargetDescriptor,
        convention: &GraphicsConvention,
        enabled: bool,
    ) -> Self {
        let (texel_width, texel_height) = descriptor.texel_size();
        Self {
            light_view_projection: (*light_view_projection).into(),
            shadow_params: [
                texel_width,
                texel_height,
                if enabled { 1.0 } else { 0.0 },
                if convention.reversed_depth { -1.0 } else { 1.0 },
            ],
        }
    }

    /// Raw bytes for a buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_size() {
        assert_eq!(std::mem::size_of::<ShadowUniformData>(), 80);
        let data = ShadowUniformData::new(
            &Mat4::identity(),
            &TargetDescriptor::default(),
            &GraphicsConvention::opengl(),
            false,
        );
        assert_eq!(data.as_bytes().len(), 80);
    }

    #[test]
    fn test_matrix_is_column_major() {
        let mut matrix = Mat4::identity();
        matrix[(0, 3)] = 7.0; // x translation
        let data = ShadowUniformData::new(&matrix, &TargetDescriptor::default(), &GraphicsConvention::opengl(), true);

        assert_eq!(data.light_view_projection[3][0], 7.0);
        assert_eq!(data.shadow_params, [1.0 / 1024.0, 1.0 / 1024.0, 1.0, 1.0]);
    }

    #[test]
    fn test_reversed_depth_sign() {
        let data = ShadowUniformData::new(&Mat4::identity(), &TargetDescriptor::default(), &GraphicsConvention::vulkan(), true);
        assert_eq!(data.shadow_params[3], -1.0);
    }
}
