//! Light projection matrix construction
//!
//! Builds the canonical orthographic projection for a directional light and
//! folds in the platform corrections. The corrections are applied in a
//! fixed order, each as an edit of the clip-space rows:
//!
//! 1. reversed depth: negate the Z row (near plane lands on +1)
//! 2. UV origin at top: negate the Y row
//! 3. API adjustment: Y flip and/or `[-1, 1] -> [0, 1]` depth remap
//!
//! Reordering changes the result (the depth remap is not symmetric around
//! zero, and two Y flips cancel), so the order is part of the contract.

use crate::foundation::math::{Mat4, Mat4Ext};
use super::light::validate_frustum_bounds;
use super::{GraphicsConvention, LightFrameParameters, ShadowResult};

/// Builds light-view-to-clip projection matrices
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionMatrixBuilder;

impl ProjectionMatrixBuilder {
    /// Canonical orthographic projection over a symmetric frustum
    ///
    /// X and Y span `[-half_extent, half_extent]`, Z spans `[near, far]`,
    /// all mapped to `[-1, 1]` with the near plane at -1.
    pub fn canonical(near: f32, far: f32, half_extent: f32) -> ShadowResult<Mat4> {
        validate_frustum_bounds(near, far, half_extent)?;
        Ok(Mat4::orthographic_lh(-half_extent, half_extent, -half_extent, half_extent, near, far))
    }

    /// Orthographic projection with every convention correction applied
    pub fn build(near: f32, far: f32, half_extent: f32, convention: &GraphicsConvention) -> ShadowResult<Mat4> {
        let canonical = Self::canonical(near, far, half_extent)?;
        Ok(Self::apply_convention(canonical, convention))
    }

    /// Projection for a frame's light parameters
    pub fn for_light(params: &LightFrameParameters, convention: &GraphicsConvention) -> ShadowResult<Mat4> {
        Self::build(params.near_plane, params.far_plane, params.ortho_half_extent, convention)
    }

    /// Apply the convention corrections to a canonical projection
    pub fn apply_convention(projection: Mat4, convention: &GraphicsConvention) -> Mat4 {
        let mut projection = projection;

        if convention.reversed_depth {
            projection = projection.reverse_depth();
        }

        if convention.uv_origin_top {
            projection = projection.flip_y();
        }

        let adjustment = convention.api_projection_adjustment;
        if adjustment.flips_y() {
            projection = projection.flip_y();
        }
        if adjustment.remaps_depth() {
            projection = projection.depth_zero_to_one();
        }

        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use crate::render::{ApiProjectionAdjustment, ShadowError};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn convention(reversed_depth: bool, uv_origin_top: bool, adjustment: ApiProjectionAdjustment) -> GraphicsConvention {
        GraphicsConvention {
            reversed_depth,
            uv_origin_top,
            api_projection_adjustment: adjustment,
        }
    }

    fn plain() -> GraphicsConvention {
        convention(false, false, ApiProjectionAdjustment::None)
    }

    fn clip_z(projection: &Mat4, view_z: f32) -> f32 {
        let clip = projection * Vec4::new(0.0, 0.0, view_z, 1.0);
        clip.z / clip.w
    }

    #[test]
    fn test_canonical_entries() {
        let projection = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &plain()).unwrap();

        let expected = Mat4::new(
            0.1, 0.0, 0.0, 0.0,
            0.0, 0.1, 0.0, 0.0,
            0.0, 0.0, 2.0 / 99.9, -100.1 / 99.9,
            0.0, 0.0, 0.0, 1.0,
        );
        assert_relative_eq!(projection, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_canonical_maps_near_and_far() {
        let projection = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &plain()).unwrap();

        assert_relative_eq!(clip_z(&projection, 0.1), -1.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&projection, 100.0), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_uv_origin_top_flips_only_y_row() {
        let base = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &plain()).unwrap();
        let flipped = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &convention(false, true, ApiProjectionAdjustment::None)).unwrap();

        assert_eq!(flipped.row(0), base.row(0));
        assert_eq!(flipped.row(1), -base.row(1));
        assert_eq!(flipped.row(2), base.row(2));
        assert_eq!(flipped.row(3), base.row(3));
    }

    #[test]
    fn test_reversed_depth_swaps_near_and_far() {
        let base = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &plain()).unwrap();
        let reversed = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &convention(true, false, ApiProjectionAdjustment::None)).unwrap();

        // [-1, 1] depth: near and far trade places
        assert_relative_eq!(clip_z(&reversed, 0.1), 1.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&reversed, 100.0), -1.0, epsilon = EPSILON);

        assert_eq!(reversed.row(0), base.row(0));
        assert_eq!(reversed.row(1), base.row(1));
    }

    #[test]
    fn test_reversed_depth_with_zero_to_one_range() {
        let reversed = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &convention(true, false, ApiProjectionAdjustment::ReversedZ)).unwrap();

        assert_relative_eq!(clip_z(&reversed, 0.1), 1.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&reversed, 100.0), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_zero_to_one_range_without_reversal() {
        let projection = ProjectionMatrixBuilder::build(0.1, 100.0, 10.0, &convention(false, false, ApiProjectionAdjustment::ReversedZ)).unwrap();

        assert_relative_eq!(clip_z(&projection, 0.1), 0.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&projection, 100.0), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_reverse_then_remap_order_matters() {
        // Remapping first and negating second would send depth to [-1, 0]
        let canonical = ProjectionMatrixBuilder::canonical(1.0, 11.0, 5.0).unwrap();
        let wrong_order = canonical.depth_zero_to_one().reverse_depth();
        let applied = ProjectionMatrixBuilder::apply_convention(canonical, &convention(true, false, ApiProjectionAdjustment::ReversedZ));

        assert_relative_eq!(clip_z(&wrong_order, 1.0), 0.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&wrong_order, 11.0), -1.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&applied, 1.0), 1.0, epsilon = EPSILON);
        assert_relative_eq!(clip_z(&applied, 11.0), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_uv_flip_and_api_flip_cancel() {
        let base = ProjectionMatrixBuilder::build(0.5, 50.0, 20.0, &plain()).unwrap();
        let both = ProjectionMatrixBuilder::build(0.5, 50.0, 20.0, &convention(false, true, ApiProjectionAdjustment::FlipY)).unwrap();

        assert_eq!(both.row(1), base.row(1));
    }

    #[test]
    fn test_vulkan_convention() {
        let projection = ProjectionMatrixBuilder::build(1.0, 21.0, 4.0, &GraphicsConvention::vulkan()).unwrap();
        let point = projection * Vec4::new(4.0, 4.0, 1.0, 1.0);

        // UV flip and framebuffer flip cancel; reversed [0, 1] depth
        assert_relative_eq!(point, Vec4::new(1.0, 1.0, 1.0, 1.0), epsilon = EPSILON);
        assert_relative_eq!(clip_z(&projection, 21.0), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_direct3d_convention() {
        let projection = ProjectionMatrixBuilder::build(1.0, 21.0, 4.0, &GraphicsConvention::direct3d()).unwrap();
        let point = projection * Vec4::new(4.0, 4.0, 21.0, 1.0);

        assert_relative_eq!(point, Vec4::new(1.0, -1.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(matches!(
            ProjectionMatrixBuilder::build(50.0, 10.0, 5.0, &plain()),
            Err(ShadowError::InvalidFrustumBounds { .. })
        ));
        assert!(matches!(
            ProjectionMatrixBuilder::build(0.1, 10.0, 0.0, &plain()),
            Err(ShadowError::InvalidFrustumBounds { .. })
        ));
    }
}
