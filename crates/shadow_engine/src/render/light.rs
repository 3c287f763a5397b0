//! Per-frame directional light parameters

use serde::{Deserialize, Serialize};

use crate::core::config::FrustumConfig;
use crate::foundation::math::{utils, Vec3};
use super::{ShadowError, ShadowResult};

/// Everything the light matrices are computed from for one frame
///
/// Hosts rebuild this every frame from their scene light. The view and
/// projection matrices are pure functions of this value and the active
/// [`GraphicsConvention`](super::GraphicsConvention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightFrameParameters {
    /// Direction the light travels; normalized by the view builder
    pub direction: Vec3,
    /// Origin of light space in world coordinates
    pub position: Vec3,
    /// Near plane distance along the light direction
    pub near_plane: f32,
    /// Far plane distance along the light direction
    pub far_plane: f32,
    /// Half width and half height of the orthographic frustum
    pub ortho_half_extent: f32,
}

impl LightFrameParameters {
    /// Create parameters from explicit values
    pub fn new(direction: Vec3, position: Vec3, near_plane: f32, far_plane: f32, ortho_half_extent: f32) -> Self {
        Self {
            direction,
            position,
            near_plane,
            far_plane,
            ortho_half_extent,
        }
    }

    /// Derive parameters for a directional light centred on `focus`
    ///
    /// The light-space origin is placed `frustum.light_distance` units
    /// behind `focus`, against the light direction, so the focus sits
    /// inside the depth range when the distance lies between near and far.
    pub fn for_directional_light(direction: Vec3, focus: Vec3, frustum: &FrustumConfig) -> ShadowResult<Self> {
        let params = Self {
            direction,
            position: focus,
            near_plane: frustum.near_plane,
            far_plane: frustum.far_plane,
            ortho_half_extent: frustum.ortho_half_extent,
        };
        let unit = params.unit_direction()?;
        params.validate_frustum()?;

        Ok(Self {
            position: focus - unit * frustum.light_distance,
            ..params
        })
    }

    /// Check the direction and frustum bounds
    ///
    /// Called before any matrix is built or any graphics state is touched.
    pub fn validate(&self) -> ShadowResult<()> {
        self.validate_direction()?;
        self.validate_frustum()
    }

    /// Reject zero-length and non-finite directions
    pub fn validate_direction(&self) -> ShadowResult<()> {
        self.unit_direction().map(|_| ())
    }

    /// The normalized direction, under the same rules as [`Self::validate_direction`]
    pub fn unit_direction(&self) -> ShadowResult<Vec3> {
        utils::unit_direction(&self.direction)
            .ok_or(ShadowError::InvalidLightDirection { direction: self.direction })
    }

    /// Require `0 < near < far` and `half_extent > 0`
    pub fn validate_frustum(&self) -> ShadowResult<()> {
        validate_frustum_bounds(self.near_plane, self.far_plane, self.ortho_half_extent)
    }
}

impl Default for LightFrameParameters {
    /// Light pointing straight down from the origin
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -1.0, 0.0), Vec3::zeros(), 0.1, 100.0, 25.0)
    }
}

/// Shared frustum check, also used when validating configuration
pub(crate) fn validate_frustum_bounds(near: f32, far: f32, half_extent: f32) -> ShadowResult<()> {
    let finite = near.is_finite() && far.is_finite() && half_extent.is_finite();
    if !finite || near <= 0.0 || near >= far || half_extent <= 0.0 {
        return Err(ShadowError::InvalidFrustumBounds { near, far, half_extent });
    }
    Ok(())
}
