//! Light view matrix construction
//!
//! Builds an orthonormal light-space basis from an arbitrary light
//! direction and assembles the world-to-light matrix directly from it,
//! without building and inverting a full rotation.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use super::{LightFrameParameters, ShadowError, ShadowResult};

/// World up axis used as the first choice auxiliary vector
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Auxiliary axis substituted when the light is nearly vertical
pub const FALLBACK_UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// `|dot(direction, up)|` above which [`FALLBACK_UP`] replaces [`WORLD_UP`]
pub const VERTICAL_THRESHOLD: f32 = 0.99;

/// Orthonormal light-space axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBasis {
    /// Light-space +X
    pub right: Vec3,
    /// Light-space +Y
    pub up: Vec3,
    /// Light-space +Z, the normalized light direction
    pub forward: Vec3,
}

impl LightBasis {
    /// Derive the basis for a light direction
    ///
    /// `direction` need not be normalized but must be finite and non-zero.
    pub fn from_direction(direction: &Vec3) -> ShadowResult<Self> {
        let invalid = || ShadowError::InvalidLightDirection { direction: *direction };
        let forward = utils::unit_direction(direction).ok_or_else(invalid)?;

        // cross(up, forward) vanishes for vertical lights
        let aux_up = if forward.dot(&WORLD_UP).abs() > VERTICAL_THRESHOLD {
            log::trace!("Light direction {:?} is near vertical, using fallback up axis", forward);
            FALLBACK_UP
        } else {
            WORLD_UP
        };

        let right = aux_up.cross(&forward).normalize();
        let up = forward.cross(&right);
        if !utils::is_finite(&right) || !utils::is_finite(&up) {
            return Err(invalid());
        }

        Ok(Self { right, up, forward })
    }
}

/// Builds the world-to-light-space view matrix
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewMatrixBuilder;

impl ViewMatrixBuilder {
    /// View matrix for a light at `position` travelling along `direction`
    ///
    /// Maps `position` to the light-space origin and `direction` to +Z.
    pub fn build(direction: &Vec3, position: &Vec3) -> ShadowResult<Mat4> {
        let basis = LightBasis::from_direction(direction)?;
        Ok(Self::from_basis(&basis, position))
    }

    /// View matrix for a frame's light parameters
    pub fn for_light(params: &LightFrameParameters) -> ShadowResult<Mat4> {
        Self::build(&params.direction, &params.position)
    }

    /// Assemble the matrix from an existing basis
    pub fn from_basis(basis: &LightBasis, position: &Vec3) -> Mat4 {
        Mat4::from_basis_and_origin(&basis.right, &basis.up, &basis.forward, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec4};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn assert_orthonormal(basis: &LightBasis) {
        assert_relative_eq!(basis.right.dot(&basis.up), 0.0, epsilon = EPSILON);
        assert_relative_eq!(basis.right.dot(&basis.forward), 0.0, epsilon = EPSILON);
        assert_relative_eq!(basis.up.dot(&basis.forward), 0.0, epsilon = EPSILON);
        assert_relative_eq!(basis.right.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(basis.up.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(basis.forward.norm(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_basis_orthonormal_for_oblique_directions() {
        let directions = [
            Vec3::new(-0.7, -1.0, 0.3),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.3, -0.2, 0.9),
            Vec3::new(-5.0, 2.0, 1.0),
            Vec3::new(0.1, 0.98, 0.0),
        ];

        for direction in directions {
            let basis = LightBasis::from_direction(&direction).unwrap();
            assert_orthonormal(&basis);
            assert_relative_eq!(basis.forward, direction.normalize(), epsilon = EPSILON);
        }
    }

    #[test]
    fn test_straight_down_uses_fallback_axis() {
        let basis = LightBasis::from_direction(&Vec3::new(0.0, -1.0, 0.0)).unwrap();

        assert_orthonormal(&basis);
        assert!(basis.right.iter().chain(basis.up.iter()).all(|c| c.is_finite()));
        assert_relative_eq!(basis.right, Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(basis.up, Vec3::new(0.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_straight_up_uses_fallback_axis() {
        let basis = LightBasis::from_direction(&Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert_orthonormal(&basis);
    }

    #[test]
    fn test_basis_is_right_handed() {
        let basis = LightBasis::from_direction(&Vec3::new(0.4, -0.8, 0.2)).unwrap();
        assert_relative_eq!(basis.right.cross(&basis.up), basis.forward, epsilon = EPSILON);
    }

    #[test]
    fn test_view_moves_position_to_origin() {
        let position = Vec3::new(4.0, 12.0, -3.0);
        let view = ViewMatrixBuilder::build(&Vec3::new(-0.7, -1.0, 0.3), &position).unwrap();

        let light_space = view * Vec4::new(position.x, position.y, position.z, 1.0);
        assert_relative_eq!(light_space, Vec4::new(0.0, 0.0, 0.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_view_maps_direction_to_forward_axis() {
        let direction = Vec3::new(0.3, -0.5, 0.8);
        let position = Vec3::new(1.0, 2.0, 3.0);
        let view = ViewMatrixBuilder::build(&direction, &position).unwrap();

        let ahead = Point3::from(position + direction.normalize() * 10.0);
        assert_relative_eq!(view.transform_point(&ahead), Point3::new(0.0, 0.0, 10.0), epsilon = 1e-4);
    }

    #[test]
    fn test_view_matches_inverse_of_light_transform() {
        let direction = Vec3::new(-0.2, -0.9, 0.4);
        let position = Vec3::new(-6.0, 20.0, 2.0);
        let basis = LightBasis::from_direction(&direction).unwrap();
        let view = ViewMatrixBuilder::from_basis(&basis, &position);

        let light_to_world = Mat4::new(
            basis.right.x, basis.up.x, basis.forward.x, position.x,
            basis.right.y, basis.up.y, basis.forward.y, position.y,
            basis.right.z, basis.up.z, basis.forward.z, position.z,
            0.0, 0.0, 0.0, 1.0,
        );
        let inverted = light_to_world.try_inverse().unwrap();
        assert_relative_eq!(view, inverted, epsilon = 1e-4);
    }

    #[test]
    fn test_large_direction_gives_finite_basis() {
        let basis = LightBasis::from_direction(&Vec3::new(2e19, -2e19, 0.0)).unwrap();

        assert_orthonormal(&basis);
        assert_relative_eq!(basis.forward, Vec3::new(1.0, -1.0, 0.0).normalize(), epsilon = EPSILON);
    }

    #[test]
    fn test_invalid_directions_fail() {
        for direction in [Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 1.0), Vec3::new(f32::INFINITY, 0.0, 0.0)] {
            assert!(matches!(
                ViewMatrixBuilder::build(&direction, &Vec3::zeros()),
                Err(ShadowError::InvalidLightDirection { .. })
            ));
        }
    }
}
