//! # Shadow Rendering
//!
//! Light-space transforms and the depth-only pass that turns them into a
//! shadow map.
//!
//! ## Architecture
//!
//! - **Convention**: platform clip-space rules resolved once from device capabilities
//! - **Light**: per-frame light parameters and their validation
//! - **View / Projection**: the two halves of the light view-projection matrix
//! - **Target**: the owned depth surface, reallocated only on descriptor change
//! - **Backend**: the narrow host interface the pass records into
//! - **Pass**: the orchestrator sequencing one shadow pass per frame
//!
//! The orchestrator never talks to a graphics API directly. Hosts implement
//! [`ShadowBackend`] and drive the pass through the [`ShadowPass`] trait.

pub mod convention;
pub mod light;
pub mod view;
pub mod projection;
pub mod target;
pub mod backend;
pub mod uniforms;
pub mod pass;

/// Host backend implementations shipped with the crate
pub mod backends;

#[cfg(test)]
mod tests;

pub use convention::{ApiProjectionAdjustment, DeviceCapabilities, GraphicsApi, GraphicsConvention};
pub use light::LightFrameParameters;
pub use view::{LightBasis, ViewMatrixBuilder};
pub use projection::ProjectionMatrixBuilder;
pub use target::{DepthFormat, FilterMode, ShadowTarget, TargetDescriptor, TargetHandle, WrapMode};
pub use backend::{
    BackendResult, ClearFlags, DrawSettings, PassEvent, RenderQueueRange, ShadowBackend, SortingCriteria,
};
pub use uniforms::ShadowUniformData;
pub use pass::{
    FrameContext, FrameReport, FrameStatus, PassState, PublishedShadow, ShadowPass, ShadowPassOrchestrator,
    SkipReason,
};
pub use backends::headless::{BackendCommand, HeadlessBackend};

use thiserror::Error;
use crate::foundation::math::Vec3;

/// Errors raised while building light matrices or recording the shadow pass
///
/// A missing light is not an error: it produces
/// [`FrameStatus::Skipped`] with [`SkipReason::NoActiveLight`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShadowError {
    /// The light direction is zero-length or contains NaN/infinite components
    ///
    /// Raised before normalization; garbage directions are never normalized.
    #[error("Invalid light direction: {direction:?}")]
    InvalidLightDirection {
        /// Direction as supplied by the host
        direction: Vec3,
    },

    /// Near/far planes or orthographic extent cannot form a frustum
    ///
    /// Requires `0 < near < far` and `half_extent > 0`, all finite.
    #[error("Invalid frustum bounds: near={near}, far={far}, half_extent={half_extent}")]
    InvalidFrustumBounds {
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
        /// Orthographic half extent
        half_extent: f32,
    },

    /// The host could not (re)allocate the shadow target
    ///
    /// Fatal for the frame. Not retried automatically.
    #[error("Shadow target allocation failed: {0}")]
    TargetAllocationFailure(String),

    /// A host command other than allocation failed
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for shadow operations
pub type ShadowResult<T> = Result<T, ShadowError>;
