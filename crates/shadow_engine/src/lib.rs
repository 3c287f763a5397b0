//! # Shadow Engine
//!
//! Directional-light shadow map generation for a host renderer.
//!
//! ## Features
//!
//! - **Light-Space Matrices**: Orthonormal light basis and view matrix from any direction,
//!   including straight up and straight down
//! - **Convention-Aware Projection**: Orthographic projection corrected for reversed depth,
//!   UV origin and API clip space, applied in a fixed order
//! - **Shadow Pass**: One depth-only pass per frame that binds, clears, publishes the light
//!   view-projection, delegates caster drawing and publishes the shadow map
//! - **Backend Agnostic**: The host implements a narrow backend trait; a headless recording
//!   backend is included
//!
//! ## Quick Start
//!
//! ```rust
//! use shadow_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShadowConfig::default();
//!     let caps = DeviceCapabilities::typical(GraphicsApi::Vulkan);
//!     let mut pass = ShadowPassOrchestrator::new(config.resolve_convention(&caps), &config);
//!     let mut backend = HeadlessBackend::new();
//!
//!     let light = LightFrameParameters::for_directional_light(
//!         Vec3::new(-0.3, -1.0, 0.2),
//!         Vec3::zeros(),
//!         &config.frustum,
//!     )?;
//!     let report = pass.execute(&mut backend, &FrameContext::with_light(0, light))?;
//!     assert!(report.rendered());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod foundation;
pub mod config;
pub mod render;

pub use render::{ShadowError, ShadowResult};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        ShadowError, ShadowResult,
        foundation::math::{Vec3, Vec4, Mat4, Point3},
        core::config::{ShadowConfig, FrustumConfig, PublishNames, Config, ConfigError},
        render::{
            GraphicsConvention, GraphicsApi, DeviceCapabilities, ApiProjectionAdjustment,
            LightFrameParameters, ViewMatrixBuilder, ProjectionMatrixBuilder,
            ShadowBackend, HeadlessBackend, TargetDescriptor, DepthFormat,
            ShadowPass, ShadowPassOrchestrator, FrameContext, FrameReport, FrameStatus, PublishedShadow,
        },
    };
}
