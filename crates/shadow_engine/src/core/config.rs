//! # Shadow Configuration
//!
//! Everything a host can tune about the shadow pass without code changes:
//! target shape, default light frustum, the global names outputs are
//! published under, and an optional graphics convention override.
//!
//! ```toml
//! publish_keyword = true
//!
//! [target]
//! width = 2048
//! height = 2048
//! depth_format = "Depth32Float"
//! with_color = false
//! filter = "Bilinear"
//! wrap = "Clamp"
//! name = "_ShadowMap"
//!
//! [frustum]
//! near_plane = 0.1
//! far_plane = 100.0
//! ortho_half_extent = 25.0
//! light_distance = 50.0
//! ```

use serde::{Serialize, Deserialize};

use crate::render::light::validate_frustum_bounds;
use crate::render::{DeviceCapabilities, GraphicsConvention, TargetDescriptor};

// Re-export the file-backed config trait alongside the types using it
pub use crate::config::{Config, ConfigError};

/// Default light frustum applied to scene lights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrustumConfig {
    /// Near plane distance
    pub near_plane: f32,
    /// Far plane distance
    pub far_plane: f32,
    /// Half width/height of the orthographic frustum
    pub ortho_half_extent: f32,
    /// How far behind the focus point the light origin is placed
    pub light_distance: f32,
}

impl Default for FrustumConfig {
    fn default() -> Self {
        Self {
            near_plane: 0.1,
            far_plane: 100.0,
            ortho_half_extent: 25.0,
            light_distance: 50.0,
        }
    }
}

/// Global names the pass publishes under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishNames {
    /// Light view-projection matrix
    pub light_view_projection: String,
    /// Shadow map texture
    pub shadow_map: String,
    /// Material tag selecting the depth-only caster pass
    pub caster_tag: String,
    /// Keyword toggling shadow sampling in downstream shaders
    pub shadow_keyword: String,
}

impl Default for PublishNames {
    fn default() -> Self {
        Self {
            light_view_projection: "_LightVPMatrix".to_string(),
            shadow_map: "_ShadowMap".to_string(),
            caster_tag: "CustomShadowCaster".to_string(),
            shadow_keyword: "_CUSTOM_SHADOWS".to_string(),
        }
    }
}

/// Top-level shadow pass configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Whether to toggle the shadow keyword for downstream shaders
    pub publish_keyword: bool,
    /// Shadow target shape
    pub target: TargetDescriptor,
    /// Default light frustum
    pub frustum: FrustumConfig,
    /// Published global names
    pub names: PublishNames,
    /// Force a convention instead of resolving it from the device
    pub convention: Option<GraphicsConvention>,
}

impl ShadowConfig {
    /// Set the square target resolution
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.target.width = resolution;
        self.target.height = resolution;
        self
    }

    /// Set the default frustum
    pub fn with_frustum(mut self, frustum: FrustumConfig) -> Self {
        self.frustum = frustum;
        self
    }

    /// Force a graphics convention
    pub fn with_convention(mut self, convention: GraphicsConvention) -> Self {
        self.convention = Some(convention);
        self
    }

    /// Convention to use on a device: the override if set, otherwise
    /// resolved from the capabilities
    pub fn resolve_convention(&self, caps: &DeviceCapabilities) -> GraphicsConvention {
        self.convention.unwrap_or_else(|| GraphicsConvention::resolve(caps))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let frustum = &self.frustum;
        validate_frustum_bounds(frustum.near_plane, frustum.far_plane, frustum.ortho_half_extent)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !frustum.light_distance.is_finite() || frustum.light_distance < 0.0 {
            return Err(ConfigError::Invalid(format!("light_distance must be >= 0, got {}", frustum.light_distance)));
        }

        let names = [
            &self.names.light_view_projection,
            &self.names.shadow_map,
            &self.names.caster_tag,
            &self.names.shadow_keyword,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err(ConfigError::Invalid("published names cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            publish_keyword: true,
            target: TargetDescriptor::default(),
            frustum: FrustumConfig::default(),
            names: PublishNames::default(),
            convention: None,
        }
    }
}

impl Config for ShadowConfig {}
