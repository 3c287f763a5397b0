//! Graphics API conventions for clip space and texture space
//!
//! Different APIs disagree on three things that matter for a shadow map:
//! which end of the depth range is "near", where texture row 0 sits, and
//! what range clip-space Z occupies. [`GraphicsConvention`] captures all
//! three as an immutable value resolved once from [`DeviceCapabilities`]
//! and passed explicitly to whoever builds projection matrices.

use serde::{Deserialize, Serialize};

/// Platform identifier reported by the host device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphicsApi {
    /// Desktop OpenGL
    OpenGl,
    /// OpenGL ES / WebGL
    OpenGlEs,
    /// Vulkan
    Vulkan,
    /// Direct3D 11
    Direct3D11,
    /// Direct3D 12
    Direct3D12,
    /// Metal
    Metal,
}

impl GraphicsApi {
    /// Clip-space adjustment this API needs on top of the canonical
    /// OpenGL-style projection
    ///
    /// Direct3D and Metal consume depth in `[0, 1]`. Vulkan does too, and
    /// its framebuffer Y axis points down, so it also needs the Y flip.
    pub const fn projection_adjustment(self) -> ApiProjectionAdjustment {
        match self {
            Self::OpenGl | Self::OpenGlEs => ApiProjectionAdjustment::None,
            Self::Direct3D11 | Self::Direct3D12 | Self::Metal => ApiProjectionAdjustment::ReversedZ,
            Self::Vulkan => ApiProjectionAdjustment::Both,
        }
    }
}

/// Final API-specific clip-space remap folded into the projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiProjectionAdjustment {
    /// Clip space is used as built (`[-1, 1]` depth, Y up)
    #[default]
    None,
    /// Negate clip-space Y when rendering into an offscreen target
    FlipY,
    /// Remap clip-space depth from `[-1, 1]` to the `[0, 1]` range
    /// expected by reversed-Z capable APIs
    ReversedZ,
    /// Both the Y flip and the depth remap
    Both,
}

impl ApiProjectionAdjustment {
    /// Whether the Y row is negated
    pub const fn flips_y(self) -> bool {
        matches!(self, Self::FlipY | Self::Both)
    }

    /// Whether depth is remapped to `[0, 1]`
    pub const fn remaps_depth(self) -> bool {
        matches!(self, Self::ReversedZ | Self::Both)
    }
}

/// Device capability flags as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Active graphics API
    pub api: GraphicsApi,
    /// Whether the depth buffer is cleared to 0 and compares greater-equal
    pub reversed_z_buffer: bool,
    /// Whether texture row 0 is the top of the image
    pub uv_starts_at_top: bool,
}

impl DeviceCapabilities {
    /// Typical capabilities for an API: reversed Z everywhere except the
    /// GL family, top-left UV origin everywhere except the GL family
    pub const fn typical(api: GraphicsApi) -> Self {
        let gl_family = matches!(api, GraphicsApi::OpenGl | GraphicsApi::OpenGlEs);
        Self {
            api,
            reversed_z_buffer: !gl_family,
            uv_starts_at_top: !gl_family,
        }
    }
}

/// Resolved clip-space and texture-space rules for one device
///
/// Queried, never mutated. Rebuild it when device capabilities change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsConvention {
    /// Near plane maps to the maximum depth value
    pub reversed_depth: bool,
    /// Texture row 0 is the top of the image
    pub uv_origin_top: bool,
    /// Final API clip-space remap
    pub api_projection_adjustment: ApiProjectionAdjustment,
}

impl GraphicsConvention {
    /// Resolve the convention from host capability queries
    pub fn resolve(caps: &DeviceCapabilities) -> Self {
        let convention = Self {
            reversed_depth: caps.reversed_z_buffer,
            uv_origin_top: caps.uv_starts_at_top,
            api_projection_adjustment: caps.api.projection_adjustment(),
        };
        log::info!("Resolved graphics convention for {:?}: {:?}", caps.api, convention);
        convention
    }

    /// Plain OpenGL conventions: no corrections at all
    pub const fn opengl() -> Self {
        Self {
            reversed_depth: false,
            uv_origin_top: false,
            api_projection_adjustment: ApiProjectionAdjustment::None,
        }
    }

    /// Vulkan with a reversed-Z depth buffer
    pub const fn vulkan() -> Self {
        Self {
            reversed_depth: true,
            uv_origin_top: true,
            api_projection_adjustment: ApiProjectionAdjustment::Both,
        }
    }

    /// Direct3D with a reversed-Z depth buffer
    pub const fn direct3d() -> Self {
        Self {
            reversed_depth: true,
            uv_origin_top: true,
            api_projection_adjustment: ApiProjectionAdjustment::ReversedZ,
        }
    }

    /// Depth value that represents "nothing drawn yet" (the far plane)
    pub const fn clear_depth(&self) -> f32 {
        if self.reversed_depth { 0.0 } else { 1.0 }
    }
}

impl Default for GraphicsConvention {
    fn default() -> Self {
        Self::opengl()
    }
}
