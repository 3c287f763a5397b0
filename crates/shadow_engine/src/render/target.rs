//! Shadow map render target
//!
//! The orchestrator owns exactly one depth surface. It is reused from frame
//! to frame and replaced only when the requested descriptor changes. The
//! old allocation is always released before the new one is created, so the
//! two never coexist.

use serde::{Deserialize, Serialize};

use super::{ShadowBackend, ShadowError, ShadowResult};

/// Depth buffer formats a shadow map can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthFormat {
    /// 16-bit normalized depth
    Depth16,
    /// 24-bit normalized depth
    Depth24,
    /// 32-bit floating point depth
    Depth32Float,
}

impl DepthFormat {
    /// Bits of depth precision
    pub const fn bits(self) -> u32 {
        match self {
            Self::Depth16 => 16,
            Self::Depth24 => 24,
            Self::Depth32Float => 32,
        }
    }
}

/// Texture filtering used when the shadow map is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel
    Point,
    /// Linear interpolation between texels
    Bilinear,
}

/// Addressing mode outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    /// Clamp to the edge texel
    Clamp,
    /// Tile the texture
    Repeat,
}

/// Requested shape of the shadow target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth format
    pub depth_format: DepthFormat,
    /// Whether a color channel is attached alongside depth
    pub with_color: bool,
    /// Sampling filter
    pub filter: FilterMode,
    /// Sampling wrap mode
    pub wrap: WrapMode,
    /// Debug name of the allocation
    pub name: String,
}

impl TargetDescriptor {
    /// Square depth-only target
    pub fn square(resolution: u32, depth_format: DepthFormat) -> Self {
        Self {
            width: resolution,
            height: resolution,
            depth_format,
            ..Self::default()
        }
    }

    /// Size of one texel in UV units
    pub fn texel_size(&self) -> (f32, f32) {
        (1.0 / self.width.max(1) as f32, 1.0 / self.height.max(1) as f32)
    }

    /// Check the descriptor can describe a real surface
    ///
    /// A zero-sized target can never be allocated, so this fails with
    /// [`ShadowError::TargetAllocationFailure`].
    pub fn validate(&self) -> ShadowResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ShadowError::TargetAllocationFailure(format!(
                "Shadow target '{}' has zero size {}x{}",
                self.name, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for TargetDescriptor {
    /// 1024x1024, 24-bit depth, bilinear, clamped
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            depth_format: DepthFormat::Depth24,
            with_color: false,
            filter: FilterMode::Bilinear,
            wrap: WrapMode::Clamp,
            name: "_ShadowMap".to_string(),
        }
    }
}

/// Opaque handle to a host-side render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// The orchestrator's single shadow map allocation
#[derive(Debug, Default)]
pub struct ShadowTarget {
    allocation: Option<(TargetHandle, TargetDescriptor)>,
    allocation_count: u64,
}

impl ShadowTarget {
    /// Create an empty target; nothing is allocated until [`Self::ensure`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the live allocation, if any
    pub fn handle(&self) -> Option<TargetHandle> {
        self.allocation.as_ref().map(|(handle, _)| *handle)
    }

    /// Descriptor of the live allocation, if any
    pub fn descriptor(&self) -> Option<&TargetDescriptor> {
        self.allocation.as_ref().map(|(_, descriptor)| descriptor)
    }

    /// Whether a surface is currently allocated
    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    /// Number of allocations made over this target's lifetime
    pub fn allocation_count(&self) -> u64 {
        self.allocation_count
    }

    /// Make sure a surface matching `descriptor` is allocated
    ///
    /// Reuses the live allocation when the descriptor is unchanged.
    /// Otherwise releases it first and allocates anew. On failure the
    /// target is left empty.
    pub fn ensure(&mut self, backend: &mut dyn ShadowBackend, descriptor: &TargetDescriptor) -> ShadowResult<TargetHandle> {
        if let Some((handle, current)) = &self.allocation {
            if current == descriptor {
                return Ok(*handle);
            }
            log::debug!(
                "Shadow target descriptor changed ({}x{} {:?} -> {}x{} {:?}), reallocating",
                current.width, current.height, current.depth_format,
                descriptor.width, descriptor.height, descriptor.depth_format
            );
        }

        self.release(backend);

        descriptor.validate()?;
        let handle = backend.create_target(descriptor)?;
        self.allocation = Some((handle, descriptor.clone()));
        self.allocation_count += 1;

        log::debug!("Allocated shadow target '{}' {:?}", descriptor.name, handle);
        Ok(handle)
    }

    /// Release the live allocation, if any
    pub fn release(&mut self, backend: &mut dyn ShadowBackend) {
        if let Some((handle, descriptor)) = self.allocation.take() {
            log::debug!("Releasing shadow target '{}' {:?}", descriptor.name, handle);
            backend.release_target(handle);
        }
    }
}
