//! Host backend interface for the shadow pass
//!
//! This trait is everything the orchestrator needs from the host renderer:
//! target management, clears, named global publication, and a callback
//! that rasterizes shadow casters into the bound target. Culling, sorting
//! and command submission stay on the host side.

use bitflags::bitflags;

use crate::foundation::math::Mat4;
use super::{ShadowError, TargetDescriptor, TargetHandle};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, ShadowError>;

bitflags! {
    /// Which attachments a clear touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Depth attachment
        const DEPTH = 1 << 0;
        /// Color attachment
        const COLOR = 1 << 1;
    }
}

bitflags! {
    /// Draw ordering hints passed to the host with the caster draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SortingCriteria: u8 {
        /// Sort by render queue
        const RENDER_QUEUE = 1 << 0;
        /// Rough front-to-back order for early depth rejection
        const QUANTIZED_FRONT_TO_BACK = 1 << 1;
        /// Group draws sharing pipeline state
        const OPTIMIZE_STATE_CHANGES = 1 << 2;
        /// Typical opaque ordering
        const COMMON_OPAQUE = Self::RENDER_QUEUE.bits()
            | Self::QUANTIZED_FRONT_TO_BACK.bits()
            | Self::OPTIMIZE_STATE_CHANGES.bits();
    }
}

/// Inclusive range of render queue values a draw accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueRange {
    /// Lowest accepted queue
    pub lower: u32,
    /// Highest accepted queue
    pub upper: u32,
}

impl RenderQueueRange {
    /// Opaque geometry only (queues 0..=2500)
    pub const OPAQUE: Self = Self { lower: 0, upper: 2500 };

    /// Whether `queue` falls in the range
    pub const fn contains(&self, queue: u32) -> bool {
        queue >= self.lower && queue <= self.upper
    }
}

/// What the host's caster draw should render and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSettings {
    /// Depth-only material tag selecting the caster shader pass
    pub caster_tag: String,
    /// Which objects qualify as casters
    pub queue_range: RenderQueueRange,
    /// Ordering hint
    pub sorting: SortingCriteria,
}

impl DrawSettings {
    /// Opaque casters, front to back, rendered with `caster_tag`
    pub fn depth_only(caster_tag: impl Into<String>) -> Self {
        Self {
            caster_tag: caster_tag.into(),
            queue_range: RenderQueueRange::OPAQUE,
            sorting: SortingCriteria::COMMON_OPAQUE,
        }
    }
}

/// Where the shadow pass wants to be scheduled in the host's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassEvent {
    /// Before the host renders its own shadows
    BeforeRenderingShadows,
}

/// Host renderer interface driven by the shadow pass
pub trait ShadowBackend {
    /// Allocate a depth target
    ///
    /// Fails with [`ShadowError::TargetAllocationFailure`] when the device
    /// cannot provide the requested format or resolution.
    fn create_target(&mut self, descriptor: &TargetDescriptor) -> BackendResult<TargetHandle>;

    /// Free a target previously returned by [`Self::create_target`]
    fn release_target(&mut self, handle: TargetHandle);

    /// Make `handle` the active depth destination
    fn bind_target(&mut self, handle: TargetHandle) -> BackendResult<()>;

    /// Clear the bound target
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> BackendResult<()>;

    /// Publish a matrix under a global name
    fn set_global_matrix(&mut self, name: &str, matrix: &Mat4);

    /// Rasterize shadow casters into the bound target
    fn draw_casters(&mut self, settings: &DrawSettings) -> BackendResult<()>;

    /// Publish a target as a global texture
    fn set_global_texture(&mut self, name: &str, handle: TargetHandle);

    /// Withdraw a global texture so nothing samples a released target
    fn clear_global_texture(&mut self, name: &str);

    /// Toggle a global shader feature
    fn set_global_keyword(&mut self, name: &str, enabled: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_opaque_requests_front_to_back() {
        let settings = DrawSettings::depth_only("CustomShadowCaster");
        assert!(settings.sorting.contains(SortingCriteria::QUANTIZED_FRONT_TO_BACK));
        assert_eq!(settings.caster_tag, "CustomShadowCaster");
    }

    #[test]
    fn test_opaque_queue_range() {
        assert!(RenderQueueRange::OPAQUE.contains(2000));
        assert!(RenderQueueRange::OPAQUE.contains(2500));
        assert!(!RenderQueueRange::OPAQUE.contains(3000));
    }
}
