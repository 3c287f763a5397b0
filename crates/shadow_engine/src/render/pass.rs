//! Shadow pass orchestration
//!
//! One call to [`ShadowPass::execute`] records a complete shadow pass:
//!
//! `Idle -> TargetBound -> Cleared -> MatrixPublished -> CastersDrawn -> TexturePublished -> Idle`
//!
//! The sequence is linear and runs to completion inside the frame's
//! command recording. Light parameters are validated and the matrices
//! built before the first backend call, so invalid input never leaves a
//! half-bound target behind. A frame without a directional light is
//! skipped outright and the previously published outputs stay in place.

use crate::core::config::{PublishNames, ShadowConfig};
use crate::foundation::math::Mat4;
use super::{
    ClearFlags, DrawSettings, GraphicsConvention, LightFrameParameters, PassEvent, ProjectionMatrixBuilder,
    ShadowBackend, ShadowError, ShadowResult, ShadowTarget, ShadowUniformData, TargetDescriptor, TargetHandle,
    ViewMatrixBuilder,
};

/// Per-frame input supplied by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Host frame counter
    pub frame_index: u64,
    /// Active directional light, `None` when the scene has none
    pub light: Option<LightFrameParameters>,
}

impl FrameContext {
    /// Frame with an active directional light
    pub fn with_light(frame_index: u64, light: LightFrameParameters) -> Self {
        Self { frame_index, light: Some(light) }
    }

    /// Frame where the host reports no directional light
    pub fn without_light(frame_index: u64) -> Self {
        Self { frame_index, light: None }
    }
}

/// Steps of one shadow pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// Not recording
    Idle,
    /// Shadow target bound as the depth destination
    TargetBound,
    /// Target cleared to the far depth
    Cleared,
    /// Light view-projection published
    MatrixPublished,
    /// Host drew the casters
    CastersDrawn,
    /// Shadow map published for downstream shading
    TexturePublished,
}

impl PassState {
    /// The state that must follow this one
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::TargetBound,
            Self::TargetBound => Self::Cleared,
            Self::Cleared => Self::MatrixPublished,
            Self::MatrixPublished => Self::CastersDrawn,
            Self::CastersDrawn => Self::TexturePublished,
            Self::TexturePublished => Self::Idle,
        }
    }
}

/// Why a frame was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The host has no directional light this frame
    NoActiveLight,
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// All six states were reached
    Rendered,
    /// Nothing was recorded; earlier outputs are still valid
    Skipped(SkipReason),
}

/// Outputs visible to downstream passes
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedShadow {
    /// Matrix published as the light view-projection
    pub light_view_projection: Mat4,
    /// Texture published as the shadow map
    pub shadow_map: TargetHandle,
    /// Shadow map size in texels
    pub resolution: (u32, u32),
    /// Frame the outputs were rendered in
    pub frame_index: u64,
    uniform: ShadowUniformData,
}

impl PublishedShadow {
    /// Packed uniform block for the shading stage
    pub fn uniform_data(&self) -> ShadowUniformData {
        self.uniform
    }
}

/// Result of [`ShadowPass::execute`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Frame this report belongs to
    pub frame_index: u64,
    /// Rendered or skipped
    pub status: FrameStatus,
    /// Outputs valid after this frame (possibly from an earlier frame)
    pub outputs: Option<PublishedShadow>,
}

impl FrameReport {
    /// Whether the pass ran this frame
    pub fn rendered(&self) -> bool {
        self.status == FrameStatus::Rendered
    }
}

/// Host-facing interface of a shadow pass
pub trait ShadowPass {
    /// Request a target shape; takes effect at the next execute
    fn configure(&mut self, descriptor: &TargetDescriptor);

    /// Record one frame's shadow pass
    fn execute(&mut self, backend: &mut dyn ShadowBackend, frame: &FrameContext) -> ShadowResult<FrameReport>;
}

/// Single-target directional shadow pass
#[derive(Debug)]
pub struct ShadowPassOrchestrator {
    convention: GraphicsConvention,
    names: PublishNames,
    publish_keyword: bool,
    requested: TargetDescriptor,
    target: ShadowTarget,
    state: PassState,
    published: Option<PublishedShadow>,
}

impl ShadowPassOrchestrator {
    /// Create an orchestrator for a resolved convention
    pub fn new(convention: GraphicsConvention, config: &ShadowConfig) -> Self {
        log::info!(
            "Creating shadow pass: {}x{} {:?}, convention {:?}",
            config.target.width, config.target.height, config.target.depth_format, convention
        );
        Self {
            convention,
            names: config.names.clone(),
            publish_keyword: config.publish_keyword,
            requested: config.target.clone(),
            target: ShadowTarget::new(),
            state: PassState::Idle,
            published: None,
        }
    }

    /// Light view-projection for one frame
    ///
    /// Pure function of its inputs. Validates the parameters first.
    pub fn compute_view_projection(params: &LightFrameParameters, convention: &GraphicsConvention) -> ShadowResult<Mat4> {
        params.validate()?;
        let view = ViewMatrixBuilder::for_light(params)?;
        let projection = ProjectionMatrixBuilder::for_light(params, convention)?;
        Ok(projection * view)
    }

    /// Convention the projection is built with
    pub fn convention(&self) -> &GraphicsConvention {
        &self.convention
    }

    /// Current pass state; `Idle` between frames
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Outputs from the last rendered frame
    pub fn published(&self) -> Option<&PublishedShadow> {
        self.published.as_ref()
    }

    /// The owned shadow target
    pub fn target(&self) -> &ShadowTarget {
        &self.target
    }

    /// Descriptor the next frame will allocate with
    pub fn requested_descriptor(&self) -> &TargetDescriptor {
        &self.requested
    }

    /// Where the host should schedule this pass
    pub const fn pass_event(&self) -> PassEvent {
        PassEvent::BeforeRenderingShadows
    }

    /// Free the shadow target and forget published outputs
    pub fn release(&mut self, backend: &mut dyn ShadowBackend) {
        self.target.release(backend);
        self.published = None;
    }

    fn transition(&mut self, next: PassState) {
        debug_assert_eq!(next, self.state.next(), "shadow pass left {:?} out of order", self.state);
        log::trace!("Shadow pass {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn skip(&self, frame: &FrameContext, reason: SkipReason) -> FrameReport {
        log::debug!("Skipping shadow pass for frame {}: {:?}, keeping previous outputs", frame.frame_index, reason);
        FrameReport {
            frame_index: frame.frame_index,
            status: FrameStatus::Skipped(reason),
            outputs: self.published.clone(),
        }
    }

    fn record(
        &mut self,
        backend: &mut dyn ShadowBackend,
        frame: &FrameContext,
        view_projection: Mat4,
    ) -> ShadowResult<PublishedShadow> {
        let handle = match self.target.ensure(backend, &self.requested) {
            Ok(handle) => handle,
            Err(error) => {
                self.handle_allocation_failure(backend, &error);
                return Err(error);
            }
        };
        backend.bind_target(handle)?;
        self.transition(PassState::TargetBound);

        let mut flags = ClearFlags::DEPTH;
        if self.requested.with_color {
            flags |= ClearFlags::COLOR;
        }
        backend.clear(flags, [0.0; 4], self.convention.clear_depth())?;
        self.transition(PassState::Cleared);

        backend.set_global_matrix(&self.names.light_view_projection, &view_projection);
        self.transition(PassState::MatrixPublished);

        backend.draw_casters(&DrawSettings::depth_only(self.names.caster_tag.as_str()))?;
        self.transition(PassState::CastersDrawn);

        backend.set_global_texture(&self.names.shadow_map, handle);
        if self.publish_keyword {
            backend.set_global_keyword(&self.names.shadow_keyword, true);
        }
        self.transition(PassState::TexturePublished);

        Ok(PublishedShadow {
            light_view_projection: view_projection,
            shadow_map: handle,
            resolution: (self.requested.width, self.requested.height),
            frame_index: frame.frame_index,
            uniform: ShadowUniformData::new(&view_projection, &self.requested, &self.convention, true),
        })
    }

    fn handle_allocation_failure(&mut self, backend: &mut dyn ShadowBackend, error: &ShadowError) {
        log::error!("Shadow target allocation failed, skipping shadow pass: {}", error);
        // The previous texture was released before the failed attempt
        if self.published.take().is_some() {
            backend.clear_global_texture(&self.names.shadow_map);
            if self.publish_keyword {
                backend.set_global_keyword(&self.names.shadow_keyword, false);
            }
        }
    }
}

impl ShadowPass for ShadowPassOrchestrator {
    fn configure(&mut self, descriptor: &TargetDescriptor) {
        if &self.requested != descriptor {
            log::info!(
                "Shadow target requested as {}x{} {:?}",
                descriptor.width, descriptor.height, descriptor.depth_format
            );
            self.requested = descriptor.clone();
        }
    }

    fn execute(&mut self, backend: &mut dyn ShadowBackend, frame: &FrameContext) -> ShadowResult<FrameReport> {
        let Some(params) = frame.light else {
            return Ok(self.skip(frame, SkipReason::NoActiveLight));
        };

        let view_projection = Self::compute_view_projection(&params, &self.convention)?;

        let published = match self.record(backend, frame, view_projection) {
            Ok(published) => published,
            Err(error) => {
                self.state = PassState::Idle;
                return Err(error);
            }
        };
        self.transition(PassState::Idle);
        self.published = Some(published.clone());

        Ok(FrameReport {
            frame_index: frame.frame_index,
            status: FrameStatus::Rendered,
            outputs: Some(published),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::HeadlessBackend;

    fn orchestrator() -> ShadowPassOrchestrator {
        ShadowPassOrchestrator::new(GraphicsConvention::opengl(), &ShadowConfig::default())
    }

    #[test]
    fn test_state_cycle_returns_to_idle() {
        let mut state = PassState::Idle;
        for _ in 0..6 {
            state = state.next();
        }
        assert_eq!(state, PassState::Idle);
    }

    #[test]
    fn test_compute_view_projection_is_projection_times_view() {
        let params = LightFrameParameters::new(Vec3::new(0.3, -1.0, 0.2), Vec3::new(0.0, 20.0, 0.0), 0.5, 80.0, 30.0);
        let convention = GraphicsConvention::vulkan();

        let expected = ProjectionMatrixBuilder::for_light(&params, &convention).unwrap()
            * ViewMatrixBuilder::for_light(&params).unwrap();
        let computed = ShadowPassOrchestrator::compute_view_projection(&params, &convention).unwrap();

        assert_eq!(computed, expected);
        assert_eq!(computed, ShadowPassOrchestrator::compute_view_projection(&params, &convention).unwrap());
    }

    #[test]
    fn test_large_direction_gives_finite_view_projection() {
        let convention = GraphicsConvention::opengl();
        let large = LightFrameParameters::new(Vec3::new(2e19, -2e19, 0.0), Vec3::new(0.0, 10.0, 0.0), 0.1, 100.0, 50.0);
        let unit = LightFrameParameters { direction: Vec3::new(1.0, -1.0, 0.0), ..large };

        let computed = ShadowPassOrchestrator::compute_view_projection(&large, &convention).unwrap();

        assert!(computed.iter().all(|c| c.is_finite()));
        approx::assert_relative_eq!(
            computed,
            ShadowPassOrchestrator::compute_view_projection(&unit, &convention).unwrap(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_rendered_frame_ends_idle() {
        let mut backend = HeadlessBackend::new();
        let mut pass = orchestrator();

        let report = pass.execute(&mut backend, &FrameContext::with_light(1, LightFrameParameters::default())).unwrap();

        assert!(report.rendered());
        assert_eq!(pass.state(), PassState::Idle);
        assert_eq!(pass.published(), report.outputs.as_ref());
        assert_eq!(pass.pass_event(), PassEvent::BeforeRenderingShadows);
    }

    #[test]
    fn test_configure_defers_reallocation() {
        let mut backend = HeadlessBackend::new();
        let mut pass = orchestrator();
        pass.execute(&mut backend, &FrameContext::with_light(1, LightFrameParameters::default())).unwrap();

        let larger = TargetDescriptor::square(2048, crate::render::DepthFormat::Depth32Float);
        pass.configure(&larger);
        assert_eq!(pass.target().descriptor().map(|d| d.width), Some(1024));

        pass.execute(&mut backend, &FrameContext::with_light(2, LightFrameParameters::default())).unwrap();
        assert_eq!(pass.target().descriptor(), Some(&larger));
        assert_eq!(backend.live_target_count(), 1);
    }

    #[test]
    fn test_release_frees_target() {
        let mut backend = HeadlessBackend::new();
        let mut pass = orchestrator();
        pass.execute(&mut backend, &FrameContext::with_light(1, LightFrameParameters::default())).unwrap();

        pass.release(&mut backend);

        assert_eq!(backend.live_target_count(), 0);
        assert!(pass.published().is_none());
    }
}
