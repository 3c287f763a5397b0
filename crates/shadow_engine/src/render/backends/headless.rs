//! Headless recording backend
//!
//! Implements [`ShadowBackend`] without a GPU. Targets live in a
//! generational arena so released handles are detectably stale, and every
//! command is appended to an ordered log that tests can inspect.

use std::collections::HashMap;

use slotmap::{DefaultKey, Key, KeyData, SlotMap};

use crate::foundation::math::Mat4;
use crate::render::{
    BackendResult, ClearFlags, DepthFormat, DrawSettings, ShadowBackend, ShadowError, TargetDescriptor,
    TargetHandle,
};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// Target allocated
    CreateTarget {
        /// New handle
        handle: TargetHandle,
        /// Requested shape
        descriptor: TargetDescriptor,
    },
    /// Target released
    ReleaseTarget(TargetHandle),
    /// Target bound as depth destination
    BindTarget(TargetHandle),
    /// Bound target cleared
    Clear {
        /// Attachments cleared
        flags: ClearFlags,
        /// Depth clear value
        depth: f32,
    },
    /// Global matrix published
    SetGlobalMatrix {
        /// Global name
        name: String,
        /// Published value
        matrix: Mat4,
    },
    /// Caster draw issued
    DrawCasters(DrawSettings),
    /// Global texture published
    SetGlobalTexture {
        /// Global name
        name: String,
        /// Published target
        handle: TargetHandle,
    },
    /// Global texture withdrawn
    ClearGlobalTexture(String),
    /// Global keyword toggled
    SetGlobalKeyword {
        /// Keyword name
        name: String,
        /// New state
        enabled: bool,
    },
}

/// Recording backend with configurable device limits
#[derive(Debug)]
pub struct HeadlessBackend {
    targets: SlotMap<DefaultKey, TargetDescriptor>,
    bound: Option<TargetHandle>,
    commands: Vec<BackendCommand>,
    global_matrices: HashMap<String, Mat4>,
    global_textures: HashMap<String, TargetHandle>,
    global_keywords: HashMap<String, bool>,
    max_resolution: u32,
    supported_formats: Vec<DepthFormat>,
    peak_live_targets: usize,
    caster_draws: usize,
}

impl HeadlessBackend {
    /// Backend accepting every format up to 16384 texels per side
    pub fn new() -> Self {
        Self {
            targets: SlotMap::new(),
            bound: None,
            commands: Vec::new(),
            global_matrices: HashMap::new(),
            global_textures: HashMap::new(),
            global_keywords: HashMap::new(),
            max_resolution: 16384,
            supported_formats: vec![DepthFormat::Depth16, DepthFormat::Depth24, DepthFormat::Depth32Float],
            peak_live_targets: 0,
            caster_draws: 0,
        }
    }

    /// Limit the largest target side length
    pub fn with_max_resolution(mut self, max_resolution: u32) -> Self {
        self.max_resolution = max_resolution;
        self
    }

    /// Restrict the depth formats the device supports
    pub fn with_supported_formats(mut self, formats: &[DepthFormat]) -> Self {
        self.supported_formats = formats.to_vec();
        self
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drop the command log, keeping targets and globals
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Currently published matrix for a global name
    pub fn global_matrix(&self, name: &str) -> Option<&Mat4> {
        self.global_matrices.get(name)
    }

    /// Currently published texture for a global name
    pub fn global_texture(&self, name: &str) -> Option<TargetHandle> {
        self.global_textures.get(name).copied()
    }

    /// Current state of a global keyword
    pub fn global_keyword(&self, name: &str) -> Option<bool> {
        self.global_keywords.get(name).copied()
    }

    /// Number of live target allocations
    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Most targets ever alive at once
    pub fn peak_live_targets(&self) -> usize {
        self.peak_live_targets
    }

    /// Whether `handle` refers to a live allocation
    pub fn is_live(&self, handle: TargetHandle) -> bool {
        self.targets.contains_key(Self::key(handle))
    }

    /// Target currently bound
    pub fn bound_target(&self) -> Option<TargetHandle> {
        self.bound
    }

    /// Number of caster draws issued
    pub fn caster_draws(&self) -> usize {
        self.caster_draws
    }

    fn key(handle: TargetHandle) -> DefaultKey {
        KeyData::from_ffi(handle.0).into()
    }

    fn handle(key: DefaultKey) -> TargetHandle {
        TargetHandle(key.data().as_ffi())
    }

    fn check_supported(&self, descriptor: &TargetDescriptor) -> BackendResult<()> {
        if descriptor.width > self.max_resolution || descriptor.height > self.max_resolution {
            return Err(ShadowError::TargetAllocationFailure(format!(
                "{}x{} exceeds device limit of {}",
                descriptor.width, descriptor.height, self.max_resolution
            )));
        }
        if !self.supported_formats.contains(&descriptor.depth_format) {
            return Err(ShadowError::TargetAllocationFailure(format!(
                "depth format {:?} is not supported",
                descriptor.depth_format
            )));
        }
        Ok(())
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowBackend for HeadlessBackend {
    fn create_target(&mut self, descriptor: &TargetDescriptor) -> BackendResult<TargetHandle> {
        self.check_supported(descriptor)?;

        let handle = Self::handle(self.targets.insert(descriptor.clone()));
        self.peak_live_targets = self.peak_live_targets.max(self.targets.len());
        self.commands.push(BackendCommand::CreateTarget {
            handle,
            descriptor: descriptor.clone(),
        });
        Ok(handle)
    }

    fn release_target(&mut self, handle: TargetHandle) {
        if self.targets.remove(Self::key(handle)).is_none() {
            log::warn!("Release of unknown shadow target {:?}", handle);
        }
        if self.bound == Some(handle) {
            self.bound = None;
        }
        self.commands.push(BackendCommand::ReleaseTarget(handle));
    }

    fn bind_target(&mut self, handle: TargetHandle) -> BackendResult<()> {
        if !self.is_live(handle) {
            return Err(ShadowError::Backend(format!("bind of stale target {:?}", handle)));
        }
        self.bound = Some(handle);
        self.commands.push(BackendCommand::BindTarget(handle));
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4], depth: f32) -> BackendResult<()> {
        if self.bound.is_none() {
            return Err(ShadowError::Backend("clear with no bound target".to_string()));
        }
        self.commands.push(BackendCommand::Clear { flags, depth });
        Ok(())
    }

    fn set_global_matrix(&mut self, name: &str, matrix: &Mat4) {
        self.global_matrices.insert(name.to_string(), *matrix);
        self.commands.push(BackendCommand::SetGlobalMatrix {
            name: name.to_string(),
            matrix: *matrix,
        });
    }

    fn draw_casters(&mut self, settings: &DrawSettings) -> BackendResult<()> {
        if self.bound.is_none() {
            return Err(ShadowError::Backend("caster draw with no bound target".to_string()));
        }
        self.caster_draws += 1;
        self.commands.push(BackendCommand::DrawCasters(settings.clone()));
        Ok(())
    }

    fn set_global_texture(&mut self, name: &str, handle: TargetHandle) {
        self.global_textures.insert(name.to_string(), handle);
        self.commands.push(BackendCommand::SetGlobalTexture {
            name: name.to_string(),
            handle,
        });
    }

    fn clear_global_texture(&mut self, name: &str) {
        self.global_textures.remove(name);
        self.commands.push(BackendCommand::ClearGlobalTexture(name.to_string()));
    }

    fn set_global_keyword(&mut self, name: &str, enabled: bool) {
        self.global_keywords.insert(name.to_string(), enabled);
        self.commands.push(BackendCommand::SetGlobalKeyword {
            name: name.to_string(),
            enabled,
        });
    }
}
