//! Headless shadow pass demo
//!
//! Orbits a sun around the scene origin and records a shadow pass per frame
//! into the headless backend, including frames with no active light and a
//! mid-run shadow map resize.
//!
//! Usage: `shadow_demo [config.toml|config.ron] [opengl|vulkan|d3d11|d3d12|metal]`
//!
//! A missing config file is created with the defaults.

use shadow_engine::prelude::*;
use shadow_engine::render::BackendCommand;

const FRAME_COUNT: u64 = 12;
const DARK_FRAME_INTERVAL: u64 = 5;
const RESIZE_FRAME: u64 = 8;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("shadow pass: {0}")]
    Shadow(#[from] ShadowError),

    #[error("unknown graphics API '{0}'")]
    UnknownApi(String),
}

fn parse_api(name: &str) -> Result<GraphicsApi, DemoError> {
    match name.to_ascii_lowercase().as_str() {
        "opengl" | "gl" => Ok(GraphicsApi::OpenGl),
        "gles" => Ok(GraphicsApi::OpenGlEs),
        "vulkan" | "vk" => Ok(GraphicsApi::Vulkan),
        "d3d11" => Ok(GraphicsApi::Direct3D11),
        "d3d12" => Ok(GraphicsApi::Direct3D12),
        "metal" => Ok(GraphicsApi::Metal),
        other => Err(DemoError::UnknownApi(other.to_string())),
    }
}

/// Sun direction for a frame: a slow orbit tilted 40 degrees from vertical
fn sun_direction(frame: u64) -> Vec3 {
    let angle = frame as f32 * 0.35;
    let tilt = 40.0_f32.to_radians();
    Vec3::new(tilt.sin() * angle.cos(), -tilt.cos(), tilt.sin() * angle.sin())
}

fn run(config: &ShadowConfig, api: GraphicsApi) -> Result<(), DemoError> {
    let caps = DeviceCapabilities::typical(api);
    let convention = config.resolve_convention(&caps);
    let mut pass = ShadowPassOrchestrator::new(convention, config);
    let mut backend = HeadlessBackend::new();
    log::info!("Scheduling shadow pass at {:?}", pass.pass_event());

    for frame in 0..FRAME_COUNT {
        if frame == RESIZE_FRAME {
            let mut larger = config.target.clone();
            larger.width *= 2;
            larger.height *= 2;
            pass.configure(&larger);
        }

        let context = if frame % DARK_FRAME_INTERVAL == DARK_FRAME_INTERVAL - 1 {
            FrameContext::without_light(frame)
        } else {
            let light = LightFrameParameters::for_directional_light(sun_direction(frame), Vec3::zeros(), &config.frustum)?;
            FrameContext::with_light(frame, light)
        };

        backend.clear_commands();
        let report = pass.execute(&mut backend, &context)?;

        match (&report.status, &report.outputs) {
            (FrameStatus::Rendered, Some(outputs)) => {
                let origin = outputs.light_view_projection * Vec4::new(0.0, 0.0, 0.0, 1.0);
                log::info!(
                    "Frame {:>2}: rendered {}x{} shadow map, {} commands, origin depth {:.4}",
                    frame,
                    outputs.resolution.0,
                    outputs.resolution.1,
                    backend.commands().len(),
                    origin.z / origin.w
                );
            }
            (FrameStatus::Skipped(reason), outputs) => {
                log::info!(
                    "Frame {:>2}: skipped ({:?}), still publishing frame {:?}",
                    frame,
                    reason,
                    outputs.as_ref().map(|o| o.frame_index)
                );
            }
            (FrameStatus::Rendered, None) => unreachable!("rendered frames always publish outputs"),
        }

        for command in backend.commands() {
            if let BackendCommand::CreateTarget { descriptor, .. } = command {
                log::info!("  allocated {}x{} {:?}", descriptor.width, descriptor.height, descriptor.depth_format);
            }
        }
    }

    pass.release(&mut backend);
    log::info!("Released shadow target, {} live allocations remain", backend.live_target_count());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    shadow_engine::foundation::logging::init_with_level("info");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let existed = std::path::Path::new(&path).exists();
            let config = ShadowConfig::load_or_default(&path)?;
            if !existed {
                config.save_to_file(&path)?;
                log::info!("Wrote default configuration to {}", path);
            }
            config
        }
        None => ShadowConfig::default(),
    };
    config.validate()?;
    let api = args.next().map_or(Ok(GraphicsApi::Vulkan), |name| parse_api(&name))?;

    log::info!("Starting shadow demo on {:?}", api);

    match run(&config, api) {
        Ok(()) => {
            log::info!("Shadow demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Shadow demo failed: {}", e);
            Err(e.into())
        }
    }
}
