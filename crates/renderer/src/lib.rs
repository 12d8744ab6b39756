//! Depth-map parallax renderer.
//!
//! A still image and its depth map are drawn as a pseudo-3D surface that
//! shifts with the pointer, a touch drag, or page scroll. The flow is:
//!
//! ```text
//!   depthview CLI
//!          │ EngineConfig
//!          ▼
//!   run() ──▶ Engine::mount ──▶ winit event loop
//!                  │                 │
//!                  │                 ├─▶ InputNormalizer ─▶ MotionState.target
//!                  │                 ├─▶ (debounced) ViewportSizer ─▶ uniforms
//!                  │                 └─▶ tick: time + smoothing ─▶ draw ─▶ present
//!                  └─▶ image loader threads ──▶ LoadTracker ──▶ textures
//! ```
//!
//! The parallax program renders into an offscreen canvas sized to the
//! container times the device pixel ratio, which is then composited into the
//! window at the container's position on a scrollable page.

mod compile;
mod error;
mod gpu;
pub mod input;
mod lifecycle;
pub mod loader;
pub mod motion;
pub mod page;
pub mod runtime;
mod session;
mod types;
pub mod viewport;
mod window;

pub use error::{EngineError, ShaderCompileError, ShaderStage};
pub use lifecycle::EngineState;
pub use types::{
    ContainerLayout, EngineConfig, GpuPowerPreference, ImageLocator, PointerDevice, ResponseMode,
    ShaderSources, DEFAULT_LOAD_TIMEOUT, DEFAULT_RESIZE_DEBOUNCE, TEXTURE_UNIT_COUNT,
};

/// Checks the configured shading program without opening a window.
///
/// Returns the first [`ShaderCompileError`] found, wrapped in the error chain.
pub fn check_shaders(shaders: &ShaderSources) -> anyhow::Result<()> {
    let source = compile::ProgramSource::load(shaders)?;
    let layout = compile::check_program(&source).map_err(EngineError::from)?;
    gpu::ParallaxUniforms::new(&layout).map_err(EngineError::from)?;
    Ok(())
}

/// Mounts the engine in a new window and runs until the window closes.
///
/// Initialization failures (shader, image, GPU) end the run with an error;
/// [`EngineError`] values stay downcastable from the returned chain.
pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    tracing::info!(
        original = %config.original_image,
        depth = %config.depth_image,
        respond_to = %config.respond_to,
        "starting parallax view"
    );
    window::run_window(config)
}
