//! GPU side of the engine.
//!
//! - `context` owns the wgpu instance, device and window surface and knows
//!   how to reconfigure the swapchain when the window resizes.
//! - `uniforms` holds the CPU copy of the program's uniform block, the typed
//!   handles into it, and the buffer it is flushed to once per frame.
//! - `geometry` is the four-vertex quad both passes draw.
//! - `pipeline` turns checked GLSL into a triangle-strip render pipeline,
//!   mapping GPU validation errors back to the stage that caused them.
//! - `textures` uploads the two source images at units 0 and 1.
//! - `canvas` is the offscreen backing store and the pass that composites it
//!   into the window at the container's position.
//! - `state` glues everything together as the `RenderContext` the event loop
//!   drives.

mod canvas;
mod context;
mod geometry;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::RenderContext;
pub(crate) use uniforms::{ParallaxUniforms, UniformShape};
