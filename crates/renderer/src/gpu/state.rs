use anyhow::{Context, Result};
use image::RgbaImage;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::compile::{check_program, ProgramSource};
use crate::error::EngineError;
use crate::page::ClipRect;
use crate::types::{GpuPowerPreference, TEXTURE_UNIT_COUNT};
use crate::viewport::ViewportState;

use super::canvas::{Canvas, CANVAS_FORMAT};
use super::context::GpuContext;
use super::geometry::Rect;
use super::pipeline::{build_program, ProgramDescriptor};
use super::textures::{texture_layout, TextureSet};
use super::uniforms::{ParallaxUniforms, UniformBuffer};

/// GPU resources owned by the render loop, created at mount.
pub(crate) struct RenderContext {
    context: GpuContext,
    quad: Rect,
    program: wgpu::RenderPipeline,
    uniforms: ParallaxUniforms,
    uniform_buffer: UniformBuffer,
    texture_layout: wgpu::BindGroupLayout,
    textures: Option<TextureSet>,
    canvas: Canvas,
}

impl RenderContext {
    /// Builds the device, the parallax program and the canvas.
    ///
    /// Shader failures are returned as [`EngineError::ShaderCompile`] inside
    /// the `anyhow` chain.
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        gpu_power: GpuPowerPreference,
        source: &ProgramSource,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let layout = check_program(source).map_err(EngineError::from)?;
        let uniforms = ParallaxUniforms::new(&layout).map_err(EngineError::from)?;

        let context = GpuContext::new(target, size, gpu_power)?;
        let device = &context.device;

        let uniform_buffer = UniformBuffer::new(
            device,
            "parallax params",
            uniforms.block.size(),
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let texture_layout = texture_layout(device);
        let program = build_program(
            device,
            &ProgramDescriptor {
                label: "parallax",
                source,
                position_location: layout.position_location,
                bind_group_layouts: &[&uniform_buffer.layout, &texture_layout],
                target_format: CANVAS_FORMAT,
            },
        )
        .map_err(EngineError::from)?;

        let canvas = Canvas::new(device, context.surface_format)
            .context("failed to create canvas composite pass")?;
        let quad = Rect::new(device);

        Ok(Self {
            context,
            quad,
            program,
            uniforms,
            uniform_buffer,
            texture_layout,
            textures: None,
            canvas,
        })
    }

    pub(crate) fn uniforms_mut(&mut self) -> &mut ParallaxUniforms {
        &mut self.uniforms
    }

    pub(crate) fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    pub(crate) fn reconfigure_surface(&mut self) {
        self.context.reconfigure();
    }

    pub(crate) fn install_textures(&mut self, images: &[RgbaImage; TEXTURE_UNIT_COUNT]) -> Result<()> {
        let textures = TextureSet::upload(
            &self.context.device,
            &self.context.queue,
            &self.texture_layout,
            images,
            self.context.max_texture_dimension,
        )?;
        self.textures = Some(textures);
        Ok(())
    }

    /// Largest canvas dimension the device accepts.
    pub(crate) fn max_backing(&self) -> u32 {
        self.context.max_texture_dimension
    }

    /// Sizes the backing store to `viewport` and shows it at `placement`.
    ///
    /// `viewport` must already be limited to [`Self::max_backing`].
    pub(crate) fn apply_viewport(&mut self, viewport: &ViewportState, placement: ClipRect) {
        self.canvas.resize(&self.context.device, viewport.backing_size());
        self.canvas.place(placement);
    }

    pub(crate) fn place_canvas(&mut self, placement: ClipRect) {
        self.canvas.place(placement);
    }

    /// Draws one frame; only called once textures are installed.
    pub(crate) fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(textures) = self.textures.as_ref() else {
            return Ok(());
        };
        let frame = self.context.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.uniform_buffer
            .flush(&self.context.queue, &mut self.uniforms.block);

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let (width, height) = self.canvas.size();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("parallax pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.canvas.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            pass.set_pipeline(&self.program);
            pass.set_bind_group(0, &self.uniform_buffer.bind_group, &[]);
            pass.set_bind_group(1, &textures.bind_group, &[]);
            self.quad.draw(&mut pass);
        }
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.canvas
                .composite(&self.context.queue, &mut pass, &self.quad);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
