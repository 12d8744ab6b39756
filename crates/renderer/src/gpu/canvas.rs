use std::borrow::Cow;

use anyhow::Result;

use crate::compile::{check_program, ProgramSource, COMPOSITE_FRAGMENT_GLSL, COMPOSITE_VERTEX_GLSL};
use crate::error::EngineError;
use crate::page::ClipRect;

use super::geometry::Rect;
use super::pipeline::{build_program, ProgramDescriptor};
use super::textures::IMAGE_FORMAT;
use super::uniforms::{Uniform, UniformBlock, UniformBuffer};

/// Format of the canvas backing store.
pub(crate) const CANVAS_FORMAT: wgpu::TextureFormat = IMAGE_FORMAT;

/// Offscreen render target standing in for the canvas element.
///
/// The parallax program draws into it at backing-store resolution; the
/// composite pass then places it at the container's rectangle in the window.
pub(crate) struct Canvas {
    size: (u32, u32),
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    texture_layout: wgpu::BindGroupLayout,
    texture_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    rect: Uniform<4>,
    rect_block: UniformBlock,
    rect_buffer: UniformBuffer,
}

impl Canvas {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let source = ProgramSource {
            vertex: Cow::Borrowed(COMPOSITE_VERTEX_GLSL),
            fragment: Cow::Borrowed(COMPOSITE_FRAGMENT_GLSL),
        };
        let layout = check_program(&source).map_err(EngineError::from)?;
        let rect = Uniform::resolve(&layout, "rect").map_err(EngineError::from)?;
        let mut rect_block = UniformBlock::new(layout.uniform_block_size);
        rect.set(&mut rect_block, ClipRect::FULL.as_array());
        let rect_buffer = UniformBuffer::new(
            device,
            "composite params",
            layout.uniform_block_size,
            wgpu::ShaderStages::VERTEX,
        );

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvas texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline = build_program(
            device,
            &ProgramDescriptor {
                label: "composite",
                source: &source,
                position_location: layout.position_location,
                bind_group_layouts: &[&rect_buffer.layout, &texture_layout],
                target_format: surface_format,
            },
        )
        .map_err(EngineError::from)?;

        // Backing pixels map 1:1 to window pixels at the device pixel ratio.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("canvas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let (texture, view) = create_backing(device, (1, 1));
        let texture_group = bind_texture(device, &texture_layout, &view, &sampler);

        Ok(Self {
            size: (1, 1),
            _texture: texture,
            view,
            sampler,
            texture_layout,
            texture_group,
            pipeline,
            rect,
            rect_block,
            rect_buffer,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Reallocates the backing store only when its pixel size changes.
    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) -> bool {
        let size = (size.0.max(1), size.1.max(1));
        if size == self.size {
            return false;
        }
        let (texture, view) = create_backing(device, size);
        self._texture = texture;
        self.view = view;
        self.texture_group = bind_texture(device, &self.texture_layout, &self.view, &self.sampler);
        self.size = size;
        tracing::debug!(width = size.0, height = size.1, "canvas backing store resized");
        true
    }

    /// Where the canvas is shown inside the window.
    pub fn place(&mut self, rect: ClipRect) {
        self.rect.set(&mut self.rect_block, rect.as_array());
    }

    pub fn composite(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>, quad: &Rect) {
        self.rect_buffer.flush(queue, &mut self.rect_block);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.rect_buffer.bind_group, &[]);
        pass.set_bind_group(1, &self.texture_group, &[]);
        quad.draw(pass);
    }
}

fn create_backing(device: &wgpu::Device, size: (u32, u32)) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("canvas"),
        size: wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: CANVAS_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn bind_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("canvas texture"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
