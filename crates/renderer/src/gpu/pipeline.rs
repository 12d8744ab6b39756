use crate::compile::{create_module, ProgramSource};
use crate::error::{ShaderCompileError, ShaderStage};

use super::geometry::{Rect, VERTEX_STRIDE};

/// Everything needed to turn a checked program into a pipeline.
pub(crate) struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub source: &'a ProgramSource,
    pub position_location: u32,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub target_format: wgpu::TextureFormat,
}

/// Compiles both stages and links them into a triangle-strip pipeline.
///
/// Each step runs inside a validation error scope so driver-side rejections
/// come back as a [`ShaderCompileError`] for the stage that caused them.
pub(crate) fn build_program(
    device: &wgpu::Device,
    desc: &ProgramDescriptor<'_>,
) -> Result<wgpu::RenderPipeline, ShaderCompileError> {
    let vertex_module = create_module(
        device,
        ShaderStage::Vertex,
        &format!("{} vertex", desc.label),
        &desc.source.vertex,
    )?;
    let fragment_module = create_module(
        device,
        ShaderStage::Fragment,
        &format!("{} fragment", desc.label),
        &desc.source.fragment,
    )?;

    let attributes = Rect::layout(desc.position_location);

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.target_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(ShaderCompileError::new(ShaderStage::Link, error.to_string()));
    }

    tracing::debug!(label = desc.label, format = ?desc.target_format, "linked pipeline");
    Ok(pipeline)
}
