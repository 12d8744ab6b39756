use wgpu::util::DeviceExt;

/// Corners of the full-viewport quad in triangle-strip order.
pub(crate) const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

/// Bytes between consecutive `a_position` values.
pub(crate) const VERTEX_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;

/// The quad both passes draw, uploaded once at mount.
pub(crate) struct Rect {
    buffer: wgpu::Buffer,
}

impl Rect {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer }
    }

    /// Vertex layout feeding `a_position` at `location`.
    pub fn layout(location: u32) -> [wgpu::VertexAttribute; 1] {
        [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: location,
        }]
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}
