use wgpu::naga;

use crate::compile::ProgramLayout;
use crate::error::{ShaderCompileError, ShaderStage};

/// Value shape of a float uniform the host writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniformShape {
    Scalar1,
    Vector2,
    Vector3,
    Vector4,
}

impl UniformShape {
    pub const fn for_components(components: usize) -> Option<Self> {
        match components {
            1 => Some(Self::Scalar1),
            2 => Some(Self::Vector2),
            3 => Some(Self::Vector3),
            4 => Some(Self::Vector4),
            _ => None,
        }
    }

    pub fn components(self) -> usize {
        match self {
            Self::Scalar1 => 1,
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
        }
    }

    /// Only 32-bit float scalars and vectors are writable from the host.
    pub fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        let float = |scalar: &naga::Scalar| scalar.kind == naga::ScalarKind::Float && scalar.width == 4;
        match inner {
            naga::TypeInner::Scalar(scalar) if float(scalar) => Some(Self::Scalar1),
            naga::TypeInner::Vector { size, scalar } if float(scalar) => Some(match size {
                naga::VectorSize::Bi => Self::Vector2,
                naga::VectorSize::Tri => Self::Vector3,
                naga::VectorSize::Quad => Self::Vector4,
            }),
            _ => None,
        }
    }
}

/// CPU copy of the program's uniform block.
///
/// Writes mark the block dirty; the render loop uploads it at most once per
/// frame through [`UniformBuffer::flush`].
#[derive(Debug)]
pub(crate) struct UniformBlock {
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            dirty: true,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn write(&mut self, offset: usize, values: &[f32]) {
        let src: &[u8] = bytemuck::cast_slice(values);
        if let Some(dst) = self.bytes.get_mut(offset..offset + src.len()) {
            if dst != src {
                dst.copy_from_slice(src);
                self.dirty = true;
            }
        }
    }

    pub fn read<const N: usize>(&self, offset: usize) -> Option<[f32; N]> {
        let bytes = self.bytes.get(offset..offset + N * 4)?;
        let mut out = [0.0_f32; N];
        bytemuck::cast_slice_mut::<f32, u8>(&mut out).copy_from_slice(bytes);
        Some(out)
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.bytes)
    }
}

/// Handle to one `N`-component uniform, resolved when the program is checked.
///
/// A uniform the program does not declare resolves to nothing and every
/// write to it is dropped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Uniform<const N: usize> {
    offset: Option<usize>,
}

impl<const N: usize> Uniform<N> {
    pub fn resolve(layout: &ProgramLayout, name: &str) -> Result<Self, ShaderCompileError> {
        let Some(slot) = layout.uniform(name) else {
            tracing::debug!(
                uniform = name,
                "program does not declare uniform; writes will be ignored"
            );
            return Ok(Self { offset: None });
        };
        if UniformShape::for_components(N) != Some(slot.shape) {
            return Err(ShaderCompileError::new(
                ShaderStage::Link,
                format!(
                    "uniform `{name}` has {} float components, expected {N}",
                    slot.shape.components()
                ),
            ));
        }
        Ok(Self {
            offset: Some(slot.offset),
        })
    }

    #[cfg(test)]
    pub fn is_bound(&self) -> bool {
        self.offset.is_some()
    }

    pub fn set(&self, block: &mut UniformBlock, value: [f32; N]) {
        if let Some(offset) = self.offset {
            block.write(offset, &value);
        }
    }

    pub fn get(&self, block: &UniformBlock) -> Option<[f32; N]> {
        block.read(self.offset?)
    }
}

/// The uniforms the host drives for the parallax program.
#[derive(Debug)]
pub(crate) struct ParallaxUniforms {
    pub block: UniformBlock,
    pub resolution: Uniform<4>,
    pub mouse: Uniform<2>,
    pub time: Uniform<1>,
    pub pixel_ratio: Uniform<1>,
    pub threshold: Uniform<2>,
}

impl ParallaxUniforms {
    pub fn new(layout: &ProgramLayout) -> Result<Self, ShaderCompileError> {
        Ok(Self {
            block: UniformBlock::new(layout.uniform_block_size),
            resolution: Uniform::resolve(layout, "resolution")?,
            mouse: Uniform::resolve(layout, "mouse")?,
            time: Uniform::resolve(layout, "time")?,
            pixel_ratio: Uniform::resolve(layout, "pixelRatio")?,
            threshold: Uniform::resolve(layout, "threshold")?,
        })
    }
}

/// GPU side of a [`UniformBlock`], bound at set 0, binding 0.
pub(crate) struct UniformBuffer {
    buffer: wgpu::Buffer,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBuffer {
    pub fn new(device: &wgpu::Device, label: &str, size: usize, visibility: wgpu::ShaderStages) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    /// Uploads the block if anything changed since the last flush.
    pub fn flush(&self, queue: &wgpu::Queue, block: &mut UniformBlock) {
        if let Some(bytes) = block.take_dirty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::compile::{check_program, ProgramSource, FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};

    fn bundled() -> ProgramLayout {
        check_program(&ProgramSource::bundled()).unwrap()
    }

    #[test]
    fn writes_land_at_reflected_offsets() {
        let mut uniforms = ParallaxUniforms::new(&bundled()).unwrap();
        uniforms.resolution.set(&mut uniforms.block, [800.0, 600.0, 1.0, 1.0]);
        uniforms.mouse.set(&mut uniforms.block, [0.25, -0.5]);
        uniforms.pixel_ratio.set(&mut uniforms.block, [2.0]);
        uniforms.threshold.set(&mut uniforms.block, [40.0, 30.0]);

        assert_eq!(uniforms.block.read::<4>(0), Some([800.0, 600.0, 1.0, 1.0]));
        assert_eq!(uniforms.block.read::<2>(16), Some([0.25, -0.5]));
        assert_eq!(uniforms.block.read::<1>(28), Some([2.0]));
        assert_eq!(uniforms.threshold.get(&uniforms.block), Some([40.0, 30.0]));
    }

    #[test]
    fn missing_uniform_is_a_no_op() {
        let fragment = FRAGMENT_SHADER_GLSL.replace("    float time;\n", "    float unused;\n");
        let layout = check_program(&ProgramSource {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: Cow::Owned(fragment),
        })
        .unwrap();
        let mut uniforms = ParallaxUniforms::new(&layout).unwrap();
        assert!(!uniforms.time.is_bound());
        uniforms.block.take_dirty();

        uniforms.time.set(&mut uniforms.block, [12.5]);
        assert!(!uniforms.block.is_dirty());
        assert_eq!(uniforms.time.get(&uniforms.block), None);
    }

    #[test]
    fn mismatched_shape_is_a_link_error() {
        let fragment = FRAGMENT_SHADER_GLSL.replace("    vec2 mouse;\n", "    vec4 mouse;\n");
        let layout = check_program(&ProgramSource {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: Cow::Owned(fragment),
        })
        .unwrap();
        let err = ParallaxUniforms::new(&layout).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Link);
        assert!(err.diagnostic.contains("mouse"));
    }

    #[test]
    fn identical_writes_do_not_dirty() {
        let mut block = UniformBlock::new(16);
        let uniform = Uniform::<2> { offset: Some(8) };
        assert!(block.take_dirty().is_some());
        uniform.set(&mut block, [0.0, 0.0]);
        assert!(!block.is_dirty());
        uniform.set(&mut block, [1.0, 0.0]);
        assert!(block.is_dirty());
        assert!(block.take_dirty().is_some());
        assert!(block.take_dirty().is_none());
    }
}
