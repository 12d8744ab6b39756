use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use wgpu::naga;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{ShaderCompileError, ShaderStage};
use crate::gpu::UniformShape;
use crate::types::ShaderSources;

/// Name of the vertex attribute fed from the quad's vertex buffer.
pub(crate) const POSITION_ATTRIBUTE: &str = "a_position";

/// Source text for both stages of the parallax program.
#[derive(Debug, Clone)]
pub(crate) struct ProgramSource {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ProgramSource {
    pub fn bundled() -> Self {
        Self {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
        }
    }

    /// Bundled shaders with any configured stage replaced by its file contents.
    pub fn load(overrides: &ShaderSources) -> Result<Self> {
        let mut source = Self::bundled();
        if let Some(path) = &overrides.vertex {
            source.vertex = Cow::Owned(read_shader(path)?);
        }
        if let Some(path) = &overrides.fragment {
            source.fragment = Cow::Owned(read_shader(path)?);
        }
        Ok(source)
    }
}

fn read_shader(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader at {}", path.display()))
}

/// Where one uniform lives inside the program's uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UniformSlot {
    pub offset: usize,
    pub shape: UniformShape,
}

/// What the host needs to know about a checked program.
#[derive(Debug, Clone)]
pub(crate) struct ProgramLayout {
    pub position_location: u32,
    pub uniform_block_size: usize,
    uniforms: HashMap<String, UniformSlot>,
}

impl ProgramLayout {
    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }
}

/// Parses, validates and reflects both stages without touching the GPU.
pub(crate) fn check_program(source: &ProgramSource) -> Result<ProgramLayout, ShaderCompileError> {
    let vertex = parse_stage(ShaderStage::Vertex, &source.vertex)?;
    let fragment = parse_stage(ShaderStage::Fragment, &source.fragment)?;

    let position_location = find_vertex_input(&vertex, POSITION_ATTRIBUTE).ok_or_else(|| {
        ShaderCompileError::new(
            ShaderStage::Vertex,
            format!("vertex stage does not declare the `{POSITION_ATTRIBUTE}` input"),
        )
    })?;

    let mut uniforms = HashMap::new();
    let mut uniform_block_size = 0;
    for module in [&vertex, &fragment] {
        if let Some(span) = collect_uniform_block(module, &mut uniforms) {
            uniform_block_size = uniform_block_size.max(span);
        }
    }
    // std140 blocks are sized in whole vec4s.
    let uniform_block_size = uniform_block_size.max(16).next_multiple_of(16);

    tracing::debug!(
        position_location,
        uniform_block_size,
        uniforms = ?uniforms.keys().collect::<Vec<_>>(),
        "reflected shading program"
    );

    Ok(ProgramLayout {
        position_location,
        uniform_block_size,
        uniforms,
    })
}

pub(crate) fn parse_stage(
    stage: ShaderStage,
    source: &str,
) -> Result<naga::Module, ShaderCompileError> {
    let naga_stage = naga_stage(stage);
    let module = Frontend::default()
        .parse(&Options::from(naga_stage), source)
        .map_err(|errors| ShaderCompileError::new(stage, errors.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|error| ShaderCompileError::new(stage, error.emit_to_string(source)))?;
    Ok(module)
}

/// Creates a GPU shader module from GLSL, reporting GPU validation errors.
pub(crate) fn create_module(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderCompileError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_string()),
            stage: naga_stage(stage),
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ShaderCompileError::new(stage, error.to_string())),
        None => Ok(module),
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex | ShaderStage::Link => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

fn find_vertex_input(module: &naga::Module, name: &str) -> Option<u32> {
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga::ShaderStage::Vertex)?;
    let locations: Vec<(Option<&str>, u32)> = entry
        .function
        .arguments
        .iter()
        .filter_map(|argument| match argument.binding {
            Some(naga::Binding::Location { location, .. }) => {
                Some((argument.name.as_deref(), location))
            }
            _ => None,
        })
        .collect();

    if let Some((_, location)) = locations.iter().find(|(arg, _)| *arg == Some(name)) {
        return Some(*location);
    }
    // Some frontends drop argument names; a single input can only be the position.
    match locations.as_slice() {
        [(None, location)] => Some(*location),
        _ => None,
    }
}

fn collect_uniform_block(
    module: &naga::Module,
    uniforms: &mut HashMap<String, UniformSlot>,
) -> Option<usize> {
    let block = module.global_variables.iter().find_map(|(_, var)| {
        let at_block = var.space == naga::AddressSpace::Uniform
            && var
                .binding
                .as_ref()
                .is_some_and(|binding| binding.group == 0 && binding.binding == 0);
        at_block.then_some(var.ty)
    })?;

    let naga::TypeInner::Struct { members, span } = &module.types[block].inner else {
        return None;
    };
    for member in members {
        let (Some(name), Some(shape)) = (
            member.name.as_ref(),
            UniformShape::from_naga(&module.types[member.ty].inner),
        ) else {
            continue;
        };
        uniforms.insert(
            name.clone(),
            UniformSlot {
                offset: member.offset as usize,
                shape,
            },
        );
    }
    Some(*span as usize)
}

/// Pass-through vertex stage for the full-viewport quad.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Depth-map parallax fragment stage.
///
/// Samples the depth map (`image1`) at the aspect-corrected coordinate and
/// offsets the colour lookup (`image0`) by `mouse / threshold`, scaled by how
/// far the depth value sits from mid-grey. Coordinates outside the image are
/// mirrored back in.
pub(crate) const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform ParallaxParams {
    vec4 resolution;
    vec2 mouse;
    float time;
    float pixelRatio;
    vec2 threshold;
} params;

layout(set = 1, binding = 0) uniform texture2D image0;
layout(set = 1, binding = 1) uniform sampler image0Sampler;
layout(set = 1, binding = 2) uniform texture2D image1;
layout(set = 1, binding = 3) uniform sampler image1Sampler;

vec2 mirrored(vec2 v) {
    vec2 m = mod(v, vec2(2.0));
    return mix(m, vec2(2.0) - m, step(vec2(1.0), m));
}

void main() {
    vec2 uv = gl_FragCoord.xy * vec2(params.pixelRatio) / params.resolution.xy;
    vec2 vUv = (uv - vec2(0.5)) * params.resolution.zw + vec2(0.5);
    vec4 depth = texture(sampler2D(image1, image1Sampler), mirrored(vUv));
    float lift = depth.r - 0.5;
    vec2 fake3d = vec2(
        vUv.x + lift * params.mouse.x / params.threshold.x,
        vUv.y + lift * params.mouse.y / params.threshold.y
    );
    outColor = texture(sampler2D(image0, image0Sampler), mirrored(fake3d));
}
";

/// Places the canvas texture at `rect` (clip space) inside the window.
pub(crate) const COMPOSITE_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;

layout(std140, set = 0, binding = 0) uniform CompositeParams {
    vec4 rect;
} composite;

void main() {
    vec2 t = a_position * vec2(0.5) + vec2(0.5);
    v_uv = vec2(t.x, 1.0 - t.y);
    gl_Position = vec4(mix(composite.rect.xy, composite.rect.zw, t), 0.0, 1.0);
}
";

pub(crate) const COMPOSITE_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D canvasTexture;
layout(set = 1, binding = 1) uniform sampler canvasSampler;

void main() {
    outColor = texture(sampler2D(canvasTexture, canvasSampler), v_uv);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_program_reflects_contract() {
        let layout = check_program(&ProgramSource::bundled()).expect("bundled shaders");
        assert_eq!(layout.position_location, 0);

        let expect = [
            ("resolution", 0, UniformShape::Vector4),
            ("mouse", 16, UniformShape::Vector2),
            ("time", 24, UniformShape::Scalar1),
            ("pixelRatio", 28, UniformShape::Scalar1),
            ("threshold", 32, UniformShape::Vector2),
        ];
        for (name, offset, shape) in expect {
            assert_eq!(
                layout.uniform(name),
                Some(UniformSlot { offset, shape }),
                "uniform {name}"
            );
        }
        assert!(layout.uniform_block_size >= 40);
        assert_eq!(layout.uniform_block_size % 16, 0);
    }

    #[test]
    fn composite_program_parses() {
        let source = ProgramSource {
            vertex: Cow::Borrowed(COMPOSITE_VERTEX_GLSL),
            fragment: Cow::Borrowed(COMPOSITE_FRAGMENT_GLSL),
        };
        let layout = check_program(&source).expect("composite shaders");
        assert_eq!(layout.uniform("rect").map(|slot| slot.offset), Some(0));
    }

    #[test]
    fn broken_fragment_names_its_stage() {
        let source = ProgramSource {
            vertex: Cow::Borrowed(VERTEX_SHADER_GLSL),
            fragment: Cow::Borrowed("#version 450\nvoid main() { undefined_call(); }\n"),
        };
        let err = check_program(&source).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Fragment);
        assert!(!err.diagnostic.is_empty());
        assert!(err.to_string().starts_with("fragment shader failed to compile"));
    }

    #[test]
    fn vertex_without_position_is_rejected() {
        let source = ProgramSource {
            vertex: Cow::Borrowed(
                "#version 450\nlayout(location = 0) in vec2 corner;\nlayout(location = 1) in vec2 extra;\nvoid main() { gl_Position = vec4(corner + extra, 0.0, 1.0); }\n",
            ),
            fragment: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
        };
        let err = check_program(&source).unwrap_err();
        assert_eq!(err.stage, ShaderStage::Vertex);
        assert!(err.diagnostic.contains(POSITION_ATTRIBUTE));
    }

    #[test]
    fn overrides_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.vert");
        std::fs::write(&path, VERTEX_SHADER_GLSL).unwrap();
        let source = ProgramSource::load(&ShaderSources {
            vertex: Some(path),
            fragment: None,
        })
        .unwrap();
        assert!(matches!(source.vertex, Cow::Owned(_)));
        assert!(matches!(source.fragment, Cow::Borrowed(_)));

        let missing = ProgramSource::load(&ShaderSources {
            vertex: None,
            fragment: Some(dir.path().join("missing.frag")),
        });
        assert!(missing.is_err());
    }
}
