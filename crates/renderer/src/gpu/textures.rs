use anyhow::{bail, Result};
use image::RgbaImage;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::types::TEXTURE_UNIT_COUNT;

/// Source images are uploaded without colour-space conversion.
pub(crate) const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Layout for set 1: unit `n` at binding `2n`, its sampler at `2n + 1`.
pub(crate) fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..TEXTURE_UNIT_COUNT as u32)
        .flat_map(|unit| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: unit * 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: unit * 2 + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("image textures layout"),
        entries: &entries,
    })
}

/// Clamp-to-edge on both axes, linear min/mag.
pub(crate) fn image_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

struct UnitResources {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// The two image textures; immutable once uploaded.
pub(crate) struct TextureSet {
    _units: Vec<UnitResources>,
    pub bind_group: wgpu::BindGroup,
}

impl TextureSet {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        images: &[RgbaImage; TEXTURE_UNIT_COUNT],
        max_dimension: u32,
    ) -> Result<Self> {
        let mut units = Vec::with_capacity(TEXTURE_UNIT_COUNT);
        for (unit, image) in images.iter().enumerate() {
            let (width, height) = image.dimensions();
            if width > max_dimension || height > max_dimension {
                bail!(
                    "image{unit} is {width}x{height}, larger than the GPU limit of {max_dimension}"
                );
            }
            let texture = device.create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some(&format!("image{unit}")),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: IMAGE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                },
                TextureDataOrder::LayerMajor,
                image.as_raw(),
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = image_sampler(device, &format!("image{unit}Sampler"));
            units.push(UnitResources {
                _texture: texture,
                view,
                sampler,
            });
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = units
            .iter()
            .enumerate()
            .flat_map(|(unit, resources)| {
                let unit = unit as u32;
                [
                    wgpu::BindGroupEntry {
                        binding: unit * 2,
                        resource: wgpu::BindingResource::TextureView(&resources.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: unit * 2 + 1,
                        resource: wgpu::BindingResource::Sampler(&resources.sampler),
                    },
                ]
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("image textures"),
            layout,
            entries: &entries,
        });

        tracing::info!(
            original = ?images[0].dimensions(),
            depth = ?images[1].dimensions(),
            "textures uploaded"
        );
        Ok(Self {
            _units: units,
            bind_group,
        })
    }
}
