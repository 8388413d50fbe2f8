//! Texture resources: the immutable input image and the offscreen compute target.

use std::path::Path;

use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::error::RendererError;

/// Format of the input texture and of every compute output.
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Input image, uploaded once and never modified.
pub struct InputTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl InputTexture {
    /// Decodes an image file (png/jpeg) and uploads it.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, RendererError> {
        let image = image::open(path).map_err(|source| RendererError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        if width == 0 || height == 0 {
            return Err(RendererError::InvalidConfig(format!(
                "image {} has zero extent ({width}x{height})",
                path.display()
            )));
        }

        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RendererError::InvalidConfig(format!(
                "image {} is {width}x{height}; GPU limit is {max}",
                path.display()
            )));
        }

        log::info!("loaded input image {} ({width}x{height})", path.display());

        let label = format!("prism input {}", path.display());
        Ok(Self::from_rgba8(device, queue, &label, width, height, rgba.as_raw()))
    }

    /// 1x1 opaque black texture, bound when a pass has no input image.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba8(device, queue, "prism input placeholder", 1, 1, &[0, 0, 0, 255])
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
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
            pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// Linear clamp-to-edge sampler for the rasterization pass.
pub fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Offscreen `rgba8unorm` storage image sized to the drawable.
///
/// Used when the surface cannot be bound as storage; the blit pass copies it
/// onto the drawable afterwards.
pub struct StorageTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl StorageTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("prism compute target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}
