//! Pipeline construction for both render modes.
//!
//! Entry points are resolved against the [`ShaderLibrary`] before any GPU
//! object is created, so a missing name never leaves a half-built pipeline.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::dispatch::WorkgroupSize;
use super::geometry;
use super::library::{EntryStage, ShaderLibrary};
use super::params::ParameterStore;
use super::texture::IMAGE_FORMAT;
use crate::error::RendererError;

/// Output format the rasterization pass is built for.
pub const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Compiled compute kernel plus its binding layouts.
///
/// `@group(0)`: input texture (0), output storage texture (1).
/// `@group(1)`: parameters, see [`ParameterStore`].
pub struct ComputePipelineState {
    pub pipeline: wgpu::ComputePipeline,
    pub workgroup: WorkgroupSize,
    pub textures_layout: wgpu::BindGroupLayout,
    pub params_layout: wgpu::BindGroupLayout,
}

/// Compiled vertex+fragment pair plus its binding layouts.
///
/// `@group(0)`: input texture (0), sampler (1).
/// `@group(1)`: parameters, see [`ParameterStore`].
pub struct RenderPipelineState {
    pub pipeline: wgpu::RenderPipeline,
    pub textures_layout: wgpu::BindGroupLayout,
    pub params_layout: wgpu::BindGroupLayout,
}

pub fn build_compute_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    function_name: &str,
) -> Result<ComputePipelineState, RendererError> {
    let kernel = library.entry(function_name, EntryStage::Compute)?;
    let workgroup = kernel.workgroup_size();
    if !workgroup.is_valid() {
        return Err(RendererError::PipelineCompilation(Diagnostics::single(
            Diagnostic::unlocated(
                library.label(),
                format!("kernel `{function_name}` must declare a 2-D @workgroup_size"),
            ),
        )));
    }

    let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("prism compute textures bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::WriteOnly,
                    format: IMAGE_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
        ],
    });
    let params_layout = ParameterStore::create_layout(device, wgpu::ShaderStages::COMPUTE);

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("prism compute pipeline layout"),
        bind_group_layouts: &[&textures_layout, &params_layout],
        immediate_size: 0,
    });

    let pipeline = validated(device, library, || {
        let module = library.create_module(device);
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&format!("prism compute `{function_name}`")),
            layout: Some(&layout),
            module: &module,
            entry_point: Some(kernel.name()),
            compilation_options: Default::default(),
            cache: None,
        })
    })?;

    log::info!(
        "compute pipeline `{function_name}` built (workgroup {}x{})",
        workgroup.x,
        workgroup.y
    );

    Ok(ComputePipelineState {
        pipeline,
        workgroup,
        textures_layout,
        params_layout,
    })
}

pub fn build_render_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    vertex_function_name: &str,
    fragment_function_name: &str,
    target_format: wgpu::TextureFormat,
) -> Result<RenderPipelineState, RendererError> {
    let vertex = library.entry(vertex_function_name, EntryStage::Vertex)?;
    let fragment = library.entry(fragment_function_name, EntryStage::Fragment)?;

    if target_format != RENDER_TARGET_FORMAT {
        log::warn!("render target is {target_format:?}, expected {RENDER_TARGET_FORMAT:?}");
    }

    let textures_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("prism render textures bgl"),
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
    let params_layout = ParameterStore::create_layout(
        device,
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
    );

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("prism render pipeline layout"),
        bind_group_layouts: &[&textures_layout, &params_layout],
        immediate_size: 0,
    });

    let buffers = geometry::vertex_layouts();

    let pipeline = validated(device, library, || {
        let module = library.create_module(device);
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!(
                "prism render `{vertex_function_name}`/`{fragment_function_name}`"
            )),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(vertex.name()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(fragment.name()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

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
            multiview_mask: None,
            cache: None,
        })
    })?;

    log::info!("render pipeline `{vertex_function_name}`/`{fragment_function_name}` built");
    log::debug!("render target format {target_format:?}");

    Ok(RenderPipelineState {
        pipeline,
        textures_layout,
        params_layout,
    })
}

/// Runs `build` inside a validation error scope. Anything wgpu rejects (layout
/// mismatch, device limits, backend compilation) comes back as
/// [`RendererError::PipelineCompilation`] instead of reaching the uncaptured
/// error handler.
fn validated<T>(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    build: impl FnOnce() -> T,
) -> Result<T, RendererError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => {
            log::debug!("shader library `{}` rejected: {err}", library.label());
            Err(RendererError::PipelineCompilation(Diagnostics::parse_raw(
                library.label(),
                &err.to_string(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_device() -> wgpu::Device {
        let (device, _queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        device
    }

    const GRAYSCALE: &str = r#"
@group(0) @binding(0) var input_tex: texture_2d<f32>;
@group(0) @binding(1) var output_tex: texture_storage_2d<rgba8unorm, write>;

@compute @workgroup_size(16, 16)
fn grayscale(@builtin(global_invocation_id) gid: vec3<u32>) {
    let c = textureLoad(input_tex, gid.xy, 0);
    let l = dot(c.rgb, vec3<f32>(0.2126, 0.7152, 0.0722));
    textureStore(output_tex, gid.xy, vec4<f32>(l, l, l, 1.0));
}
"#;

    const QUAD: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var tex: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

@vertex
fn vs_main(
    @location(0) position: vec4<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
) -> VertexOut {
    return VertexOut(position * color.a, uv);
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSample(tex, samp, in.uv);
}
"#;

    #[test]
    fn compute_pipeline_builds_against_binding_contract() {
        let device = headless_device();
        let lib = ShaderLibrary::from_wgsl("grayscale.wgsl", GRAYSCALE).unwrap();

        let state = build_compute_pipeline(&device, &lib, "grayscale").unwrap();
        assert_eq!(state.workgroup, WorkgroupSize::new(16, 16));
    }

    #[test]
    fn compute_storage_format_mismatch_is_pipeline_compilation() {
        let device = headless_device();
        let code = r#"
@group(0) @binding(1) var o: texture_storage_2d<rgba16float, write>;

@compute @workgroup_size(16, 16)
fn k(@builtin(global_invocation_id) i: vec3<u32>) {
    textureStore(o, i.xy, vec4<f32>(1.0));
}
"#;
        // Valid WGSL on its own; only the fixed layout rejects it.
        let lib = ShaderLibrary::from_wgsl("rgba16.wgsl", code).unwrap();

        let err = build_compute_pipeline(&device, &lib, "k").err().expect("rejected");
        let diags = err.diagnostics().expect("diagnostics");
        assert!(!diags.is_empty());
    }

    #[test]
    fn compute_missing_kernel_builds_nothing() {
        let device = headless_device();
        let lib = ShaderLibrary::from_wgsl("grayscale.wgsl", GRAYSCALE).unwrap();

        let err = build_compute_pipeline(&device, &lib, "grayscaleKernel").err().expect("missing");
        assert!(matches!(
            err,
            RendererError::ShaderFunctionNotFound { ref name, stage: EntryStage::Compute, .. }
                if name == "grayscaleKernel"
        ));
    }

    #[test]
    fn render_pipeline_builds_against_binding_contract() {
        let device = headless_device();
        let lib = ShaderLibrary::from_wgsl("quad.wgsl", QUAD).unwrap();

        let target = RENDER_TARGET_FORMAT;
        let built = build_render_pipeline(&device, &lib, "vs_main", "fs_main", target);
        assert!(built.is_ok());
    }

    #[test]
    fn render_missing_fragment_names_the_fragment() {
        let device = headless_device();
        let lib = ShaderLibrary::from_wgsl("quad.wgsl", QUAD).unwrap();

        let err = build_render_pipeline(
            &device,
            &lib,
            "vs_main",
            "fragmentShader",
            RENDER_TARGET_FORMAT,
        )
        .err()
        .expect("missing");
        assert!(matches!(
            err,
            RendererError::ShaderFunctionNotFound { ref name, stage: EntryStage::Fragment, .. }
                if name == "fragmentShader"
        ));
    }

    #[test]
    fn oversized_uniform_is_pipeline_compilation() {
        let device = headless_device();
        let code = r#"
@group(1) @binding(0) var<uniform> u: mat4x4<f32>;

@vertex
fn vs_main(@location(0) position: vec4<f32>) -> @builtin(position) vec4<f32> {
    return u * position;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let lib = ShaderLibrary::from_wgsl("mat4.wgsl", code).unwrap();

        let err = build_render_pipeline(&device, &lib, "vs_main", "fs_main", RENDER_TARGET_FORMAT)
            .err()
            .expect("rejected");
        assert!(matches!(err, RendererError::PipelineCompilation(_)));
    }
}
