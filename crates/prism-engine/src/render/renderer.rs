//! Frame Renderer: one encoded, submitted and presented frame per display refresh.

use super::blit::BlitPass;
use super::config::{RenderMode, RendererConfig};
use super::dispatch::{DispatchGrid, WorkgroupSize};
use super::geometry::{GeometryBuffers, QUAD_VERTEX_COUNT, quad_geometry};
use super::library::ShaderLibrary;
use super::params::{ParameterStore, UniformValues};
use super::pipeline::{
    ComputePipelineState, RenderPipelineState, build_compute_pipeline, build_render_pipeline,
};
use super::texture::{InputTexture, StorageTarget, linear_sampler};
use crate::device::{Gpu, GpuFrame, SurfaceRecovery};
use crate::error::RendererError;
use crate::time::ShaderClock;

/// Why a frame was dropped. Never an error: the next tick simply tries again.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SkipReason {
    /// Every uniform set is still referenced by an unfinished submission.
    UniformsInFlight,
    /// The compositor had no drawable ready (timeout, occluded, ...).
    SurfaceUnavailable,
    /// The surface was lost or outdated and has been reconfigured.
    SurfaceReconfigured,
    /// The window has zero area (minimized).
    ZeroSized,
}

/// Outcome of one [`Renderer::render`] call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameStatus {
    Presented,
    Skipped(SkipReason),
    /// The surface reported an unrecoverable condition (out of memory).
    Fatal,
}

/// Where the compute kernel writes.
enum ComputeOutput {
    /// Straight into the drawable (surface supports storage binding).
    Drawable,
    /// Into an offscreen target, then blitted onto the drawable.
    Offscreen {
        target: StorageTarget,
        textures: wgpu::BindGroup,
        blit: BlitPass,
    },
}

enum Pass {
    Compute {
        state: ComputePipelineState,
        output: ComputeOutput,
    },
    Rasterize {
        state: RenderPipelineState,
        geometry: GeometryBuffers,
        textures: wgpu::BindGroup,
    },
}

/// Full-screen shader renderer.
///
/// Built once per surface; every display refresh calls [`render`](Self::render),
/// which encodes and submits one frame without waiting for the GPU. Pipelines,
/// the input texture and the quad are immutable after construction; the
/// uniform ring is the only per-frame mutable GPU state.
pub struct Renderer {
    pass: Pass,
    input: InputTexture,
    params: ParameterStore,
    clock: ShaderClock,
}

impl Renderer {
    /// Builds the pipeline and all static resources for `config`.
    ///
    /// Every required entry point is resolved before any GPU object is created.
    pub fn new(gpu: &Gpu<'_>, config: &RendererConfig) -> Result<Self, RendererError> {
        config.validate()?;

        let device = gpu.device();
        let queue = gpu.queue();
        let size = gpu.size();
        let library = ShaderLibrary::load(&config.shader)?;

        let input = match &config.input_image {
            Some(path) => InputTexture::load(device, queue, path)?,
            None => InputTexture::placeholder(device, queue),
        };

        let pass = match &config.mode {
            RenderMode::Compute { kernel } => {
                let state = build_compute_pipeline(device, &library, kernel)?;
                let output = if gpu.storage_output() {
                    log::info!("compute output: drawable");
                    ComputeOutput::Drawable
                } else {
                    log::info!("compute output: offscreen target + blit");
                    let target = StorageTarget::new(device, size.width, size.height);
                    let textures = compute_textures(device, &state, &input.view, &target.view);
                    let blit = BlitPass::new(device, gpu.surface_format(), &target);
                    ComputeOutput::Offscreen {
                        target,
                        textures,
                        blit,
                    }
                };
                Pass::Compute { state, output }
            }
            RenderMode::Rasterize { vertex, fragment } => {
                let format = gpu.surface_format();
                let state = build_render_pipeline(device, &library, vertex, fragment, format)?;
                let geometry = GeometryBuffers::upload(device, &quad_geometry());
                let sampler = linear_sampler(device, "prism input sampler");
                let textures = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("prism render textures"),
                    layout: &state.textures_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&input.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });
                Pass::Rasterize {
                    state,
                    geometry,
                    textures,
                }
            }
        };

        let params_layout = match &pass {
            Pass::Compute { state, .. } => &state.params_layout,
            Pass::Rasterize { state, .. } => &state.params_layout,
        };
        let params = ParameterStore::new(
            device,
            params_layout,
            config.frames_in_flight,
            size.width,
            size.height,
        );

        log::info!("renderer ready ({} mode)", config.mode.name());

        Ok(Self {
            pass,
            input,
            params,
            // Started last so the first frame sees t ~ 0.
            clock: ShaderClock::new(),
        })
    }

    /// Current CPU-side uniform values.
    pub fn uniforms(&self) -> &UniformValues {
        self.params.values()
    }

    /// Workgroup size of the compute kernel, if in compute mode.
    pub fn workgroup(&self) -> Option<WorkgroupSize> {
        match &self.pass {
            Pass::Compute { state, .. } => Some(state.workgroup),
            Pass::Rasterize { .. } => None,
        }
    }

    /// Resize handler: rewrites the resolution uniform and, for the offscreen
    /// compute path, recreates the target at the new size.
    pub fn on_resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.params.on_resize(width as f32, height as f32);
        if width > 0 && height > 0 {
            self.ensure_target_size(device, width, height);
        }
    }

    /// Encodes, submits and presents one frame.
    pub fn render(&mut self, gpu: &mut Gpu<'_>) -> FrameStatus {
        let size = gpu.size();
        if size.width == 0 || size.height == 0 {
            return FrameStatus::Skipped(SkipReason::ZeroSized);
        }

        // Lets completion callbacks for earlier submissions run.
        if let Err(err) = gpu.device().poll(wgpu::PollType::Poll) {
            log::trace!("device poll: {err}");
        }

        let Some(slot) = self.params.begin_frame() else {
            log::trace!("frame skipped: uniform ring full");
            return FrameStatus::Skipped(SkipReason::UniformsInFlight);
        };

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                self.params.abandon(slot);
                log::trace!("frame skipped: {err}");
                return match gpu.recover_surface(err) {
                    SurfaceRecovery::Unrecoverable => FrameStatus::Fatal,
                    SurfaceRecovery::Reconfigured => {
                        FrameStatus::Skipped(SkipReason::SurfaceReconfigured)
                    }
                    SurfaceRecovery::Unavailable => {
                        FrameStatus::Skipped(SkipReason::SurfaceUnavailable)
                    }
                };
            }
        };

        let (width, height) = frame.size();
        self.ensure_target_size(gpu.device(), width, height);

        let elapsed = self.clock.tick();
        self.params.update_time(elapsed);
        self.params.flush(gpu.queue(), slot);

        let params = self.params.bind_group(slot);
        match &self.pass {
            Pass::Compute { state, output } => {
                encode_compute(gpu.device(), &mut frame, state, output, &self.input, params)
            }
            Pass::Rasterize {
                state,
                geometry,
                textures,
            } => encode_rasterize(&mut frame, state, geometry, textures, params),
        }

        gpu.submit(frame);
        self.params.retire(gpu.queue(), slot);

        FrameStatus::Presented
    }

    fn ensure_target_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let Pass::Compute {
            state,
            output: ComputeOutput::Offscreen {
                target,
                textures,
                blit,
            },
        } = &mut self.pass
        else {
            return;
        };

        if (target.texture.width(), target.texture.height()) == (width, height) {
            return;
        }

        log::debug!("recreating compute target at {width}x{height}");
        *target = StorageTarget::new(device, width, height);
        *textures = compute_textures(device, state, &self.input.view, &target.view);
        blit.rebind(device, target);
    }
}

fn compute_textures(
    device: &wgpu::Device,
    state: &ComputePipelineState,
    input: &wgpu::TextureView,
    output: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("prism compute textures"),
        layout: &state.textures_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(output),
            },
        ],
    })
}

fn encode_compute(
    device: &wgpu::Device,
    frame: &mut GpuFrame,
    state: &ComputePipelineState,
    output: &ComputeOutput,
    input: &InputTexture,
    params: &wgpu::BindGroup,
) {
    let (width, height) = frame.size();
    let grid = DispatchGrid::covering(width, height, state.workgroup);

    // The drawable changes every frame, so its bind group does too.
    let drawable_textures;
    let textures = match output {
        ComputeOutput::Drawable => {
            drawable_textures = compute_textures(device, state, &input.view, &frame.view);
            &drawable_textures
        }
        ComputeOutput::Offscreen { textures, .. } => textures,
    };

    {
        let mut cpass = frame.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("prism compute pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&state.pipeline);
        cpass.set_bind_group(0, textures, &[]);
        cpass.set_bind_group(1, params, &[]);
        cpass.dispatch_workgroups(grid.x, grid.y, 1);
    }

    if let ComputeOutput::Offscreen { blit, .. } = output {
        blit.encode(&mut frame.encoder, &frame.view);
    }
}

fn encode_rasterize(
    frame: &mut GpuFrame,
    state: &RenderPipelineState,
    geometry: &GeometryBuffers,
    textures: &wgpu::BindGroup,
    params: &wgpu::BindGroup,
) {
    let (width, height) = frame.size();

    let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("prism quad pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &frame.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    rpass.set_pipeline(&state.pipeline);
    rpass.set_bind_group(0, textures, &[]);
    rpass.set_bind_group(1, params, &[]);
    geometry.bind(&mut rpass);
    rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
    rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
}
