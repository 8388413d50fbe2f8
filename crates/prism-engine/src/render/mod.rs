//! Full-screen shader pass.
//!
//! - `library`: WGSL loading, validation and entry-point lookup
//! - `pipeline`: compute / render pipeline construction
//! - `params`: time + resolution uniforms, rotated per frame
//! - `renderer`: per-frame encode, submit and present

mod blit;
mod config;
mod diagnostics;
mod dispatch;
mod geometry;
mod library;
mod params;
mod pipeline;
mod renderer;
mod ring;
mod texture;

pub use config::{RenderMode, RendererConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use dispatch::{DispatchGrid, WorkgroupSize};
pub use geometry::{QUAD_VERTEX_COUNT, QuadGeometry, quad_geometry};
pub use library::{EntryPoint, EntryStage, ShaderLibrary, ShaderSource};
pub use params::{ParameterStore, UniformValues};
pub use pipeline::{
    ComputePipelineState, RenderPipelineState, build_compute_pipeline, build_render_pipeline,
};
pub use renderer::{FrameStatus, Renderer, SkipReason};
pub use ring::{FrameRing, MAX_FRAMES_IN_FLIGHT};
pub use texture::{InputTexture, StorageTarget};
