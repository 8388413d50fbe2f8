//! Construction-time error taxonomy.
//!
//! Every variant is fatal to renderer construction. Per-frame conditions are
//! not errors; see [`FrameStatus`](crate::render::FrameStatus).

use std::path::PathBuf;

use thiserror::Error;

use crate::render::{Diagnostics, EntryStage};

#[derive(Debug, Error)]
pub enum RendererError {
    /// No usable GPU adapter, or device/queue creation failed.
    #[error("unsupported hardware: {0}")]
    UnsupportedHardware(String),

    /// A named entry point is absent from the shader library (or has a
    /// different stage than requested).
    #[error("shader function `{name}` ({stage}) not found in shader library `{library}`")]
    ShaderFunctionNotFound {
        library: String,
        name: String,
        stage: EntryStage,
    },

    /// The shader library or pipeline was rejected.
    #[error("pipeline compilation failed:\n{0}")]
    PipelineCompilation(Diagnostics),

    #[error("failed to read shader library {}", .path.display())]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load image asset {}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to create surface")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("invalid renderer configuration: {0}")]
    InvalidConfig(String),
}

impl RendererError {
    /// Structured diagnostics, when the error carries any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::PipelineCompilation(d) => Some(d),
            _ => None,
        }
    }
}
