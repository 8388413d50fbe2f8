use std::path::PathBuf;

use super::library::ShaderSource;
use super::ring::MAX_FRAMES_IN_FLIGHT;
use crate::device::GpuInit;
use crate::error::RendererError;

/// Which pipeline the renderer drives. Selected once, at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderMode {
    /// One compute kernel reading the input image and writing the drawable.
    Compute { kernel: String },
    /// A vertex+fragment pair drawn over the full-screen quad.
    Rasterize { vertex: String, fragment: String },
}

impl RenderMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compute { .. } => "compute",
            Self::Rasterize { .. } => "rasterize",
        }
    }

    /// Surface preferences suited to this mode.
    pub fn gpu_init(&self) -> GpuInit {
        match self {
            Self::Compute { .. } => GpuInit::compute(),
            Self::Rasterize { .. } => GpuInit::rasterize(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub mode: RenderMode,
    pub shader: ShaderSource,
    /// Required in compute mode; optional for the rasterization pass.
    pub input_image: Option<PathBuf>,
    /// Uniform sets kept in rotation (1..=3).
    pub frames_in_flight: usize,
}

impl RendererConfig {
    pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 2;

    pub fn compute(
        shader: ShaderSource,
        kernel: impl Into<String>,
        image: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode: RenderMode::Compute {
                kernel: kernel.into(),
            },
            shader,
            input_image: Some(image.into()),
            frames_in_flight: Self::DEFAULT_FRAMES_IN_FLIGHT,
        }
    }

    pub fn rasterize(
        shader: ShaderSource,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            mode: RenderMode::Rasterize {
                vertex: vertex.into(),
                fragment: fragment.into(),
            },
            shader,
            input_image: None,
            frames_in_flight: Self::DEFAULT_FRAMES_IN_FLIGHT,
        }
    }

    pub fn with_input_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.input_image = Some(image.into());
        self
    }

    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.frames_in_flight = frames;
        self
    }

    pub fn validate(&self) -> Result<(), RendererError> {
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&self.frames_in_flight) {
            return Err(RendererError::InvalidConfig(format!(
                "frames_in_flight must be in 1..={MAX_FRAMES_IN_FLIGHT}, got {}",
                self.frames_in_flight
            )));
        }

        match &self.mode {
            RenderMode::Compute { kernel } => {
                if kernel.is_empty() {
                    return Err(RendererError::InvalidConfig("empty kernel name".into()));
                }
                if self.input_image.is_none() {
                    return Err(RendererError::InvalidConfig(
                        "compute mode needs an input image".into(),
                    ));
                }
            }
            RenderMode::Rasterize { vertex, fragment } => {
                if vertex.is_empty() || fragment.is_empty() {
                    return Err(RendererError::InvalidConfig("empty entry point name".into()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src() -> ShaderSource {
        ShaderSource::wgsl("t", "")
    }

    #[test]
    fn compute_requires_image() {
        let mut cfg = RendererConfig::compute(src(), "grayscale", "dog.jpg");
        assert!(cfg.validate().is_ok());

        cfg.input_image = None;
        assert!(matches!(cfg.validate(), Err(RendererError::InvalidConfig(_))));
    }

    #[test]
    fn rasterize_image_is_optional() {
        let cfg = RendererConfig::rasterize(src(), "vs_main", "fs_main");
        assert!(cfg.validate().is_ok());
        assert!(cfg.with_input_image("dog.jpg").validate().is_ok());
    }

    #[test]
    fn frames_in_flight_bounds() {
        let cfg = RendererConfig::rasterize(src(), "vs", "fs");
        assert!(cfg.clone().with_frames_in_flight(0).validate().is_err());
        assert!(cfg.clone().with_frames_in_flight(3).validate().is_ok());
        assert!(cfg.with_frames_in_flight(4).validate().is_err());
    }

    #[test]
    fn mode_picks_surface_preferences() {
        let compute = RenderMode::Compute { kernel: "k".into() }.gpu_init();
        assert!(compute.storage_output);
        assert_eq!(compute.preferred_formats[0], wgpu::TextureFormat::Rgba8Unorm);

        let raster = RenderMode::Rasterize {
            vertex: "v".into(),
            fragment: "f".into(),
        }
        .gpu_init();
        assert!(!raster.storage_output);
        assert_eq!(raster.preferred_formats, vec![wgpu::TextureFormat::Bgra8Unorm]);
    }
}
