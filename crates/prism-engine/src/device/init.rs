/// Initialization parameters for the GPU layer.
///
/// Add configuration flags only when a concrete platform or backend
/// requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Surface formats to try, in order. The first supported one wins; if none
    /// is supported the surface's first advertised format is used.
    pub preferred_formats: Vec<wgpu::TextureFormat>,

    /// Request `STORAGE_BINDING` on the surface so compute kernels can write
    /// the drawable directly. Only honored for `Rgba8Unorm` surfaces.
    pub storage_output: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and paces frames to the display refresh.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface (a hint).
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Defaults for a vertex+fragment pass: fixed 8-bit BGRA output.
    pub fn rasterize() -> Self {
        Self::default()
    }

    /// Defaults for a compute pass that writes `rgba8unorm` storage.
    pub fn compute() -> Self {
        Self {
            preferred_formats: vec![
                wgpu::TextureFormat::Rgba8Unorm,
                wgpu::TextureFormat::Bgra8Unorm,
            ],
            storage_output: true,
            ..Self::default()
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            preferred_formats: vec![wgpu::TextureFormat::Bgra8Unorm],
            storage_output: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
