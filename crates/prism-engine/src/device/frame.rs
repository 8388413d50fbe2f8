/// A single acquired drawable plus the encoder recording into it.
///
/// Short-lived: the renderer borrows it for one frame and hands it back to
/// [`Gpu::submit`](super::Gpu::submit), which presents it. Holding the surface
/// texture blocks acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    /// Drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        let texture = &self.surface_texture.texture;
        (texture.width(), texture.height())
    }
}
