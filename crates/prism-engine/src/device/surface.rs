use winit::dpi::PhysicalSize;

/// What became of the surface after a failed drawable acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceRecovery {
    /// Lost or outdated; reconfigured in place, next frame may proceed.
    Reconfigured,
    /// No drawable this time (timeout, occluded window).
    Unavailable,
    /// Out of memory. Nothing left to retry.
    Unrecoverable,
}

/// Picks the first preferred format the surface supports, else the surface's
/// first advertised format.
pub(crate) fn choose_surface_format(
    supported: &[wgpu::TextureFormat],
    preferred: &[wgpu::TextureFormat],
) -> Option<wgpu::TextureFormat> {
    let first = *supported.first()?;

    let chosen = preferred
        .iter()
        .copied()
        .find(|f| supported.contains(f))
        .unwrap_or(first);

    if !preferred.is_empty() && !preferred.contains(&chosen) {
        log::warn!(
            "no preferred surface format supported (wanted {preferred:?}); using {chosen:?}"
        );
    }

    Some(chosen)
}

pub(crate) fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Surface usages for `format`.
///
/// Storage writes are only enabled for `Rgba8Unorm`, the format compute
/// kernels declare for their output; other formats go through an offscreen
/// target instead.
pub(crate) fn surface_usages(
    supported: wgpu::TextureUsages,
    format: wgpu::TextureFormat,
    want_storage: bool,
) -> wgpu::TextureUsages {
    let mut usages = wgpu::TextureUsages::RENDER_ATTACHMENT;
    if want_storage
        && format == wgpu::TextureFormat::Rgba8Unorm
        && supported.contains(wgpu::TextureUsages::STORAGE_BINDING)
    {
        usages |= wgpu::TextureUsages::STORAGE_BINDING;
    }
    usages
}

/// Applies a resize to the surface configuration.
///
/// wgpu does not support configuring a surface with a 0x0 size; in that case,
/// only internal state is updated and configuration is deferred.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceRecovery::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Unrecoverable,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceRecovery::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn format_prefers_first_supported_preference() {
        let supported = [F::Bgra8UnormSrgb, F::Bgra8Unorm, F::Rgba8Unorm];
        let chosen = choose_surface_format(&supported, &[F::Rgba8Unorm, F::Bgra8Unorm]);
        assert_eq!(chosen, Some(F::Rgba8Unorm));
    }

    #[test]
    fn format_falls_back_to_first_advertised() {
        let supported = [F::Rgb10a2Unorm, F::Bgra8UnormSrgb];
        assert_eq!(
            choose_surface_format(&supported, &[F::Bgra8Unorm]),
            Some(F::Rgb10a2Unorm)
        );
    }

    #[test]
    fn format_none_when_surface_advertises_nothing() {
        assert_eq!(choose_surface_format(&[], &[F::Bgra8Unorm]), None);
    }

    #[test]
    fn alpha_mode_honors_supported_request() {
        use wgpu::CompositeAlphaMode as A;
        let supported = [A::Opaque, A::PreMultiplied];
        assert_eq!(choose_alpha_mode(&supported, Some(A::PreMultiplied)), A::PreMultiplied);
        assert_eq!(choose_alpha_mode(&supported, Some(A::PostMultiplied)), A::Opaque);
        assert_eq!(choose_alpha_mode(&[], None), A::Auto);
    }

    #[test]
    fn storage_usage_requires_rgba8_and_surface_support() {
        use wgpu::TextureUsages as U;
        let caps = U::RENDER_ATTACHMENT | U::STORAGE_BINDING;

        assert!(surface_usages(caps, F::Rgba8Unorm, true).contains(U::STORAGE_BINDING));
        assert!(!surface_usages(caps, F::Bgra8Unorm, true).contains(U::STORAGE_BINDING));
        assert!(!surface_usages(caps, F::Rgba8Unorm, false).contains(U::STORAGE_BINDING));
        assert!(!surface_usages(U::RENDER_ATTACHMENT, F::Rgba8Unorm, true)
            .contains(U::STORAGE_BINDING));
    }
}
