use crate::coords::SurfaceSize;

/// What to do after the surface refused to hand out a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceRecovery {
    /// The surface was reconfigured; acquire again.
    Retry,
    /// Transient; present nothing this time.
    Skip,
    /// The surface or device is gone.
    Lost,
}

/// Picks a surface format for already gamma-encoded video.
///
/// 8-bit BGRA/RGBA first, sRGB variants only when asked for.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let preferred: [wgpu::TextureFormat; 2] = if prefer_srgb {
        [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb]
    } else {
        [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}

/// Video frames are fully opaque; blend with the desktop only if the
/// surface offers nothing else.
pub(crate) fn choose_alpha_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::CompositeAlphaMode {
    let opaque = wgpu::CompositeAlphaMode::Opaque;
    if caps.alpha_modes.contains(&opaque) {
        return opaque;
    }
    caps.alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Records `new_size` and reconfigures unless it is empty; wgpu rejects
/// 0x0 surfaces, so those wait for the next non-empty size.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut SurfaceSize,
    new_size: SurfaceSize,
) {
    *size = new_size;
    if new_size.is_empty() {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn recover(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: SurfaceSize,
    err: wgpu::SurfaceError,
) -> SurfaceRecovery {
    let recovery = classify(&err);
    if recovery == SurfaceRecovery::Retry && !size.is_empty() {
        surface.configure(device, config);
    }
    recovery
}

fn classify(err: &wgpu::SurfaceError) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Retry,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Lost,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceRecovery::Skip,
    }
}
