/// GPU selection and presentation settings for the video surface.
#[derive(Debug, Clone)]
pub struct GpuConfig {
    /// Backends the wgpu instance may use.
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    /// FIFO paces presentation to the display and is always supported.
    pub present_mode: wgpu::PresentMode,
    /// Converted video is already gamma encoded, so a linear surface format
    /// is chosen unless this is set.
    pub prefer_srgb: bool,
    /// Frames the surface may queue ahead of the display.
    pub frame_latency: u32,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            present_mode: wgpu::PresentMode::Fifo,
            prefer_srgb: false,
            frame_latency: 2,
        }
    }
}
