use std::time::Duration;

use crate::coords::Crop;
use crate::device::GpuConfig;
use crate::window::WindowConfig;

/// Construction-time sink configuration.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Pixels trimmed from each edge of the display-sized video.
    pub crop: Crop,
    /// Leading frames acknowledged without being drawn, counted per start.
    pub drop_first: u32,
    /// Logs per-frame timing at info instead of debug.
    pub verbose: bool,
    pub window: WindowConfig,
    pub gpu: GpuConfig,
    /// Longest time the render thread waits for a frame before pumping
    /// window events again.
    pub event_poll_interval: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            crop: Crop::NONE,
            drop_first: 0,
            verbose: false,
            window: WindowConfig::default(),
            gpu: GpuConfig::default(),
            event_poll_interval: Duration::from_millis(10),
        }
    }
}
