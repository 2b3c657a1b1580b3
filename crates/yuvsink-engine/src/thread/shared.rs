use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::context::StateCell;
use crate::coords::{Crop, SurfaceSize};
use crate::format::VideoInfo;
use crate::window::WindowHandle;

/// Per-frame settings, read by the render thread before each draw.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub crop: Crop,
    pub drop_first: u32,
    pub verbose: bool,
}

/// The window in use, or the one to adopt on the next start.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct WindowSlot {
    pub handle: Option<WindowHandle>,
    /// `true` if `handle` came from `set_window_handle`.
    pub external: bool,
}

/// State shared between the sink, its controllers and the render thread.
#[derive(Debug, Default)]
pub struct Shared {
    settings: Mutex<Settings>,
    video: Mutex<Option<VideoInfo>>,
    pending_resize: Mutex<Option<SurfaceSize>>,
    pub(crate) window: Mutex<WindowSlot>,
    running: AtomicBool,
    state: StateCell,
}

impl Shared {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Self::default()
        }
    }

    pub fn settings(&self) -> Settings {
        *self.settings.lock()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings.lock());
    }

    pub fn video(&self) -> Option<VideoInfo> {
        *self.video.lock()
    }

    pub fn set_video(&self, info: Option<VideoInfo>) {
        *self.video.lock() = info;
    }

    /// Records a size change for an adopted window. Only the latest counts.
    pub fn request_resize(&self, size: SurfaceSize) {
        *self.pending_resize.lock() = Some(size);
    }

    pub fn take_pending_resize(&self) -> Option<SurfaceSize> {
        self.pending_resize.lock().take()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn state(&self) -> &StateCell {
        &self.state
    }
}
