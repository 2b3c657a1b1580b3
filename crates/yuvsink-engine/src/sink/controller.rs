use std::sync::Arc;

use crate::context::ContextState;
use crate::coords::SurfaceSize;
use crate::thread::Shared;
use crate::window::WindowHandle;

use super::SinkError;

/// Cloneable handle for adjusting a sink from other threads.
///
/// Changes apply from the next frame on.
#[derive(Debug, Clone)]
pub struct SinkController {
    shared: Arc<Shared>,
}

impl SinkController {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn set_crop_top(&self, pixels: u32) {
        self.shared.update_settings(|s| s.crop.top = pixels);
    }

    pub fn set_crop_bottom(&self, pixels: u32) {
        self.shared.update_settings(|s| s.crop.bottom = pixels);
    }

    pub fn set_crop_left(&self, pixels: u32) {
        self.shared.update_settings(|s| s.crop.left = pixels);
    }

    pub fn set_crop_right(&self, pixels: u32) {
        self.shared.update_settings(|s| s.crop.right = pixels);
    }

    pub fn set_drop_first(&self, frames: u32) {
        self.shared.update_settings(|s| s.drop_first = frames);
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.shared.update_settings(|s| s.verbose = verbose);
    }

    /// Asks the sink to stop drawing, from any thread.
    ///
    /// A frame being handed to the render thread is returned undrawn, and
    /// later submissions fail with [`SinkError::NotStarted`]. The owner still
    /// calls [`Sink::stop`](super::Sink::stop) to tear the session down.
    pub fn request_stop(&self) {
        log::debug!("stop requested");
        self.shared.set_running(false);
    }

    /// Asks the sink to draw into an existing native window.
    ///
    /// Takes effect when the render thread next starts. Rejected while any
    /// handle, adopted or created, is in use.
    pub fn set_window_handle(&self, handle: WindowHandle) -> Result<(), SinkError> {
        let mut slot = self.shared.window.lock();
        if let Some(current) = slot.handle {
            log::error!(
                "window handle {:?} rejected: {:?} is already in use",
                handle.raw,
                current.raw
            );
            return Err(SinkError::WindowHandleInUse);
        }

        log::debug!("adopting window handle {:?}", handle.raw);
        slot.handle = Some(handle);
        slot.external = true;
        Ok(())
    }

    /// The handle of the window in use or queued for adoption.
    pub fn window_handle(&self) -> Option<WindowHandle> {
        self.shared.window.lock().handle
    }

    /// Reports a new inner size for an adopted window.
    pub fn notify_window_resized(&self, size: SurfaceSize) {
        self.shared.request_resize(size);
    }

    pub fn context_state(&self) -> ContextState {
        self.shared.state().get()
    }
}
