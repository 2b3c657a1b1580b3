use raw_window_handle::RawWindowHandle;

use crate::coords::SurfaceSize;

/// A native window handle exchanged with the embedding application.
///
/// Carries the window's inner size because adopted windows are not tracked
/// by this crate's event loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub raw: RawWindowHandle,
    pub size: SurfaceSize,
}

impl WindowHandle {
    #[inline]
    pub const fn new(raw: RawWindowHandle, size: SurfaceSize) -> Self {
        Self { raw, size }
    }
}

// SAFETY: the handle is an identifier only. It is dereferenced exclusively
// on the render thread, by the platform backend that created or adopted it.
unsafe impl Send for WindowHandle {}
unsafe impl Sync for WindowHandle {}
