use anyhow::Result;

use crate::coords::{CompositePlan, SurfaceSize};
use crate::format::{Planes, VideoInfo};
use crate::window::{SurfaceEvent, WindowHandle};

/// Native backend driven by a [`Session`](super::Session).
///
/// A platform value is moved onto the render thread and every method is
/// called there. Resources it hands out release themselves on drop; the
/// session owns them and fixes the drop order.
pub trait Platform: Send + 'static {
    type Display;
    type Window;
    type Context;
    type Shaders;
    type Targets;

    fn open_display(&mut self) -> Result<Self::Display>;

    /// Creates a top-level window at the configured default size.
    fn create_window(&mut self, display: &mut Self::Display) -> Result<Self::Window>;

    /// Wraps a window owned by the embedding application.
    fn adopt_window(
        &mut self,
        display: &mut Self::Display,
        handle: WindowHandle,
    ) -> Result<Self::Window>;

    fn create_context(
        &mut self,
        display: &Self::Display,
        window: &Self::Window,
    ) -> Result<Self::Context>;

    fn compile_shaders(&mut self, context: &Self::Context) -> Result<Self::Shaders>;

    /// Allocates plane textures and the offscreen target for `info`.
    fn allocate_targets(
        &mut self,
        context: &Self::Context,
        shaders: &Self::Shaders,
        info: &VideoInfo,
    ) -> Result<Self::Targets>;

    /// Pass 1: upload and convert into the offscreen target.
    fn convert(
        &mut self,
        context: &mut Self::Context,
        shaders: &Self::Shaders,
        targets: &Self::Targets,
        planes: &Planes<'_>,
        info: &VideoInfo,
    ) -> Result<()>;

    /// Pass 2: crop, letterbox and scale onto the surface.
    fn composite(
        &mut self,
        context: &mut Self::Context,
        shaders: &Self::Shaders,
        targets: &Self::Targets,
        plan: &CompositePlan,
    ) -> Result<()>;

    /// Shows the last composited image.
    fn present(&mut self, window: &Self::Window, context: &mut Self::Context) -> Result<()>;

    fn resize(&mut self, context: &mut Self::Context, size: SurfaceSize);

    /// Drains pending native events without blocking.
    fn pump_events(
        &mut self,
        display: &mut Self::Display,
        window: &Self::Window,
    ) -> Vec<SurfaceEvent>;

    fn window_handle(&self, window: &Self::Window) -> Result<WindowHandle>;

    fn window_size(&self, window: &Self::Window) -> SurfaceSize;

    /// Closes descriptors leaked by the driver. Runs after every teardown.
    fn release_leaked_descriptors(&mut self);
}
