use anyhow::{Context, Result};

use super::Platform;
use crate::coords::{CompositePlan, SurfaceSize};
#[cfg(target_os = "linux")]
use crate::device::LeakedFdSweep;
use crate::device::{GpuContext, GpuConfig};
use crate::format::{Planes, VideoInfo};
use crate::render::{self, FrameTargets, Pipelines};
use crate::window::{Display, NativeWindow, SurfaceEvent, WindowConfig, WindowHandle};

/// Production backend: winit for the display and window, wgpu for drawing.
#[derive(Debug, Clone, Default)]
pub struct WgpuPlatform {
    window: WindowConfig,
    gpu: GpuConfig,
}

impl WgpuPlatform {
    pub fn new(window: WindowConfig, gpu: GpuConfig) -> Self {
        Self { window, gpu }
    }
}

/// GPU context plus the surface texture waiting to be presented.
pub struct SurfaceContext {
    pending: Option<wgpu::SurfaceTexture>,
    gpu: GpuContext,
}

impl Drop for SurfaceContext {
    fn drop(&mut self) {
        log::debug!("destroying graphics context");
    }
}

impl Platform for WgpuPlatform {
    type Display = Display;
    type Window = NativeWindow;
    type Context = SurfaceContext;
    type Shaders = Pipelines;
    type Targets = FrameTargets;

    fn open_display(&mut self) -> Result<Display> {
        Display::open()
    }

    fn create_window(&mut self, display: &mut Display) -> Result<NativeWindow> {
        let window = display.create_window(&self.window)?;
        log::debug!("created window \"{}\"", self.window.title);
        Ok(NativeWindow::Owned(window))
    }

    fn adopt_window(&mut self, display: &mut Display, handle: WindowHandle) -> Result<NativeWindow> {
        NativeWindow::adopt(display, handle)
    }

    fn create_context(&mut self, _display: &Display, window: &NativeWindow) -> Result<SurfaceContext> {
        let gpu = match window {
            NativeWindow::Owned(window) => {
                pollster::block_on(GpuContext::for_window(window.clone(), self.gpu.clone()))?
            }
            NativeWindow::Adopted { target, size } => {
                // SAFETY: the session drops this context before the window
                // wrapper and the display, and the embedding application
                // keeps the adopted window alive while the sink runs.
                pollster::block_on(unsafe {
                    GpuContext::for_adopted(*target, *size, self.gpu.clone())
                })?
            }
        };

        log::info!(
            "rendering with {} ({:?}), surface format {:?}",
            gpu.adapter_info().name,
            gpu.adapter_info().backend,
            gpu.surface_format()
        );

        Ok(SurfaceContext { pending: None, gpu })
    }

    fn compile_shaders(&mut self, context: &SurfaceContext) -> Result<Pipelines> {
        Pipelines::new(context.gpu.device(), context.gpu.surface_format())
    }

    fn allocate_targets(
        &mut self,
        context: &SurfaceContext,
        shaders: &Pipelines,
        info: &VideoInfo,
    ) -> Result<FrameTargets> {
        FrameTargets::new(
            context.gpu.device(),
            shaders,
            info.width,
            info.height,
            context.gpu.max_texture_dimension(),
        )
        .context("failed to allocate frame targets")
    }

    fn convert(
        &mut self,
        context: &mut SurfaceContext,
        shaders: &Pipelines,
        targets: &FrameTargets,
        planes: &Planes<'_>,
        info: &VideoInfo,
    ) -> Result<()> {
        render::convert_frame(&context.gpu, shaders, targets, planes, info.line_height());
        Ok(())
    }

    fn composite(
        &mut self,
        context: &mut SurfaceContext,
        shaders: &Pipelines,
        targets: &FrameTargets,
        plan: &CompositePlan,
    ) -> Result<()> {
        context.pending = render::composite_frame(&mut context.gpu, shaders, targets, plan)?;
        Ok(())
    }

    fn present(&mut self, window: &NativeWindow, context: &mut SurfaceContext) -> Result<()> {
        if let Some(texture) = context.pending.take() {
            window.pre_present_notify();
            texture.present();
        }
        Ok(())
    }

    fn resize(&mut self, context: &mut SurfaceContext, size: SurfaceSize) {
        context.gpu.resize(size);
    }

    fn pump_events(&mut self, display: &mut Display, _window: &NativeWindow) -> Vec<SurfaceEvent> {
        display.pump()
    }

    fn window_handle(&self, window: &NativeWindow) -> Result<WindowHandle> {
        window.handle()
    }

    fn window_size(&self, window: &NativeWindow) -> SurfaceSize {
        window.size()
    }

    #[cfg(target_os = "linux")]
    fn release_leaked_descriptors(&mut self) {
        let report = LeakedFdSweep::for_current_process().run();
        if !report.closed.is_empty() {
            log::info!("closed {} leaked driver descriptors", report.closed.len());
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn release_leaked_descriptors(&mut self) {}
}
