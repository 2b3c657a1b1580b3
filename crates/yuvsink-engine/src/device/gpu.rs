use std::sync::Arc;

use anyhow::{Context, Result};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle,
};
use wgpu::SurfaceError;
use winit::window::Window;

use super::{surface, GpuConfig, SurfaceRecovery};
use crate::coords::SurfaceSize;

/// Raw handles of a window owned by the embedding application.
#[derive(Debug, Copy, Clone)]
pub struct AdoptedTarget {
    pub window: RawWindowHandle,
    pub display: RawDisplayHandle,
}

impl HasWindowHandle for AdoptedTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        // SAFETY: validity is guaranteed by the caller of `GpuContext::for_adopted`.
        Ok(unsafe { WindowHandle::borrow_raw(self.window) })
    }
}

impl HasDisplayHandle for AdoptedTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        // SAFETY: as above.
        Ok(unsafe { DisplayHandle::borrow_raw(self.display) })
    }
}

/// Surface texture acquired for one composite pass, plus its encoder.
///
/// Holding the texture blocks acquisition of the next one; hand it back via
/// [`GpuContext::queue_present`] promptly.
pub struct SurfaceFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Owns wgpu core objects and the surface configuration.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates and configures the Surface (swapchain)
/// - acquires surface frames and submits command buffers
///
/// The surface is `'static`: an owned window is kept alive by the `Arc`
/// inside the surface, an adopted one by the embedding application.
pub struct GpuContext {
    /// Kept alive for the lifetime of the surface.
    _instance: wgpu::Instance,

    surface: wgpu::Surface<'static>,

    adapter: wgpu::Adapter,

    device: wgpu::Device,

    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: SurfaceSize,
}

impl GpuContext {
    /// Creates a GPU context presenting to a window this crate created.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn for_window(window: Arc<Window>, gpu: GpuConfig) -> Result<Self> {
        let size = SurfaceSize::from(window.inner_size());
        anyhow::ensure!(!size.is_empty(), "window has zero size");

        let instance = new_instance(gpu.backends);
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        Self::with_surface(instance, surface, size, gpu).await
    }

    /// Creates a GPU context presenting to an adopted window.
    ///
    /// # Safety
    ///
    /// Both handles in `target` must stay valid until the returned context
    /// is dropped.
    pub async unsafe fn for_adopted(
        target: AdoptedTarget,
        size: SurfaceSize,
        gpu: GpuConfig,
    ) -> Result<Self> {
        let instance = new_instance(gpu.backends);

        // SAFETY: forwarded to the caller.
        let raw = unsafe { wgpu::SurfaceTargetUnsafe::from_window(&target) }
            .context("adopted window handle is unusable")?;
        let surface = unsafe { instance.create_surface_unsafe(raw) }
            .context("failed to create wgpu surface for adopted window")?;

        let size = SurfaceSize::new(size.width.max(1), size.height.max(1));
        Self::with_surface(instance, surface, size, gpu).await
    }

    async fn with_surface(
        instance: wgpu::Instance,
        surface: wgpu::Surface<'static>,
        size: SurfaceSize,
        gpu: GpuConfig,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: gpu.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::debug!("using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("yuvsink device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, gpu.prefer_srgb)
            .context("no supported surface formats")?;

        let alpha_mode = surface::choose_alpha_mode(&surface_caps);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: gpu.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: gpu.frame_latency,
        };

        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            adapter,
            device,
            queue,
            config,
            size,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Largest width or height a 2D texture may have on this device.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Reconfigures the surface after a resize.
    pub fn resize(&mut self, new_size: SurfaceSize) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Creates an encoder for offscreen work.
    pub fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<SurfaceFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(SurfaceFrame {
            surface_texture,
            view,
            encoder: self.encoder("yuvsink composite encoder"),
        })
    }

    /// Submits the recorded commands and returns the texture to present.
    pub fn queue_present(&self, frame: SurfaceFrame) -> wgpu::SurfaceTexture {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture
    }

    /// Reconfigures the surface if `err` calls for it and says how to go on.
    pub fn recover(&mut self, err: SurfaceError) -> SurfaceRecovery {
        surface::recover(&self.surface, &self.device, &self.config, self.size, err)
    }
}

fn new_instance(backends: wgpu::Backends) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    })
}
