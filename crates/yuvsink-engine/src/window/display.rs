use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use super::{SurfaceEvent, WindowConfig, WindowHandle};
use crate::coords::SurfaceSize;
use crate::device::AdoptedTarget;

/// Pump iterations allowed for the window to appear after a create request.
const CREATE_ATTEMPTS: u32 = 100;
const CREATE_POLL: Duration = Duration::from_millis(10);

thread_local! {
    /// Event loop of the last closed display on this thread.
    static PARKED: RefCell<Option<EventLoop<()>>> = const { RefCell::new(None) };
}

/// The native display connection: a `winit` EventLoop driven by pumping.
///
/// winit permits one EventLoop per process and ties it to the thread that
/// built it. Closing a display parks its loop on that thread, and the next
/// `open` there picks it up again, so the render thread can cycle through
/// any number of sessions.
pub struct Display {
    /// `None` only while being parked.
    event_loop: Option<EventLoop<()>>,
    pump: Pump,
}

#[derive(Default)]
struct Pump {
    request: Option<WindowConfig>,
    created: Option<Result<Arc<Window>>>,
    tracked: Option<WindowId>,
    events: Vec<SurfaceEvent>,
}

impl Pump {
    fn create_requested(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.request.take() else { return };

        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let created = event_loop
            .create_window(attrs)
            .map(Arc::new)
            .context("failed to create window");

        if let Ok(window) = &created {
            self.tracked = Some(window.id());
        }
        self.created = Some(created);
    }
}

impl ApplicationHandler for Pump {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_requested(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_requested(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.tracked != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::Resized(size) => {
                log::debug!("window resized to {}x{}", size.width, size.height);
                self.events.push(SurfaceEvent::Resized(size.into()));
            }
            WindowEvent::CloseRequested => self.events.push(SurfaceEvent::CloseRequested),
            _ => {}
        }
    }
}

impl Display {
    /// Opens the display connection on the calling thread.
    pub fn open() -> Result<Self> {
        let event_loop = match PARKED.with(|parked| parked.borrow_mut().take()) {
            Some(event_loop) => {
                log::debug!("display connection reopened");
                event_loop
            }
            None => {
                let event_loop = build_event_loop().context(
                    "failed to open display connection (one winit event loop per process)",
                )?;
                log::debug!("display connection opened");
                event_loop
            }
        };

        Ok(Self {
            event_loop: Some(event_loop),
            pump: Pump::default(),
        })
    }

    /// Creates a top-level window and waits for the platform to map it.
    pub fn create_window(&mut self, config: &WindowConfig) -> Result<Arc<Window>> {
        self.pump.request = Some(config.clone());

        for _ in 0..CREATE_ATTEMPTS {
            self.pump_once(CREATE_POLL)?;
            if let Some(created) = self.pump.created.take() {
                return created;
            }
        }

        self.pump.request = None;
        bail!("window did not appear after {CREATE_ATTEMPTS} event pumps")
    }

    /// Dispatches pending native events without blocking and returns the
    /// ones relevant to the tracked window.
    pub fn pump(&mut self) -> Vec<SurfaceEvent> {
        if let Err(e) = self.pump_once(Duration::ZERO) {
            log::warn!("{e:#}");
        }
        std::mem::take(&mut self.pump.events)
    }

    pub fn raw_display_handle(&self) -> Result<RawDisplayHandle> {
        let handle = self
            .event_loop
            .as_ref()
            .context("display is closed")?
            .display_handle()
            .context("display handle unavailable")?;
        Ok(handle.as_raw())
    }

    fn pump_once(&mut self, timeout: Duration) -> Result<()> {
        let event_loop = self.event_loop.as_mut().context("display is closed")?;
        match event_loop.pump_app_events(Some(timeout), &mut self.pump) {
            PumpStatus::Continue => Ok(()),
            PumpStatus::Exit(code) => bail!("event loop exited with code {code}"),
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        log::debug!("closing display connection");
        if let Some(event_loop) = self.event_loop.take() {
            // Fails only during thread exit, when the loop goes anyway.
            let _ = PARKED.try_with(|parked| *parked.borrow_mut() = Some(event_loop));
        }
    }
}

#[cfg(target_os = "linux")]
fn build_event_loop() -> Result<EventLoop<()>, EventLoopError> {
    use winit::platform::wayland::EventLoopBuilderExtWayland;
    use winit::platform::x11::EventLoopBuilderExtX11;

    // The render thread is never the main thread.
    let mut builder = EventLoop::builder();
    if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    } else {
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    builder.build()
}

#[cfg(target_os = "windows")]
fn build_event_loop() -> Result<EventLoop<()>, EventLoopError> {
    use winit::platform::windows::EventLoopBuilderExtWindows;

    let mut builder = EventLoop::builder();
    builder.with_any_thread(true);
    builder.build()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn build_event_loop() -> Result<EventLoop<()>, EventLoopError> {
    EventLoop::new()
}

/// The window frames are presented to.
pub enum NativeWindow {
    /// Created by [`Display::create_window`]; destroyed on drop.
    Owned(Arc<Window>),
    /// Supplied by the embedding application; only detached on drop.
    Adopted { target: AdoptedTarget, size: SurfaceSize },
}

impl NativeWindow {
    pub fn adopt(display: &Display, handle: WindowHandle) -> Result<Self> {
        let target = AdoptedTarget {
            window: handle.raw,
            display: display.raw_display_handle()?,
        };
        log::debug!("adopting external window {:?}", handle.raw);
        Ok(Self::Adopted { target, size: handle.size })
    }

    pub fn size(&self) -> SurfaceSize {
        match self {
            Self::Owned(window) => window.inner_size().into(),
            Self::Adopted { size, .. } => *size,
        }
    }

    pub fn handle(&self) -> Result<WindowHandle> {
        match self {
            Self::Owned(window) => {
                let raw = window
                    .window_handle()
                    .context("window handle unavailable")?
                    .as_raw();
                Ok(WindowHandle::new(raw, self.size()))
            }
            Self::Adopted { target, size } => Ok(WindowHandle::new(target.window, *size)),
        }
    }

    /// Tells the platform a frame for this window is about to be presented.
    pub fn pre_present_notify(&self) {
        if let Self::Owned(window) = self {
            window.pre_present_notify();
        }
    }
}

impl Drop for NativeWindow {
    fn drop(&mut self) {
        match self {
            Self::Owned(_) => log::debug!("destroying window"),
            Self::Adopted { .. } => log::debug!("detaching from external window"),
        }
    }
}
