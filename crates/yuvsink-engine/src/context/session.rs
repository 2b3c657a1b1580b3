use crate::coords::{Crop, SurfaceGeometry, SurfaceSize};
use crate::format::{Frame, PlaneLayout, VideoInfo};
use crate::window::{SurfaceEvent, WindowHandle};

use super::{ContextState, Platform, RenderError, SetupError, SetupStage, StateCell};

/// Owns the platform and runs the descriptor sweep once everything else
/// has been released.
struct Sweeper<P: Platform> {
    platform: P,
    state: StateCell,
}

impl<P: Platform> Drop for Sweeper<P> {
    fn drop(&mut self) {
        self.platform.release_leaked_descriptors();
        self.state.set(ContextState::TornDown);
    }
}

struct SizedTargets<T> {
    targets: T,
    width: u32,
    height: u32,
}

/// All graphics resources of one render-thread run.
///
/// Fields are declared in release order, the reverse of acquisition, so
/// dropping a session tears the context down correctly.
pub struct Session<P: Platform> {
    targets: Option<SizedTargets<P::Targets>>,
    shaders: P::Shaders,
    context: P::Context,
    window: P::Window,
    display: P::Display,
    sweeper: Sweeper<P>,

    handle: WindowHandle,
    external: bool,
    window_size: SurfaceSize,
    /// Format and crop of the frame currently held in the offscreen target.
    converted: Option<(VideoInfo, Crop)>,
}

impl<P: Platform> Session<P> {
    /// Runs display -> window -> context -> shaders.
    ///
    /// On failure, whatever was acquired is released in reverse order (each
    /// step's result is a local, dropped on the early return) and the sweep
    /// runs last.
    pub fn establish(
        platform: P,
        adopt: Option<WindowHandle>,
        state: StateCell,
    ) -> Result<Self, SetupError> {
        let mut sweeper = Sweeper { platform, state };
        let platform = &mut sweeper.platform;

        log::debug!("opening display");
        let mut display = platform.open_display().map_err(SetupError::at(SetupStage::Display))?;

        let external = adopt.is_some();
        let window = match adopt {
            Some(handle) => platform.adopt_window(&mut display, handle),
            None => platform.create_window(&mut display),
        }
        .map_err(SetupError::at(SetupStage::Window))?;

        let handle = platform.window_handle(&window).map_err(SetupError::at(SetupStage::Window))?;
        let window_size = platform.window_size(&window);
        sweeper.state.set(ContextState::WindowReady);

        log::debug!("creating graphics context");
        let context = sweeper
            .platform
            .create_context(&display, &window)
            .map_err(SetupError::at(SetupStage::Context))?;
        sweeper.state.set(ContextState::ContextReady);

        log::debug!("compiling shaders");
        let shaders = sweeper
            .platform
            .compile_shaders(&context)
            .map_err(SetupError::at(SetupStage::Shaders))?;
        sweeper.state.set(ContextState::ShadersReady);

        Ok(Self {
            targets: None,
            shaders,
            context,
            window,
            display,
            sweeper,
            handle,
            external,
            window_size,
            converted: None,
        })
    }

    /// Handle of the window in use, adopted or created.
    pub fn window_handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    pub fn window_size(&self) -> SurfaceSize {
        self.window_size
    }

    /// Uploads, converts, composites and presents one frame.
    pub fn draw(&mut self, frame: &Frame, info: &VideoInfo, crop: Crop) -> Result<(), RenderError> {
        self.ensure_targets(info)?;

        let planes = PlaneLayout::i420(info.width, info.height).split(frame.as_bytes())?;

        let Some(sized) = self.targets.as_ref() else {
            return Err(RenderError::NoFormat);
        };

        self.sweeper
            .platform
            .convert(&mut self.context, &self.shaders, &sized.targets, &planes, info)
            .map_err(RenderError::Gpu)?;
        self.converted = Some((*info, crop));

        self.composite_and_present()
    }

    /// Drains native events plus an externally reported resize.
    ///
    /// A resize reconfigures the surface and re-runs pass 2 from the last
    /// converted frame.
    pub fn handle_events(&mut self, external_resize: Option<SurfaceSize>) -> Result<(), RenderError> {
        let mut events = self.sweeper.platform.pump_events(&mut self.display, &self.window);
        if let Some(size) = external_resize {
            events.push(SurfaceEvent::Resized(size));
        }

        let mut resized = false;
        for event in events {
            match event {
                SurfaceEvent::Resized(size) => {
                    self.window_size = size;
                    self.sweeper.platform.resize(&mut self.context, size);
                    resized = true;
                }
                SurfaceEvent::CloseRequested => {
                    log::info!("window close requested; the sink keeps rendering until stopped");
                }
            }
        }

        if resized && self.converted.is_some() && !self.window_size.is_empty() {
            log::debug!("redrawing at {}x{}", self.window_size.width, self.window_size.height);
            self.composite_and_present()?;
        }
        Ok(())
    }

    fn ensure_targets(&mut self, info: &VideoInfo) -> Result<(), RenderError> {
        if let Some(sized) = &self.targets {
            if sized.width == info.width && sized.height == info.height {
                return Ok(());
            }
            log::debug!(
                "video size changed {}x{} -> {}x{}; reallocating frame targets",
                sized.width,
                sized.height,
                info.width,
                info.height
            );
        }

        // Release the old set before allocating its replacement.
        self.targets = None;
        self.converted = None;

        let targets = self
            .sweeper
            .platform
            .allocate_targets(&self.context, &self.shaders, info)
            .map_err(|e| RenderError::Targets(SetupError::new(SetupStage::Targets, e)))?;

        self.targets = Some(SizedTargets {
            targets,
            width: info.width,
            height: info.height,
        });
        self.sweeper.state.set(ContextState::FrameTargetsReady);
        Ok(())
    }

    fn composite_and_present(&mut self) -> Result<(), RenderError> {
        let (Some(sized), Some((info, crop))) = (self.targets.as_ref(), self.converted) else {
            return Ok(());
        };

        let geometry = SurfaceGeometry {
            video_width: info.display_width,
            video_height: info.height,
            crop,
            window_width: self.window_size.width,
            window_height: self.window_size.height,
        };
        let plan = geometry.plan();

        let platform = &mut self.sweeper.platform;
        platform
            .composite(&mut self.context, &self.shaders, &sized.targets, &plan)
            .map_err(RenderError::Gpu)?;
        platform
            .present(&self.window, &mut self.context)
            .map_err(RenderError::Gpu)
    }
}
