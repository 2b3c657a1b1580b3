use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::{ContextState, Platform, WgpuPlatform};
use crate::coords::SurfaceSize;
use crate::format::{FormatError, Frame, VideoFormat, VideoInfo};
use crate::thread::{Outcome, RenderThread, Settings, Shared};
use crate::window::WindowHandle;

use super::{SinkConfig, SinkController, SinkError};

type PrepareFn = Box<dyn FnMut(&SinkController) + Send>;
type AnnounceFn = Box<dyn FnMut(WindowHandle) + Send>;

/// Threaded I420 video sink.
///
/// The delivery thread calls [`preroll`](Self::preroll) and
/// [`render`](Self::render), which block until the frame is on screen. All
/// window and GPU work happens on a render thread. The first submission
/// after [`start`](Self::start) sets up a graphics session there, and
/// [`stop`](Self::stop) tears it down again. The thread itself lives as long
/// as the sink.
pub struct Sink<P: Platform + Clone = WgpuPlatform> {
    platform: P,
    shared: Arc<Shared>,
    poll: Duration,
    thread: Option<RenderThread>,
    /// Frames dropped since the last start.
    dropped: u32,
    prepare: Option<PrepareFn>,
    announce: Option<AnnounceFn>,
}

impl Sink {
    /// Creates a sink backed by winit and wgpu.
    pub fn new(config: SinkConfig) -> Self {
        let platform = WgpuPlatform::new(config.window.clone(), config.gpu.clone());
        Self::with_platform(platform, config)
    }
}

impl<P: Platform + Clone> Sink<P> {
    pub fn with_platform(platform: P, config: SinkConfig) -> Self {
        let settings = Settings {
            crop: config.crop,
            drop_first: config.drop_first,
            verbose: config.verbose,
        };

        Self {
            platform,
            shared: Arc::new(Shared::new(settings)),
            poll: config.event_poll_interval,
            thread: None,
            dropped: 0,
            prepare: None,
            announce: None,
        }
    }

    /// A handle for changing settings from other threads.
    pub fn controller(&self) -> SinkController {
        SinkController::new(self.shared.clone())
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Arms the sink. The render session is set up by the first submission.
    pub fn start(&mut self) {
        if self.shared.is_running() {
            return;
        }
        log::debug!("sink started");
        self.dropped = 0;
        self.shared.set_running(true);
    }

    /// Stops drawing and ends the render session.
    ///
    /// Returns after the graphics context is torn down. Clears the
    /// negotiated format and forgets a window this sink created; an adopted
    /// handle is kept for the next start.
    pub fn stop(&mut self) {
        self.shared.set_running(false);

        if let Some(thread) = self.thread.as_mut() {
            thread.end();
        }

        self.shared.set_video(None);
        self.shared.take_pending_resize();

        let mut slot = self.shared.window.lock();
        if !slot.external {
            slot.handle = None;
        }
    }

    pub fn is_started(&self) -> bool {
        self.shared.is_running()
    }

    /// Validates and stores the stream format for the following frames.
    pub fn set_format(&mut self, format: &VideoFormat) -> Result<VideoInfo, FormatError> {
        let info = match VideoInfo::negotiate(format) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("format rejected: {e}");
                return Err(e);
            }
        };

        log::debug!(
            "negotiated {}x{} (display width {}, aspect {}:{})",
            info.width,
            info.height,
            info.display_width,
            info.display_ratio.0,
            info.display_ratio.1
        );
        self.shared.set_video(Some(info));
        Ok(info)
    }

    pub fn video_info(&self) -> Option<VideoInfo> {
        self.shared.video()
    }

    // ── submission ────────────────────────────────────────────────────────

    /// Draws the first frame of a stream before playback.
    pub fn preroll(&mut self, frame: Frame) -> Result<Frame, SinkError> {
        self.submit_frame(frame)
    }

    /// Draws one frame during playback.
    pub fn render(&mut self, frame: Frame) -> Result<Frame, SinkError> {
        self.submit_frame(frame)
    }

    /// Hands `frame` to the render thread and blocks until it is presented,
    /// then returns the buffer.
    ///
    /// The render session is set up on the first call after `start`, before
    /// any leading frames are dropped. Returns the frame undrawn if a stop
    /// was requested while it was being handed over.
    pub fn submit_frame(&mut self, frame: Frame) -> Result<Frame, SinkError> {
        if !self.shared.is_running() {
            return Err(SinkError::NotStarted);
        }

        self.ensure_session()?;

        let settings = self.shared.settings();
        if self.dropped < settings.drop_first {
            self.dropped += 1;
            log::debug!("dropping frame {} of {}", self.dropped, settings.drop_first);
            return Ok(frame);
        }

        let Some(thread) = self.thread.as_mut() else {
            return Err(SinkError::RenderThreadExited);
        };

        let started = Instant::now();
        let completion = thread.submit(frame)?;

        match completion.outcome {
            Outcome::Presented => {
                let ms = started.elapsed().as_millis();
                if settings.verbose {
                    log::info!("Render took {ms} ms");
                } else {
                    log::debug!("Render took {ms} ms");
                }
                Ok(completion.frame)
            }
            Outcome::Skipped => {
                log::debug!("frame skipped: stop requested");
                Ok(completion.frame)
            }
            Outcome::Failed(e) => Err(SinkError::Render(e)),
        }
    }

    fn ensure_session(&mut self) -> Result<(), SinkError> {
        if self.thread.as_ref().is_some_and(RenderThread::is_active) {
            return Ok(());
        }

        if self.adoptable_handle().is_none() {
            if let Some(prepare) = self.prepare.as_mut() {
                log::debug!("no window handle set; asking the application for one");
                prepare(&SinkController::new(self.shared.clone()));
            }
        }
        let adopt = self.adoptable_handle();

        if self.thread.is_none() {
            let thread = RenderThread::spawn(self.platform.clone(), self.shared.clone(), self.poll)?;
            self.thread = Some(thread);
        }
        let Some(thread) = self.thread.as_mut() else {
            return Err(SinkError::RenderThreadExited);
        };
        let handle = thread.begin(adopt)?;

        {
            let mut slot = self.shared.window.lock();
            slot.handle = Some(handle);
            slot.external = adopt.is_some();
        }

        if let Some(announce) = self.announce.as_mut() {
            announce(handle);
        }
        Ok(())
    }

    fn adoptable_handle(&self) -> Option<WindowHandle> {
        let slot = self.shared.window.lock();
        slot.handle.filter(|_| slot.external)
    }

    // ── settings ──────────────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.shared.settings()
    }

    pub fn set_crop_top(&self, pixels: u32) {
        self.controller().set_crop_top(pixels);
    }

    pub fn set_crop_bottom(&self, pixels: u32) {
        self.controller().set_crop_bottom(pixels);
    }

    pub fn set_crop_left(&self, pixels: u32) {
        self.controller().set_crop_left(pixels);
    }

    pub fn set_crop_right(&self, pixels: u32) {
        self.controller().set_crop_right(pixels);
    }

    pub fn crop_top(&self) -> u32 {
        self.settings().crop.top
    }

    pub fn crop_bottom(&self) -> u32 {
        self.settings().crop.bottom
    }

    pub fn crop_left(&self) -> u32 {
        self.settings().crop.left
    }

    pub fn crop_right(&self) -> u32 {
        self.settings().crop.right
    }

    pub fn set_drop_first(&self, frames: u32) {
        self.controller().set_drop_first(frames);
    }

    pub fn drop_first(&self) -> u32 {
        self.settings().drop_first
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.controller().set_verbose(verbose);
    }

    pub fn verbose(&self) -> bool {
        self.settings().verbose
    }

    // ── window ────────────────────────────────────────────────────────────

    /// See [`SinkController::set_window_handle`].
    pub fn set_window_handle(&self, handle: WindowHandle) -> Result<(), SinkError> {
        self.controller().set_window_handle(handle)
    }

    pub fn window_handle(&self) -> Option<WindowHandle> {
        self.controller().window_handle()
    }

    /// Called before the render thread starts when no handle is set. The
    /// callback may provide one through the controller it receives.
    pub fn on_prepare_window_handle(&mut self, f: impl FnMut(&SinkController) + Send + 'static) {
        self.prepare = Some(Box::new(f));
    }

    /// Called once per start with the handle of the window in use.
    pub fn on_window_handle(&mut self, f: impl FnMut(WindowHandle) + Send + 'static) {
        self.announce = Some(Box::new(f));
    }

    pub fn notify_window_resized(&self, size: SurfaceSize) {
        self.controller().notify_window_resized(size);
    }

    pub fn context_state(&self) -> ContextState {
        self.shared.state().get()
    }
}

impl<P: Platform + Clone> Drop for Sink<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::context::mock::{Call, MockPlatform, Step};
    use crate::context::{RenderError, SetupStage};
    use crate::coords::{Crop, PixelRect};
    use crate::format::PlaneLayout;

    fn config() -> SinkConfig {
        SinkConfig {
            event_poll_interval: Duration::from_millis(5),
            ..SinkConfig::default()
        }
    }

    fn started(mock: &MockPlatform, config: SinkConfig) -> Sink<MockPlatform> {
        let mut sink = Sink::with_platform(mock.clone(), config);
        sink.start();
        sink
    }

    fn frame(w: u32, h: u32) -> Frame {
        Frame::for_layout(PlaneLayout::i420(w, h))
    }

    #[test]
    fn first_three_frames_dropped_fourth_drawn() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = started(&mock, SinkConfig { drop_first: 3, ..config() });
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();

        sink.preroll(frame(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();
        assert_eq!(journal.count(&Call::Convert), 0);
        // The session exists even though nothing was drawn.
        assert_eq!(sink.context_state(), ContextState::ShadersReady);

        sink.render(frame(64, 48)).unwrap();
        assert_eq!(journal.count(&Call::Convert), 1);
        assert_eq!(journal.count(&Call::Present), 1);
    }

    #[test]
    fn drop_counter_resets_on_start() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = started(&mock, SinkConfig { drop_first: 1, ..config() });
        let format = VideoFormat::i420(64, 48);

        sink.set_format(&format).unwrap();
        sink.render(frame(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();
        assert_eq!(journal.count(&Call::Convert), 1);

        sink.stop();
        sink.start();
        sink.set_format(&format).unwrap();
        sink.render(frame(64, 48)).unwrap();
        assert_eq!(journal.count(&Call::Convert), 1);
        sink.render(frame(64, 48)).unwrap();
        assert_eq!(journal.count(&Call::Convert), 2);
    }

    #[test]
    fn stop_while_waiting_tears_down() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = started(&mock, config());
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();

        sink.stop();
        assert_eq!(sink.context_state(), ContextState::TornDown);
        assert_eq!(journal.calls().last(), Some(&Call::Sweep));
        assert_eq!(journal.count(&Call::DestroyWindow), 1);
        assert_eq!(sink.video_info(), None);
        assert_eq!(sink.window_handle(), None);
    }

    #[test]
    fn restart_reuses_the_display_thread() {
        let mock = MockPlatform::new().one_shot_display();
        let journal = mock.journal();
        let mut sink = Sink::with_platform(mock, config());
        let format = VideoFormat::i420(64, 48);

        for cycle in 1..=2 {
            sink.start();
            sink.set_format(&format).unwrap();
            sink.render(frame(64, 48)).unwrap();
            sink.stop();

            assert_eq!(sink.context_state(), ContextState::TornDown);
            assert_eq!(journal.count(&Call::Attempt(Step::OpenDisplay)), cycle);
            assert_eq!(journal.count(&Call::CloseDisplay), cycle);
            assert_eq!(journal.count(&Call::Convert), cycle);
        }
    }

    #[test]
    fn stop_requested_from_another_thread_skips_the_frame() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = started(&mock, config());
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();

        // Runs after the session is up and before the frame is handed over.
        let controller = sink.controller();
        sink.on_window_handle(move |_| {
            std::thread::scope(|s| {
                s.spawn(|| controller.request_stop());
            });
        });

        let returned = sink.render(frame(64, 48)).unwrap();
        assert_eq!(returned.len(), PlaneLayout::i420(64, 48).total_len());
        assert_eq!(journal.count(&Call::Convert), 0);
        assert_eq!(journal.count(&Call::Present), 0);
        assert!(!sink.is_started());

        assert!(matches!(sink.render(frame(64, 48)), Err(SinkError::NotStarted)));
        sink.stop();
        assert_eq!(sink.context_state(), ContextState::TornDown);
    }

    #[test]
    fn adopted_handle_skips_window_creation_and_is_announced_once() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let handle = MockPlatform::external_handle(42, SurfaceSize::new(640, 360));
        let announced = Arc::new(Mutex::new(Vec::new()));

        let mut sink = started(&mock, config());
        sink.set_window_handle(handle).unwrap();
        {
            let announced = announced.clone();
            sink.on_window_handle(move |h| announced.lock().push(h));
        }
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();

        sink.render(frame(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();

        assert_eq!(journal.count(&Call::Attempt(Step::CreateWindow)), 0);
        assert_eq!(journal.count(&Call::Attempt(Step::AdoptWindow)), 1);
        assert_eq!(*announced.lock(), vec![handle]);

        sink.stop();
        assert_eq!(journal.count(&Call::DetachWindow), 1);
        assert_eq!(journal.count(&Call::DestroyWindow), 0);
        assert_eq!(sink.window_handle(), Some(handle));
    }

    #[test]
    fn second_window_handle_is_rejected() {
        let mock = MockPlatform::new();
        let sink = started(&mock, config());
        let first = MockPlatform::external_handle(1, SurfaceSize::new(320, 240));
        let second = MockPlatform::external_handle(2, SurfaceSize::new(320, 240));

        sink.set_window_handle(first).unwrap();
        assert!(matches!(sink.set_window_handle(second), Err(SinkError::WindowHandleInUse)));
        assert_eq!(sink.window_handle(), Some(first));
    }

    #[test]
    fn prepare_callback_can_provide_a_handle() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let handle = MockPlatform::external_handle(9, SurfaceSize::new(320, 240));
        let prepared = Arc::new(AtomicUsize::new(0));

        let mut sink = started(&mock, config());
        {
            let prepared = prepared.clone();
            sink.on_prepare_window_handle(move |controller| {
                prepared.fetch_add(1, Ordering::SeqCst);
                controller.set_window_handle(handle).unwrap();
            });
        }
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();
        sink.render(frame(64, 48)).unwrap();

        assert_eq!(prepared.load(Ordering::SeqCst), 1);
        assert_eq!(journal.count(&Call::Attempt(Step::AdoptWindow)), 1);
    }

    #[test]
    fn setup_failure_surfaces_from_first_submission() {
        let mock = MockPlatform::new().fail_at(Step::CompileShaders);
        let mut sink = started(&mock, config());
        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();

        match sink.render(frame(64, 48)) {
            Err(SinkError::Setup(e)) => assert_eq!(e.stage, SetupStage::Shaders),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sink.context_state(), ContextState::TornDown);
    }

    #[test]
    fn render_without_format_is_a_frame_error() {
        let mock = MockPlatform::new();
        let mut sink = started(&mock, config());

        assert!(matches!(
            sink.render(frame(64, 48)),
            Err(SinkError::Render(RenderError::NoFormat))
        ));

        sink.set_format(&VideoFormat::i420(64, 48)).unwrap();
        assert!(sink.render(frame(64, 48)).is_ok());
    }

    #[test]
    fn render_before_start_is_rejected() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = Sink::with_platform(mock, config());

        assert!(matches!(sink.render(frame(64, 48)), Err(SinkError::NotStarted)));
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn crop_setters_apply_to_the_next_frame() {
        let mock = MockPlatform::new();
        let journal = mock.journal();
        let mut sink = started(&mock, config());
        sink.set_format(&VideoFormat::i420(720, 576)).unwrap();

        sink.render(frame(720, 576)).unwrap();
        assert_eq!(journal.count(&Call::Composite(PixelRect::new(0, 0, 720, 576))), 1);

        sink.set_crop_top(72);
        sink.set_crop_bottom(72);
        assert_eq!(sink.settings().crop, Crop::new(72, 72, 0, 0));

        // 720x432 letterboxed into 720x576.
        sink.render(frame(720, 576)).unwrap();
        assert_eq!(journal.count(&Call::Composite(PixelRect::new(0, 72, 720, 432))), 1);
    }
}
