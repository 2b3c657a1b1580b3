use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::context::{Platform, RenderError, Session, SetupError};
use crate::format::Frame;
use crate::sink::SinkError;
use crate::window::WindowHandle;

use super::{handoff, Completion, FrameSource, Outcome, Shared, Submitter, Wait};

const THREAD_NAME: &str = "yuvsink-render";

/// Asks the render thread to set up a session and draw from `source`.
struct RunRequest {
    adopt: Option<WindowHandle>,
    source: FrameSource,
    ready: Sender<Result<WindowHandle, SetupError>>,
    /// Dropped once the session is torn down.
    finished: Sender<()>,
}

struct ActiveRun {
    submitter: Submitter,
    finished: Receiver<()>,
}

/// The render thread.
///
/// One thread serves every start/stop cycle of a sink: each run sets up a
/// fresh session (window, context, shaders, targets) and tears it down when
/// it ends, while thread-bound native state such as the event loop stays on
/// the thread. Dropping the handle ends any run and joins the thread.
pub struct RenderThread {
    requests: Option<Sender<RunRequest>>,
    active: Option<ActiveRun>,
    join: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Spawns an idle render thread.
    pub fn spawn<P: Platform + Clone>(
        platform: P,
        shared: Arc<Shared>,
        poll: Duration,
    ) -> Result<Self, SinkError> {
        let (requests_tx, requests_rx) = unbounded::<RunRequest>();

        let join = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || {
                for request in requests_rx.iter() {
                    serve(platform.clone(), request, &shared, poll);
                }
                log::debug!("render thread exiting");
            })
            .map_err(SinkError::Spawn)?;

        Ok(Self {
            requests: Some(requests_tx),
            active: None,
            join: Some(join),
        })
    }

    /// Starts a run and blocks until its graphics context is set up.
    ///
    /// Returns the handle of the window in use: `adopt` itself, or the
    /// handle of the window the thread created. A run still in progress is
    /// ended first.
    pub fn begin(&mut self, adopt: Option<WindowHandle>) -> Result<WindowHandle, SinkError> {
        self.end();

        let requests = self.requests.as_ref().ok_or(SinkError::RenderThreadExited)?;
        let (submitter, source) = handoff();
        let (ready_tx, ready_rx) = bounded(1);
        let (finished_tx, finished_rx) = bounded(1);

        requests
            .send(RunRequest {
                adopt,
                source,
                ready: ready_tx,
                finished: finished_tx,
            })
            .map_err(|_| SinkError::RenderThreadExited)?;

        match ready_rx.recv() {
            Ok(Ok(handle)) => {
                log::debug!("render thread ready");
                self.active = Some(ActiveRun {
                    submitter,
                    finished: finished_rx,
                });
                Ok(handle)
            }
            Ok(Err(e)) => Err(SinkError::Setup(e)),
            // The thread died before reporting.
            Err(_) => Err(SinkError::RenderThreadExited),
        }
    }

    /// `true` between a successful [`begin`](Self::begin) and
    /// [`end`](Self::end), even if the run stopped on a fatal error.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Hands one frame to the current run and waits for it to be drawn.
    pub fn submit(&mut self, frame: Frame) -> Result<Completion, SinkError> {
        let active = self.active.as_mut().ok_or(SinkError::RenderThreadExited)?;
        active
            .submitter
            .submit(frame)
            .map_err(|_| SinkError::RenderThreadExited)
    }

    /// Ends the current run and waits for its teardown. No-op when idle.
    pub fn end(&mut self) {
        let Some(ActiveRun { submitter, finished }) = self.active.take() else {
            return;
        };

        // Closing the submitter wakes the loop with `Closed`.
        drop(submitter);
        let _ = finished.recv();
        log::debug!("render run finished");
    }

    /// Ends any run and joins the thread. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        self.end();
        self.requests = None;

        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("render thread panicked");
            }
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn serve<P: Platform>(platform: P, request: RunRequest, shared: &Shared, poll: Duration) {
    let RunRequest {
        adopt,
        source,
        ready,
        finished,
    } = request;

    let session = match Session::establish(platform, adopt, shared.state().clone()) {
        Ok(session) => session,
        Err(e) => {
            log::error!("render thread setup failed: {e:#}");
            let _ = ready.send(Err(e));
            return;
        }
    };

    let _ = ready.send(Ok(session.window_handle()));
    drive(session, source, shared, poll);
    drop(finished);
}

/// Runs one session until the submitter closes or a fatal error occurs.
/// The session is torn down on return.
fn drive<P: Platform>(mut session: Session<P>, source: FrameSource, shared: &Shared, poll: Duration) {
    loop {
        if let Err(e) = session.handle_events(shared.take_pending_resize()) {
            if e.is_fatal() {
                log::error!("redraw after resize failed: {e:#}");
                break;
            }
            log::warn!("redraw after resize failed: {e}");
        }

        let pending = match source.wait(poll) {
            Wait::Frame(pending) => pending,
            Wait::Idle => continue,
            Wait::Closed => break,
        };

        if !shared.is_running() {
            log::debug!("stop requested; frame skipped");
            continue;
        }

        let Some(info) = shared.video() else {
            pending.complete(Outcome::Failed(RenderError::NoFormat));
            continue;
        };
        let settings = shared.settings();

        match session.draw(pending.frame(), &info, settings.crop) {
            Ok(()) => pending.complete(Outcome::Presented),
            Err(e) if e.is_fatal() => {
                log::error!("render failed, ending the run: {e:#}");
                pending.complete(Outcome::Failed(e));
                break;
            }
            Err(e) => {
                log::warn!("frame not drawn: {e}");
                pending.complete(Outcome::Failed(e));
            }
        }
    }
}
