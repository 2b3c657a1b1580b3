//! Recording [`Platform`] for lifecycle tests.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use anyhow::{bail, Result};
use parking_lot::Mutex;
use raw_window_handle::{RawWindowHandle, XlibWindowHandle};

use super::Platform;
use crate::coords::{CompositePlan, PixelRect, SurfaceSize};
use crate::format::{Planes, VideoInfo};
use crate::window::{SurfaceEvent, WindowHandle};

/// Operations that can be made to fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    OpenDisplay,
    CreateWindow,
    AdoptWindow,
    CreateContext,
    CompileShaders,
    AllocateTargets,
    Convert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Attempt(Step),
    Convert,
    Composite(PixelRect),
    Present,
    Resize(SurfaceSize),
    ReleaseTargets,
    ReleaseShaders,
    ReleaseContext,
    DestroyWindow,
    DetachWindow,
    CloseDisplay,
    Sweep,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().clear();
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.0.lock().iter().filter(|c| *c == call).count()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EventQueue(Arc<Mutex<Vec<SurfaceEvent>>>);

impl EventQueue {
    pub(crate) fn push(&self, event: SurfaceEvent) {
        self.0.lock().push(event);
    }
}

/// Mock resource; records `release` when dropped.
pub(crate) struct Resource {
    journal: Journal,
    release: Call,
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.journal.push(self.release.clone());
    }
}

pub(crate) struct MockWindow {
    _resource: Resource,
    handle: WindowHandle,
}

#[derive(Debug, Clone)]
pub(crate) struct MockPlatform {
    journal: Journal,
    events: EventQueue,
    fail_at: Option<Step>,
    window_size: SurfaceSize,
    /// Set by `one_shot_display`: the thread that owns the only display.
    display_owner: Option<Arc<Mutex<Option<ThreadId>>>>,
}

impl MockPlatform {
    pub(crate) fn new() -> Self {
        Self {
            journal: Journal::default(),
            events: EventQueue::default(),
            fail_at: None,
            window_size: SurfaceSize::new(720, 576),
            display_owner: None,
        }
    }

    /// Models a display that can be created once per process and reopened
    /// only on the thread that created it.
    pub(crate) fn one_shot_display(mut self) -> Self {
        self.display_owner = Some(Arc::default());
        self
    }

    pub(crate) fn fail_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub(crate) fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub(crate) fn event_queue(&self) -> EventQueue {
        self.events.clone()
    }

    pub(crate) fn external_handle(id: u64, size: SurfaceSize) -> WindowHandle {
        WindowHandle::new(RawWindowHandle::Xlib(XlibWindowHandle::new(id as _)), size)
    }

    fn attempt(&self, step: Step) -> Result<()> {
        self.journal.push(Call::Attempt(step));
        if self.fail_at == Some(step) {
            bail!("injected failure at {step:?}");
        }
        Ok(())
    }

    fn resource(&self, release: Call) -> Resource {
        Resource {
            journal: self.journal.clone(),
            release,
        }
    }
}

impl Platform for MockPlatform {
    type Display = Resource;
    type Window = MockWindow;
    type Context = Resource;
    type Shaders = Resource;
    type Targets = Resource;

    fn open_display(&mut self) -> Result<Resource> {
        self.attempt(Step::OpenDisplay)?;
        if let Some(owner) = &self.display_owner {
            let current = thread::current().id();
            let mut owner = owner.lock();
            match *owner {
                None => *owner = Some(current),
                Some(id) if id == current => {}
                Some(_) => bail!("display can't be recreated"),
            }
        }
        Ok(self.resource(Call::CloseDisplay))
    }

    fn create_window(&mut self, _display: &mut Resource) -> Result<MockWindow> {
        self.attempt(Step::CreateWindow)?;
        Ok(MockWindow {
            _resource: self.resource(Call::DestroyWindow),
            handle: Self::external_handle(1, self.window_size),
        })
    }

    fn adopt_window(&mut self, _display: &mut Resource, handle: WindowHandle) -> Result<MockWindow> {
        self.attempt(Step::AdoptWindow)?;
        Ok(MockWindow {
            _resource: self.resource(Call::DetachWindow),
            handle,
        })
    }

    fn create_context(&mut self, _display: &Resource, _window: &MockWindow) -> Result<Resource> {
        self.attempt(Step::CreateContext)?;
        Ok(self.resource(Call::ReleaseContext))
    }

    fn compile_shaders(&mut self, _context: &Resource) -> Result<Resource> {
        self.attempt(Step::CompileShaders)?;
        Ok(self.resource(Call::ReleaseShaders))
    }

    fn allocate_targets(
        &mut self,
        _context: &Resource,
        _shaders: &Resource,
        _info: &VideoInfo,
    ) -> Result<Resource> {
        self.attempt(Step::AllocateTargets)?;
        Ok(self.resource(Call::ReleaseTargets))
    }

    fn convert(
        &mut self,
        _context: &mut Resource,
        _shaders: &Resource,
        _targets: &Resource,
        _planes: &Planes<'_>,
        _info: &VideoInfo,
    ) -> Result<()> {
        if self.fail_at == Some(Step::Convert) {
            bail!("injected failure at Convert");
        }
        self.journal.push(Call::Convert);
        Ok(())
    }

    fn composite(
        &mut self,
        _context: &mut Resource,
        _shaders: &Resource,
        _targets: &Resource,
        plan: &CompositePlan,
    ) -> Result<()> {
        self.journal.push(Call::Composite(plan.viewport));
        Ok(())
    }

    fn present(&mut self, _window: &MockWindow, _context: &mut Resource) -> Result<()> {
        self.journal.push(Call::Present);
        Ok(())
    }

    fn resize(&mut self, _context: &mut Resource, size: SurfaceSize) {
        self.journal.push(Call::Resize(size));
    }

    fn pump_events(&mut self, _display: &mut Resource, _window: &MockWindow) -> Vec<SurfaceEvent> {
        std::mem::take(&mut *self.events.0.lock())
    }

    fn window_handle(&self, window: &MockWindow) -> Result<WindowHandle> {
        Ok(window.handle)
    }

    fn window_size(&self, window: &MockWindow) -> SurfaceSize {
        window.handle.size
    }

    fn release_leaked_descriptors(&mut self) {
        self.journal.push(Call::Sweep);
    }
}
