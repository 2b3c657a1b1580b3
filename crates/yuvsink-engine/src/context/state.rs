use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Progress of the graphics context through its lifecycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ContextState {
    #[default]
    Uninitialized,
    WindowReady,
    ContextReady,
    ShadersReady,
    /// Set on the first drawn frame, once the video size is known.
    FrameTargetsReady,
    TornDown,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Uninitialized => "uninitialized",
            ContextState::WindowReady => "window ready",
            ContextState::ContextReady => "context ready",
            ContextState::ShadersReady => "shaders ready",
            ContextState::FrameTargetsReady => "frame targets ready",
            ContextState::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

/// Context state readable from any thread, written by the render thread.
#[derive(Debug, Clone, Default)]
pub struct StateCell(Arc<Mutex<ContextState>>);

impl StateCell {
    pub fn get(&self) -> ContextState {
        *self.0.lock()
    }

    pub(crate) fn set(&self, state: ContextState) {
        let mut current = self.0.lock();
        if *current != state {
            log::debug!("graphics context: {current} -> {state}");
            *current = state;
        }
    }
}
