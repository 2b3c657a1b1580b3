use crate::coords::SurfaceSize;

/// Native window events the render thread reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The window now has this inner size; triggers a re-composite.
    Resized(SurfaceSize),
    /// The user asked to close the window. Logged only; the pipeline owns
    /// the sink's lifetime.
    CloseRequested,
}
