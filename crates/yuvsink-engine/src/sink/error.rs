use thiserror::Error;

use crate::context::{RenderError, SetupError};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("render thread exited")]
    RenderThreadExited,

    #[error("a window handle is already in use")]
    WindowHandleInUse,

    #[error("sink is not started")]
    NotStarted,
}
