use std::fmt;

use thiserror::Error;

use crate::format::FrameTooShort;

/// Step of the context setup chain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SetupStage {
    Display,
    Window,
    Context,
    Shaders,
    Targets,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStage::Display => "display",
            SetupStage::Window => "window",
            SetupStage::Context => "context",
            SetupStage::Shaders => "shaders",
            SetupStage::Targets => "frame targets",
        };
        f.write_str(name)
    }
}

/// A setup step failed; everything acquired before it has been released.
#[derive(Debug, Error)]
#[error("{stage} setup failed: {source:#}")]
pub struct SetupError {
    pub stage: SetupStage,
    #[source]
    pub source: anyhow::Error,
}

impl SetupError {
    pub fn new(stage: SetupStage, source: anyhow::Error) -> Self {
        Self { stage, source }
    }

    /// Adapter for `map_err`.
    pub(crate) fn at(stage: SetupStage) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::new(stage, source)
    }
}

/// Failure while drawing one frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no video format negotiated")]
    NoFormat,

    #[error(transparent)]
    FrameTooShort(#[from] FrameTooShort),

    #[error(transparent)]
    Targets(SetupError),

    #[error("gpu error: {0:#}")]
    Gpu(anyhow::Error),
}

impl RenderError {
    /// Fatal errors leave the context unusable and end the render thread.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Targets(_) | RenderError::Gpu(_))
    }
}
