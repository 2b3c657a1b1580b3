//! Graphics context lifecycle.
//!
//! A [`Session`] holds every native resource of one render-thread run:
//! display connection, window, GPU context, compiled pipelines and the
//! lazily-allocated frame targets. Resources are acquired in that order and
//! released in exactly the reverse order on every exit path, followed by the
//! leaked driver descriptor sweep.
//!
//! The [`Platform`] trait is the seam between this lifecycle and the native
//! backend; [`WgpuPlatform`] is the production implementation.

mod error;
mod native;
mod platform;
mod session;
mod state;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{RenderError, SetupError, SetupStage};
pub use native::{SurfaceContext, WgpuPlatform};
pub use platform::Platform;
pub use session::Session;
pub use state::{ContextState, StateCell};
