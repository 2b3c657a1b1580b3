//! Native window + event pump.
//!
//! Owns the `winit` EventLoop used as the display connection, the window
//! (created here or adopted from the embedding application) and the
//! translation of native events into [`SurfaceEvent`]s.

mod config;
mod display;
mod events;
mod handle;

pub use config::WindowConfig;
pub use display::{Display, NativeWindow};
pub use events::SurfaceEvent;
pub use handle::WindowHandle;
