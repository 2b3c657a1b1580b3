//! yuvsink engine crate.
//!
//! A threaded video sink that draws planar I420 frames into a native window
//! with wgpu: frames are uploaded as three single-channel planes, converted
//! to RGB offscreen, then letterboxed and cropped onto the window surface.
//!
//! [`sink::Sink`] is the entry point for the delivery side.

pub mod context;
pub mod coords;
pub mod device;
pub mod format;
pub mod logging;
pub mod render;
pub mod sink;
pub mod thread;
pub mod window;

pub use sink::{Sink, SinkConfig, SinkController, SinkError};
