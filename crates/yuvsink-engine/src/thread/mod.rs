//! Render thread and the frame handoff protocol.
//!
//! The delivery side owns a [`Submitter`]; the render thread owns the
//! matching [`FrameSource`]. Both channels hold one message, and
//! `Submitter::submit` blocks until the completion for its frame arrives,
//! so at most one frame is ever in flight.

mod handoff;
mod shared;
mod worker;

pub use handoff::{handoff, Completion, Disconnected, FrameSource, Outcome, PendingFrame, Submitter, Wait};
pub use shared::{Settings, Shared};
pub use worker::RenderThread;
