//! Two-pass GPU video pipeline.
//!
//! Pass 1 uploads the three I420 planes and converts them (with a linear
//! blend deinterlace on luma) into an offscreen RGB target sized to the
//! coded frame. Pass 2 samples the cropped region of that target into the
//! letterboxed viewport of the window surface.
//!
//! Pass 2 can be re-run on its own after a resize; the RGB target keeps the
//! last converted frame.

mod common;
mod passes;
mod pipelines;
mod targets;

pub use passes::{composite_frame, convert_frame};
pub use pipelines::{Pipelines, RGB_TARGET_FORMAT};
pub use targets::FrameTargets;
