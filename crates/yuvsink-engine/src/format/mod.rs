//! Video format negotiation and frame buffers.
//!
//! Only planar I420 is accepted. [`VideoInfo`] carries the negotiated coded
//! size plus the display width derived from the pixel aspect ratio.

mod frame;
mod video;

pub use frame::{Frame, FrameTooShort, PlaneLayout, Planes};
pub use video::{
    FormatError, PixelAspect, PixelFormat, VideoFormat, VideoInfo, MAX_DIMENSION, MIN_DIMENSION,
};
