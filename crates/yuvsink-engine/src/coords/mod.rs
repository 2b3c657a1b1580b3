//! Pixel geometry for the composite pass.
//!
//! Everything here is pure arithmetic on integer pixel sizes:
//! - crop-adjusted texture coordinates
//! - aspect-preserving letterbox placement
//! - the per-frame plan combining both for a given window
//!
//! Window space uses a top-left origin with +Y down. Texture space is the
//! unit square with (0, 0) at the top-left texel.

mod crop;
mod geometry;
mod letterbox;
mod rect;
mod size;

pub use crop::{crop_tex_coords, Crop, TexRect};
pub use geometry::{CompositePlan, SurfaceGeometry};
pub use letterbox::letterbox;
pub use rect::PixelRect;
pub use size::SurfaceSize;
