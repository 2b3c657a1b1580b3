use super::{crop_tex_coords, letterbox, Crop, PixelRect, SurfaceSize, TexRect};

/// Snapshot of everything the composite pass needs to place one frame.
///
/// `video_width` is the display width (coded width scaled by the pixel
/// aspect ratio); `video_height` is the coded height.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub video_width: u32,
    pub video_height: u32,
    pub crop: Crop,
    pub window_width: u32,
    pub window_height: u32,
}

/// Output of [`SurfaceGeometry::plan`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CompositePlan {
    /// Region of the converted frame to sample.
    pub tex: TexRect,
    /// Where the sampled region lands on the surface.
    pub viewport: PixelRect,
    /// Full surface size; everything outside `viewport` is cleared.
    pub surface: SurfaceSize,
}

impl SurfaceGeometry {
    pub fn window(&self) -> SurfaceSize {
        SurfaceSize::new(self.window_width, self.window_height)
    }

    /// Clamps the crop, then computes texture coordinates and the letterbox.
    pub fn plan(&self) -> CompositePlan {
        let crop = self.crop.clamped(self.video_width, self.video_height);

        let tex = if self.video_width == 0 || self.video_height == 0 {
            TexRect::UNIT
        } else {
            crop_tex_coords(self.video_width, self.video_height, crop)
        };

        let src_w = self.video_width - crop.left - crop.right;
        let src_h = self.video_height - crop.top - crop.bottom;

        CompositePlan {
            tex,
            viewport: letterbox(src_w, src_h, self.window_width, self.window_height),
            surface: self.window(),
        }
    }
}
