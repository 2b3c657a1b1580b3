/// Pixels trimmed from each edge of the display-sized video.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Crop {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Crop {
    pub const NONE: Crop = Crop { top: 0, bottom: 0, left: 0, right: 0 };

    #[inline]
    pub const fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self { top, bottom, left, right }
    }

    /// Clamps the crop so at least one column and one row of a `width` x
    /// `height` image survive.
    ///
    /// `left`/`top` win over `right`/`bottom` when both sides overflow.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let (left, right) = clamp_pair(self.left, self.right, width);
        let (top, bottom) = clamp_pair(self.top, self.bottom, height);
        Self { top, bottom, left, right }
    }

    /// Returns `true` if `left + right < width` and `top + bottom < height`.
    pub fn fits(self, width: u32, height: u32) -> bool {
        (self.left as u64 + self.right as u64) < width as u64
            && (self.top as u64 + self.bottom as u64) < height as u64
    }
}

fn clamp_pair(lead: u32, trail: u32, extent: u32) -> (u32, u32) {
    if extent == 0 {
        return (0, 0);
    }
    let lead = lead.min(extent - 1);
    let trail = trail.min(extent - 1 - lead);
    (lead, trail)
}

/// Texture-space rectangle sampled by the composite pass.
///
/// `u` grows to the right and `v` grows downward, so `top <= bottom`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TexRect {
    pub const UNIT: TexRect = TexRect { left: 0.0, top: 0.0, right: 1.0, bottom: 1.0 };

    /// Quad corners in draw order: bottom-left, bottom-right, top-right, top-left.
    pub fn corners(self) -> [[f32; 2]; 4] {
        [
            [self.left, self.bottom],
            [self.right, self.bottom],
            [self.right, self.top],
            [self.left, self.top],
        ]
    }
}

/// Shifts the unit texture rectangle inward by the crop fractions.
///
/// The crop must already satisfy [`Crop::fits`]; see [`Crop::clamped`].
pub fn crop_tex_coords(video_width: u32, video_height: u32, crop: Crop) -> TexRect {
    let w = video_width as f32;
    let h = video_height as f32;

    TexRect {
        left: crop.left as f32 / w,
        top: crop.top as f32 / h,
        right: 1.0 - crop.right as f32 / w,
        bottom: 1.0 - crop.bottom as f32 / h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside_unit_square(t: TexRect) -> bool {
        [t.left, t.top, t.right, t.bottom]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }

    // ── crop_tex_coords ───────────────────────────────────────────────────

    #[test]
    fn zero_crop_is_unit_square() {
        assert_eq!(crop_tex_coords(720, 576, Crop::NONE), TexRect::UNIT);
        assert_eq!(
            TexRect::UNIT.corners(),
            [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn crop_shifts_each_edge_inward() {
        let t = crop_tex_coords(100, 200, Crop::new(20, 40, 10, 30));
        assert!((t.left - 0.1).abs() < 1e-6);
        assert!((t.right - 0.7).abs() < 1e-6);
        assert!((t.top - 0.1).abs() < 1e-6);
        assert!((t.bottom - 0.8).abs() < 1e-6);
    }

    #[test]
    fn valid_crops_stay_inside_unit_square() {
        for (w, h) in [(16u32, 16u32), (720, 576), (1920, 1080), (4096, 17)] {
            for step in 0..8u32 {
                let crop = Crop::new(step * h / 17, step * h / 19, step * w / 17, step * w / 23);
                assert!(crop.fits(w, h), "{crop:?} for {w}x{h}");

                let t = crop_tex_coords(w, h, crop);
                assert!(inside_unit_square(t), "{t:?}");
                assert!(t.left < t.right);
                assert!(t.top < t.bottom);
            }
        }
    }

    // ── Crop::clamped ─────────────────────────────────────────────────────

    #[test]
    fn clamped_keeps_valid_crop() {
        let crop = Crop::new(1, 2, 3, 4);
        assert_eq!(crop.clamped(100, 100), crop);
    }

    #[test]
    fn clamped_leaves_one_pixel() {
        let crop = Crop::new(500, 500, 90, 90).clamped(100, 50);
        assert_eq!(crop, Crop::new(49, 0, 90, 9));
        assert!(crop.fits(100, 50));
    }

    #[test]
    fn clamped_on_empty_image_is_none() {
        assert_eq!(Crop::new(5, 5, 5, 5).clamped(0, 0), Crop::NONE);
    }
}
