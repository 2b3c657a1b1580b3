use super::SurfaceSize;

/// Axis-aligned rectangle in physical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering the whole of `size`.
    #[inline]
    pub const fn covering(size: SurfaceSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(self) -> u32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(self) -> u32 {
        self.y + self.h
    }

    /// Returns `true` if `self` lies entirely inside a surface of `size`.
    #[inline]
    pub fn fits_within(self, size: SurfaceSize) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }
}
