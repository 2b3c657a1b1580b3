use thiserror::Error;

/// One owned I420 image: luma, then U, then V, tightly packed.
///
/// Frames travel to the render thread by value and come back to the caller
/// once drawn, so the buffer can be refilled without reallocating.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    #[inline]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Zero-filled frame sized for `layout`.
    pub fn for_layout(layout: PlaneLayout) -> Self {
        Self::new(vec![0; layout.total_len()])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("len", &self.data.len()).finish()
    }
}

#[derive(Debug, Copy, Clone, Error, PartialEq, Eq)]
#[error("frame holds {actual} bytes, {expected} needed")]
pub struct FrameTooShort {
    pub expected: usize,
    pub actual: usize,
}

/// Byte layout of an I420 image with no row padding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlaneLayout {
    pub width: u32,
    pub height: u32,
    pub chroma_width: u32,
    pub chroma_height: u32,
}

/// Borrowed planes of one frame.
#[derive(Debug, Copy, Clone)]
pub struct Planes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
}

impl PlaneLayout {
    /// Chroma planes are half size in each direction, rounded up.
    pub fn i420(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            chroma_width: width.div_ceil(2),
            chroma_height: height.div_ceil(2),
        }
    }

    #[inline]
    pub fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn chroma_len(&self) -> usize {
        self.chroma_width as usize * self.chroma_height as usize
    }

    #[inline]
    pub fn total_len(&self) -> usize {
        self.luma_len() + 2 * self.chroma_len()
    }

    /// Splits `data` into its planes; trailing bytes are ignored.
    pub fn split<'a>(&self, data: &'a [u8]) -> Result<Planes<'a>, FrameTooShort> {
        let expected = self.total_len();
        if data.len() < expected {
            return Err(FrameTooShort { expected, actual: data.len() });
        }

        let (y, rest) = data.split_at(self.luma_len());
        let (u, rest) = rest.split_at(self.chroma_len());
        let v = &rest[..self.chroma_len()];

        Ok(Planes { y, u, v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i420_plane_sizes() {
        let layout = PlaneLayout::i420(720, 576);
        assert_eq!(layout.luma_len(), 414_720);
        assert_eq!(layout.chroma_len(), 103_680);
        assert_eq!(layout.total_len(), 622_080);
    }

    #[test]
    fn odd_dimensions_round_chroma_up() {
        let layout = PlaneLayout::i420(17, 5);
        assert_eq!((layout.chroma_width, layout.chroma_height), (9, 3));
        assert_eq!(layout.total_len(), 85 + 2 * 27);
    }

    #[test]
    fn split_returns_planes_in_order() {
        let layout = PlaneLayout::i420(4, 2);
        let mut data = vec![1u8; 8];
        data.extend([2, 2]);
        data.extend([3, 3]);
        data.extend([9, 9, 9]); // trailing padding

        let planes = layout.split(&data).unwrap();
        assert_eq!(planes.y, &[1; 8]);
        assert_eq!(planes.u, &[2, 2]);
        assert_eq!(planes.v, &[3, 3]);
    }

    #[test]
    fn split_rejects_short_buffer() {
        let layout = PlaneLayout::i420(4, 2);
        assert_eq!(
            layout.split(&[0; 11]).unwrap_err(),
            FrameTooShort { expected: 12, actual: 11 }
        );
    }

    #[test]
    fn frame_for_layout_is_exact() {
        let frame = Frame::for_layout(PlaneLayout::i420(16, 16));
        assert_eq!(frame.len(), 384);
        assert_eq!(frame.into_inner().len(), 384);
    }
}
