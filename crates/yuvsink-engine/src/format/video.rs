use std::fmt;

use thiserror::Error;

/// Smallest accepted width or height.
pub const MIN_DIMENSION: u32 = 16;

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 4096;

/// Pixel layouts a producer may offer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar Y, then U, then V with 2x2 chroma subsampling.
    I420,
    /// Planar Y, then V, then U.
    Yv12,
    /// Y plane followed by interleaved UV.
    Nv12,
    /// Packed 8-bit RGBA.
    Rgba,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::I420 => "I420",
            PixelFormat::Yv12 => "YV12",
            PixelFormat::Nv12 => "NV12",
            PixelFormat::Rgba => "RGBA",
        };
        f.write_str(name)
    }
}

/// Pixel aspect ratio as `n / d`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PixelAspect {
    pub n: u32,
    pub d: u32,
}

impl PixelAspect {
    pub const SQUARE: PixelAspect = PixelAspect { n: 1, d: 1 };

    #[inline]
    pub const fn new(n: u32, d: u32) -> Self {
        Self { n, d }
    }
}

/// Format offered by the producer during negotiation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// `None` when the producer did not state a pixel aspect ratio.
    pub par: Option<PixelAspect>,
}

impl VideoFormat {
    pub fn i420(width: u32, height: u32) -> Self {
        Self {
            pixel_format: PixelFormat::I420,
            width,
            height,
            par: Some(PixelAspect::SQUARE),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported pixel format {0}, only I420 is accepted")]
    UnsupportedFormat(PixelFormat),

    #[error("format carries no pixel aspect ratio")]
    MissingPixelAspect,

    #[error("invalid pixel aspect ratio {n}/{d}")]
    InvalidPixelAspect { n: u32, d: u32 },

    #[error("dimensions {width}x{height} outside [16, 4096]")]
    DimensionsOutOfRange { width: u32, height: u32 },
}

/// Accepted format with the values derived from it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    /// Coded width of the luma plane.
    pub width: u32,
    /// Coded height of the luma plane.
    pub height: u32,
    pub par: PixelAspect,
    /// `width * par.n / par.d`; the width the image is shown at. Never zero.
    pub display_width: u32,
    /// Display aspect ratio reduced to lowest terms.
    pub display_ratio: (u32, u32),
}

impl VideoInfo {
    /// Validates `format` and derives the display geometry.
    pub fn negotiate(format: &VideoFormat) -> Result<Self, FormatError> {
        if format.pixel_format != PixelFormat::I420 {
            return Err(FormatError::UnsupportedFormat(format.pixel_format));
        }

        let range = MIN_DIMENSION..=MAX_DIMENSION;
        if !range.contains(&format.width) || !range.contains(&format.height) {
            return Err(FormatError::DimensionsOutOfRange {
                width: format.width,
                height: format.height,
            });
        }

        let par = format.par.ok_or(FormatError::MissingPixelAspect)?;
        if par.n == 0 || par.d == 0 {
            return Err(FormatError::InvalidPixelAspect { n: par.n, d: par.d });
        }

        let invalid = || FormatError::InvalidPixelAspect { n: par.n, d: par.d };

        let num = format.width as u64 * par.n as u64;
        let den = format.height as u64 * par.d as u64;

        // The display width must be drawable: non-zero and representable.
        let display_width = u32::try_from(num / par.d as u64)
            .ok()
            .filter(|&w| w > 0)
            .ok_or_else(invalid)?;

        let g = gcd(num, den);
        let ratio_n = u32::try_from(num / g).map_err(|_| invalid())?;
        let ratio_d = u32::try_from(den / g).map_err(|_| invalid())?;

        Ok(Self {
            width: format.width,
            height: format.height,
            par,
            display_width,
            display_ratio: (ratio_n, ratio_d),
        })
    }

    /// Vertical distance between two luma rows in texture space.
    #[inline]
    pub fn line_height(&self) -> f32 {
        1.0 / self.height as f32
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_pixels_keep_width() {
        let info = VideoInfo::negotiate(&VideoFormat::i420(720, 576)).unwrap();
        assert_eq!(info.display_width, 720);
        assert_eq!(info.display_ratio, (5, 4));
        assert!((info.line_height() - 1.0 / 576.0).abs() < f32::EPSILON);
    }

    #[test]
    fn anamorphic_pixels_widen_display() {
        let format = VideoFormat { par: Some(PixelAspect::new(16, 11)), ..VideoFormat::i420(720, 576) };
        let info = VideoInfo::negotiate(&format).unwrap();
        assert_eq!(info.width, 720);
        assert_eq!(info.display_width, 1047);
        assert_eq!(info.display_ratio, (20, 11));
    }

    #[test]
    fn rejects_other_pixel_formats() {
        let format = VideoFormat { pixel_format: PixelFormat::Nv12, ..VideoFormat::i420(64, 64) };
        assert_eq!(
            VideoInfo::negotiate(&format),
            Err(FormatError::UnsupportedFormat(PixelFormat::Nv12))
        );
    }

    #[test]
    fn rejects_missing_aspect() {
        let format = VideoFormat { par: None, ..VideoFormat::i420(64, 64) };
        assert_eq!(VideoInfo::negotiate(&format), Err(FormatError::MissingPixelAspect));
    }

    #[test]
    fn rejects_zero_aspect() {
        let format = VideoFormat { par: Some(PixelAspect::new(1, 0)), ..VideoFormat::i420(64, 64) };
        assert_eq!(
            VideoInfo::negotiate(&format),
            Err(FormatError::InvalidPixelAspect { n: 1, d: 0 })
        );
    }

    #[test]
    fn rejects_aspect_that_collapses_display_width() {
        let format = VideoFormat { par: Some(PixelAspect::new(1, 100)), ..VideoFormat::i420(16, 64) };
        assert_eq!(
            VideoInfo::negotiate(&format),
            Err(FormatError::InvalidPixelAspect { n: 1, d: 100 })
        );

        let format = VideoFormat { par: Some(PixelAspect::new(1, 16)), ..VideoFormat::i420(16, 64) };
        assert_eq!(VideoInfo::negotiate(&format).unwrap().display_width, 1);
    }

    #[test]
    fn rejects_aspect_that_overflows_display_width() {
        let format = VideoFormat {
            par: Some(PixelAspect::new(1 << 20, 1)),
            ..VideoFormat::i420(4096, 64)
        };
        assert_eq!(
            VideoInfo::negotiate(&format),
            Err(FormatError::InvalidPixelAspect { n: 1 << 20, d: 1 })
        );

        let format = VideoFormat {
            par: Some(PixelAspect::new((1 << 20) - 1, 1)),
            ..VideoFormat::i420(4096, 64)
        };
        let info = VideoInfo::negotiate(&format).unwrap();
        assert_eq!(info.display_width, 4096 * ((1 << 20) - 1));
        assert_eq!(info.display_ratio, (64 * ((1 << 20) - 1), 1));
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        for (w, h) in [(15, 64), (64, 15), (4097, 64), (64, 4097)] {
            assert_eq!(
                VideoInfo::negotiate(&VideoFormat::i420(w, h)),
                Err(FormatError::DimensionsOutOfRange { width: w, height: h })
            );
        }
        assert!(VideoInfo::negotiate(&VideoFormat::i420(16, 4096)).is_ok());
    }
}
