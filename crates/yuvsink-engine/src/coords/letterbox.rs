use super::PixelRect;

/// Largest rectangle with the aspect ratio of `src_w` x `src_h` that fits
/// centred inside `dst_w` x `dst_h`.
///
/// Returns an empty rectangle if any dimension is zero.
pub fn letterbox(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> PixelRect {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return PixelRect::default();
    }

    let (sw, sh, dw, dh) = (src_w as u64, src_h as u64, dst_w as u64, dst_h as u64);

    // Cross-multiplied aspect comparison; u32 * u32 always fits in u64.
    let (w, h) = if sw * dh > sh * dw {
        (dw, dw * sh / sw)
    } else if sw * dh < sh * dw {
        (dh * sw / sh, dh)
    } else {
        (dw, dh)
    };

    let x = (dw - w) / 2;
    let y = (dh - h) / 2;

    PixelRect::new(x as u32, y as u32, w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SurfaceSize;

    fn check_fit(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) {
        let r = letterbox(src_w, src_h, dst_w, dst_h);
        let label = format!("{src_w}x{src_h} into {dst_w}x{dst_h} -> {r:?}");

        assert!(r.fits_within(SurfaceSize::new(dst_w, dst_h)), "{label}");

        // One side always spans the destination.
        assert!(r.w == dst_w || r.h == dst_h, "{label}");

        // Centred: opposing margins differ by at most one pixel.
        let (left, right) = (r.x, dst_w - r.right());
        let (top, bottom) = (r.y, dst_h - r.bottom());
        assert!(left.abs_diff(right) <= 1, "{label}");
        assert!(top.abs_diff(bottom) <= 1, "{label}");

        // Aspect preserved up to the floor on the derived side.
        let lhs = r.w as u64 * src_h as u64;
        let rhs = r.h as u64 * src_w as u64;
        let slack = src_w.max(src_h) as u64;
        assert!(lhs.abs_diff(rhs) <= slack, "{label}");
    }

    #[test]
    fn wide_source_is_letterboxed() {
        assert_eq!(letterbox(1920, 1080, 720, 576), PixelRect::new(0, 85, 720, 405));
    }

    #[test]
    fn tall_source_is_pillarboxed() {
        assert_eq!(letterbox(480, 640, 800, 600), PixelRect::new(175, 0, 450, 600));
    }

    #[test]
    fn equal_aspect_fills_destination() {
        assert_eq!(letterbox(360, 288, 720, 576), PixelRect::new(0, 0, 720, 576));
    }

    #[test]
    fn zero_dimension_is_empty() {
        assert!(letterbox(0, 10, 10, 10).is_empty());
        assert!(letterbox(10, 10, 10, 0).is_empty());
    }

    #[test]
    fn fit_properties_hold_across_sizes() {
        let sizes = [1u32, 2, 3, 16, 17, 405, 576, 720, 1023, 1080, 1920, 4096];
        for &sw in &sizes {
            for &sh in &sizes {
                for (dw, dh) in [(720u32, 576u32), (1, 1), (1920, 1080), (333, 999)] {
                    check_fit(sw, sh, dw, dh);
                }
            }
        }
    }

    #[test]
    fn large_dimensions_do_not_overflow() {
        let r = letterbox(u32::MAX, 1, u32::MAX, u32::MAX);
        assert_eq!(r.w, u32::MAX);
        assert_eq!(r.h, 1);
    }
}
