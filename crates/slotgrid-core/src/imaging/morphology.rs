use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

use super::FOREGROUND;

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

/// One-dimensional rectangular erosion/dilation with a centered kernel of
/// length `k`. Out-of-raster pixels are ignored rather than padded.
fn line_filter(mask: &GrayImage, k: u32, axis: Axis, op: Op) -> GrayImage {
    if k <= 1 {
        return mask.clone();
    }
    let (w, h) = mask.dimensions();
    let (len, lines) = match axis {
        Axis::Horizontal => (w, h),
        Axis::Vertical => (h, w),
    };
    let before = (k / 2) as i64;
    let after = (k - 1) as i64 - before;
    let mut out = GrayImage::new(w, h);
    let mut prefix = vec![0u32; len as usize + 1];

    for line in 0..lines {
        let at = |i: u32| match axis {
            Axis::Horizontal => (i, line),
            Axis::Vertical => (line, i),
        };
        for i in 0..len {
            let (x, y) = at(i);
            prefix[i as usize + 1] = prefix[i as usize] + u32::from(mask.get_pixel(x, y).0[0] > 0);
        }
        for i in 0..len {
            let lo = (i as i64 - before).max(0) as usize;
            let hi = (i as i64 + after + 1).min(len as i64) as usize;
            let count = prefix[hi] - prefix[lo];
            let on = match op {
                Op::Erode => count as usize == hi - lo,
                Op::Dilate => count > 0,
            };
            if on {
                let (x, y) = at(i);
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }
    out
}

/// Keep only horizontal runs at least `k` pixels long.
pub fn open_horizontal(mask: &GrayImage, k: u32) -> GrayImage {
    let eroded = line_filter(mask, k, Axis::Horizontal, Op::Erode);
    line_filter(&eroded, k, Axis::Horizontal, Op::Dilate)
}

/// Keep only vertical runs at least `k` pixels long.
pub fn open_vertical(mask: &GrayImage, k: u32) -> GrayImage {
    let eroded = line_filter(mask, k, Axis::Vertical, Op::Erode);
    line_filter(&eroded, k, Axis::Vertical, Op::Dilate)
}

/// Bridge horizontal gaps shorter than `k` without touching vertical gaps.
pub fn close_horizontal(mask: &GrayImage, k: u32) -> GrayImage {
    let dilated = line_filter(mask, k, Axis::Horizontal, Op::Dilate);
    line_filter(&dilated, k, Axis::Horizontal, Op::Erode)
}

/// Chebyshev dilation by `radius` pixels.
pub fn dilate_square(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(mask, Norm::LInf, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::count_foreground;

    fn mask_with(w: u32, h: u32, on: &[(u32, u32)]) -> GrayImage {
        let mut m = GrayImage::new(w, h);
        for &(x, y) in on {
            m.put_pixel(x, y, Luma([FOREGROUND]));
        }
        m
    }

    #[test]
    fn horizontal_open_keeps_long_runs_only() {
        let mut on: Vec<(u32, u32)> = (0..30).map(|x| (x, 5)).collect();
        on.extend((0..4).map(|x| (x, 9)));
        let m = mask_with(30, 12, &on);
        let opened = open_horizontal(&m, 10);
        assert_eq!(count_foreground(&opened), 30);
        assert_eq!(opened.get_pixel(1, 9).0[0], 0);
    }

    #[test]
    fn horizontal_close_does_not_bridge_vertical_gap() {
        let mut on: Vec<(u32, u32)> = Vec::new();
        for y in [2u32, 6] {
            on.extend((0..10).map(|x| (x, y)));
            on.extend((14..24).map(|x| (x, y)));
        }
        let m = mask_with(24, 9, &on);
        let closed = close_horizontal(&m, 9);
        assert_eq!(closed.get_pixel(12, 2).0[0], FOREGROUND);
        assert_eq!(closed.get_pixel(12, 4).0[0], 0);
    }
}
