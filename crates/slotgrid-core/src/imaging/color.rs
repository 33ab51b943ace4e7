use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;

use super::{count_foreground, FOREGROUND};

/// HSV saturation on the 0-255 scale.
pub fn saturation(px: Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return 0;
    }
    ((max - min) as u32 * 255 / max as u32) as u8
}

fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// CIE Lab chroma `sqrt(a^2 + b^2)` under D65.
pub fn lab_chroma(px: Rgb<u8>) -> f32 {
    let [r, g, b] = px.0.map(srgb_to_linear);
    let x = (0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b) / 0.950_47;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175 * b;
    let z = (0.019_333_9 * r + 0.119_192 * g + 0.950_304_1 * b) / 1.088_83;
    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);
    (a * a + bb * bb).sqrt()
}

/// Foreground where a pixel is saturated in HSV or chromatic in Lab.
/// Pastel fills pass the Lab test even when HSV saturation is faint.
pub fn color_mask(rgb: &RgbImage, saturation_threshold: u8, chroma_threshold: f32) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let px = *rgb.get_pixel(x, y);
        let on = saturation(px) > saturation_threshold || lab_chroma(px) > chroma_threshold;
        Luma([if on { FOREGROUND } else { 0 }])
    })
}

/// Share of the image covered by color after a 5 x 5 closing.
pub fn fill_ratio(rgb: &RgbImage, saturation_threshold: u8, chroma_threshold: f32) -> f32 {
    let area = rgb.width() as u64 * rgb.height() as u64;
    if area == 0 {
        return 0.0;
    }
    let mask = close(&color_mask(rgb, saturation_threshold, chroma_threshold), Norm::LInf, 2);
    count_foreground(&mask) as f32 / area as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greys_are_not_colored() {
        for v in [0u8, 90, 200, 255] {
            let px = Rgb([v, v, v]);
            assert_eq!(saturation(px), 0);
            assert!(lab_chroma(px) < 1.0);
        }
    }

    #[test]
    fn pastel_is_colored() {
        let px = Rgb([255, 228, 196]);
        assert!(saturation(px) > 12);
        assert!(lab_chroma(px) > 6.0);
    }

    #[test]
    fn fill_ratio_counts_colored_share() {
        let mut img = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, Rgb([200, 230, 255]));
            }
        }
        let ratio = fill_ratio(&img, 12, 6.0);
        assert!((ratio - 0.5).abs() < 0.05, "ratio {ratio}");
    }
}
