use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, sum_image_pixels};

use super::FOREGROUND;

pub fn to_gray(rgb: &RgbImage) -> GrayImage {
    image::imageops::grayscale(rgb)
}

/// Inverted adaptive mean threshold: a pixel is foreground (ink) when it is
/// darker than the mean of its `(2r+1)^2` neighbourhood by more than `offset`.
pub fn adaptive_threshold_inv(gray: &GrayImage, radius: u32, offset: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }

    let integral: Image<Luma<u64>> = integral_image::<_, u64>(gray);
    GrayImage::from_fn(w, h, |x, y| {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius).min(w - 1);
        let y1 = (y + radius).min(h - 1);
        let [sum] = sum_image_pixels(&integral, x0, y0, x1, y1);
        let n = ((x1 - x0 + 1) * (y1 - y0 + 1)) as i64;
        let mean = sum as i64 / n.max(1);
        let v = gray.get_pixel(x, y).0[0] as i64;
        Luma([if v < mean - offset as i64 { FOREGROUND } else { 0 }])
    })
}

/// Global Otsu threshold, dark text on white (text stays 0).
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] > level { FOREGROUND } else { 0 }])
    })
}
