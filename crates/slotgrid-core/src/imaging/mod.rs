//! Raster primitives shared by the layout resolver and block extractor.
//!
//! Binary masks are `GrayImage`s holding 0 (background) or 255 (foreground).

pub mod binarize;
pub mod color;
pub mod morphology;

use image::{GrayImage, RgbImage};

use crate::model::PixelBox;

pub const FOREGROUND: u8 = 255;

/// Copy `region` out of `image`, clamped to the raster.
pub fn crop_rgb(image: &RgbImage, region: PixelBox) -> Option<RgbImage> {
    let bounds = PixelBox::new(0, 0, image.width(), image.height());
    let r = region.intersect(&bounds)?;
    Some(image::imageops::crop_imm(image, r.left, r.top, r.width(), r.height()).to_image())
}

/// Count of foreground pixels.
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p.0[0] > 0).count() as u64
}

/// Pixelwise OR of two equally sized masks.
pub fn mask_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        let on = a.get_pixel(x, y).0[0] > 0 || b.get_pixel(x, y).0[0] > 0;
        image::Luma([if on { FOREGROUND } else { 0 }])
    })
}

/// Pixelwise inversion of a binary mask.
pub fn mask_not(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        image::Luma([if mask.get_pixel(x, y).0[0] > 0 { 0 } else { FOREGROUND }])
    })
}
