use image::GrayImage;
use imageproc::filter::median_filter;

use super::edges::{coarsen, group_positions};
use crate::imaging::morphology::{dilate_square, open_horizontal, open_vertical};
use crate::imaging::{count_foreground, mask_not};

/// Pixel coordinates of detected grid rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLines {
    /// y of each horizontal rule, top to bottom.
    pub horizontal: Vec<u32>,
    /// x of each vertical rule, left to right.
    pub vertical: Vec<u32>,
}

/// Rows (or columns) whose foreground count exceeds `min_count`.
fn dense_positions(counts: &[u32], min_count: u32) -> Vec<u32> {
    counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > min_count)
        .map(|(i, _)| i as u32)
        .collect()
}

impl GridLines {
    fn count(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }
}

/// Share of the page above which a prepared mask is treated as fill, not rules.
const FILL_FRACTION: f32 = 0.95;

/// Rules of one polarity, or `None` when the mask is solid fill.
fn rules_in(mask: &GrayImage, kernel_fraction: f32) -> Option<GridLines> {
    let (w, h) = mask.dimensions();
    let work = dilate_square(&median_filter(mask, 1, 1), 2);
    if count_foreground(&work) as f32 >= (w as u64 * h as u64) as f32 * FILL_FRACTION {
        return None;
    }

    let h_kernel = 12.max((w as f32 * kernel_fraction) as u32);
    let v_kernel = 12.max((h as f32 * kernel_fraction) as u32);
    let h_img = open_horizontal(&work, h_kernel);
    let v_img = open_vertical(&work, v_kernel);

    let mut row_counts = vec![0u32; h as usize];
    for (_, y, p) in h_img.enumerate_pixels() {
        if p.0[0] > 0 {
            row_counts[y as usize] += 1;
        }
    }
    let mut col_counts = vec![0u32; w as usize];
    for (x, _, p) in v_img.enumerate_pixels() {
        if p.0[0] > 0 {
            col_counts[x as usize] += 1;
        }
    }

    let ys = group_positions(
        &dense_positions(&row_counts, 8.max((w as f32 * 0.02) as u32)),
        8,
    );
    let xs = group_positions(
        &dense_positions(&col_counts, 8.max((h as f32 * 0.02) as u32)),
        8,
    );

    Some(GridLines {
        horizontal: coarsen(&ys, 24),
        vertical: coarsen(&xs, 60.max((w as f32 * 0.06) as u32)),
    })
}

/// Find long horizontal and vertical rules in an ink mask.
///
/// Rules are isolated by directional opening with a kernel of
/// `kernel_fraction` of the page dimension, then projected and clustered.
/// Both polarities are tried so light rules on a dark fill are found too;
/// the one with more lines wins, ties going to the mask as given.
pub fn detect_grid_lines(ink: &GrayImage, kernel_fraction: f32) -> GridLines {
    let (w, h) = ink.dimensions();
    if w == 0 || h == 0 {
        return GridLines::default();
    }

    let dark = rules_in(ink, kernel_fraction).unwrap_or_default();
    let light = rules_in(&mask_not(ink), kernel_fraction).unwrap_or_default();
    if light.count() > dark.count() {
        light
    } else {
        dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::binarize::adaptive_threshold_inv;
    use crate::imaging::FOREGROUND;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn finds_ruled_grid() {
        let mut img = RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]));
        for x in [50, 150, 250, 350] {
            draw_filled_rect_mut(&mut img, Rect::at(x, 0).of_size(2, 300), Rgb([40, 40, 40]));
        }
        for y in [40, 100, 160, 220, 280] {
            draw_filled_rect_mut(&mut img, Rect::at(0, y).of_size(400, 2), Rgb([40, 40, 40]));
        }
        let gray = image::imageops::grayscale(&img);
        let ink = adaptive_threshold_inv(&gray, 15, 10);
        let lines = detect_grid_lines(&ink, 0.025);
        assert_eq!(lines.vertical, vec![50, 150, 250, 350]);
        assert_eq!(lines.horizontal, vec![40, 100, 160, 220, 280]);
    }

    #[test]
    fn light_rules_on_dark_fill() {
        let mut ink = GrayImage::from_pixel(400, 300, Luma([FOREGROUND]));
        for x in [50u32, 150, 250, 350] {
            for y in 0..300 {
                ink.put_pixel(x, y, Luma([0]));
                ink.put_pixel(x + 1, y, Luma([0]));
            }
        }
        for y in [40u32, 100, 160, 220, 280] {
            for x in 0..400 {
                ink.put_pixel(x, y, Luma([0]));
                ink.put_pixel(x, y + 1, Luma([0]));
            }
        }
        let lines = detect_grid_lines(&ink, 0.025);
        assert_eq!(lines.vertical, vec![50, 150, 250, 350]);
        assert_eq!(lines.horizontal, vec![40, 100, 160, 220, 280]);
    }

    #[test]
    fn blank_page_has_no_rules() {
        let ink = GrayImage::from_pixel(200, 100, Luma([0]));
        assert_eq!(detect_grid_lines(&ink, 0.025), GridLines::default());
    }
}
