//! Candidate class blocks: connected components of a per-column content mask.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::config::schema::BlockConfig;
use crate::imaging::color::color_mask;
use crate::imaging::morphology::close_horizontal;
use crate::imaging::{crop_rgb, mask_or, FOREGROUND};
use crate::model::{CandidateBlock, ColumnLayout, PixelBox, RowLayout, TextToken};
use crate::ocr::tokens_in;
use crate::trace::{PageTrace, TraceStage};

/// Paint each token box, padded by a tenth of its size, into a mask covering
/// `region`.
fn text_mask(tokens: &[TextToken], region: PixelBox) -> GrayImage {
    let mut mask = GrayImage::new(region.width(), region.height());
    for t in tokens_in(tokens, &region) {
        let pad_x = 2.max(t.bbox.width() / 10);
        let pad_y = 1.max(t.bbox.height() / 10);
        let Some(b) = t
            .bbox
            .expand(pad_x, pad_y, u32::MAX, u32::MAX)
            .intersect(&region)
        else {
            continue;
        };
        for y in b.top..b.bottom {
            for x in b.left..b.right {
                mask.put_pixel(x - region.left, y - region.top, Luma([FOREGROUND]));
            }
        }
    }
    mask
}

/// Bounding box and pixel count of every labelled component.
fn component_boxes(mask: &GrayImage) -> Vec<(PixelBox, u64)> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut stats: Vec<Option<(PixelBox, u64)>> = Vec::new();
    for (x, y, p) in labels.enumerate_pixels() {
        let id = p.0[0] as usize;
        if id == 0 {
            continue;
        }
        if stats.len() < id {
            stats.resize(id, None);
        }
        let entry = &mut stats[id - 1];
        match entry {
            Some((b, n)) => {
                b.left = b.left.min(x);
                b.top = b.top.min(y);
                b.right = b.right.max(x + 1);
                b.bottom = b.bottom.max(y + 1);
                *n += 1;
            }
            None => *entry = Some((PixelBox::new(x, y, x + 1, y + 1), 1)),
        }
    }
    stats.into_iter().flatten().collect()
}

/// Content mask of one column: colored fill OR padded text boxes, opened to
/// drop speckle, then closed horizontally only so stacked entries stay apart.
pub fn column_mask(
    page: &RgbImage,
    tokens: &[TextToken],
    region: PixelBox,
    config: &BlockConfig,
) -> Option<GrayImage> {
    let crop = crop_rgb(page, region)?;
    let color = color_mask(&crop, config.saturation_threshold, config.chroma_threshold);
    let text = text_mask(tokens, region);
    let mut mask = mask_or(&color, &text);
    // A k x k square kernel is a Chebyshev ball of radius k / 2.
    let open_radius = (config.open_kernel / 2).min(u8::MAX as u32) as u8;
    if open_radius > 0 {
        mask = open(&mask, Norm::LInf, open_radius);
    }
    if config.horizontal_close > 0 {
        mask = close_horizontal(&mask, config.horizontal_close);
    }
    Some(mask)
}

/// Extract candidate blocks from every weekday column, top to bottom within
/// each column.
pub fn extract_blocks(
    page: &RgbImage,
    tokens: &[TextToken],
    columns: &ColumnLayout,
    rows: &RowLayout,
    config: &BlockConfig,
    trace: &mut PageTrace,
) -> Vec<CandidateBlock> {
    let (width, height) = page.dimensions();
    let min_area = (width as f64 * height as f64 * config.area_min_fraction as f64) as u64;
    let top = rows.header_bottom;
    let bottom = rows.rows.last().map_or(height, |r| r.bottom).min(height);

    let mut blocks = Vec::new();
    for (index, col) in columns.columns.iter().enumerate() {
        let region = PixelBox::new(col.left, top, col.right.min(width), bottom);
        let Some(mask) = column_mask(page, tokens, region, config) else {
            continue;
        };
        let min_width = (region.width() as f32 * config.min_block_width_fraction) as u32;

        let mut found: Vec<CandidateBlock> = component_boxes(&mask)
            .into_iter()
            .filter(|(_, area)| *area >= min_area)
            .filter_map(|(b, _)| {
                let bbox = PixelBox::new(
                    region.left + b.left,
                    (region.top + b.top).max(top + 1),
                    region.left + b.right,
                    (region.top + b.bottom).min(bottom.saturating_sub(1)),
                );
                (bbox.height() >= config.min_block_height && bbox.width() >= min_width).then_some(
                    CandidateBlock {
                        weekday: col.weekday,
                        column_index: index,
                        bbox,
                    },
                )
            })
            .collect();
        found.sort_by_key(|b| b.bbox.top);

        trace.note(
            TraceStage::Blocks,
            format!("{} comps={}", col.weekday, found.len()),
        );
        blocks.extend(found);
    }
    blocks
}
