//! Per-block text field extraction.
//!
//! A block is read three times (binarized block, binarized single line,
//! raw block). The raw pass keeps word geometry so lines can be rebuilt
//! locally, including titles printed as a vertical stack of glyphs.

pub mod lines;
pub mod normalize;
pub mod scoring;

use image::RgbImage;
use std::collections::{HashMap, HashSet};

use crate::config::schema::FieldConfig;
use crate::config::tables::CompiledTables;
use crate::error::ScheduleError;
use crate::layout::labels::strip_time_labels;
use crate::model::PixelBox;
use crate::ocr::{engine_lines, OcrEngine, OcrRequest, SegmentationMode};
use lines::{reconstruct_lines, CandidateLine};
use normalize::normalize_line;
pub use scoring::BlockFields;

/// OCR the block and gather de-duplicated candidate lines in reading order,
/// with the number of passes each line appeared in.
pub fn gather_candidates(
    page: &RgbImage,
    bbox: PixelBox,
    ocr: &dyn OcrEngine,
    config: &FieldConfig,
) -> Result<(Vec<CandidateLine>, HashMap<String, usize>), ScheduleError> {
    let region = bbox.inset(config.crop_padding).unwrap_or(bbox);
    let block = OcrRequest::new(&config.languages, SegmentationMode::Block);
    let single = OcrRequest::new(&config.languages, SegmentationMode::SingleLine).binarized();

    let geometric = ocr.recognize(page, region, &block)?;
    let multi = ocr.recognize(page, region, &block.clone().binarized())?;
    let line = ocr.recognize(page, region, &single)?;

    let passes: [Vec<CandidateLine>; 3] = [
        reconstruct_lines(&geometric, config.fuse_vertical_glyphs),
        engine_lines(&multi)
            .into_iter()
            .map(|l| CandidateLine::horizontal(l.text))
            .collect(),
        engine_lines(&line)
            .into_iter()
            .map(|l| CandidateLine::horizontal(l.text))
            .collect(),
    ];

    let mut frequency: HashMap<String, usize> = HashMap::new();
    let mut ordered: Vec<CandidateLine> = Vec::new();
    for pass in passes {
        let mut seen = HashSet::new();
        for candidate in pass {
            let text = normalize_line(&strip_time_labels(&candidate.text));
            if text.is_empty() {
                continue;
            }
            if seen.insert(text.clone()) {
                *frequency.entry(text.clone()).or_default() += 1;
            }
            if !ordered.iter().any(|l| l.text == text) {
                ordered.push(CandidateLine {
                    text,
                    vertical: candidate.vertical,
                });
            }
        }
    }
    Ok((ordered, frequency))
}

/// Read title, instructor and room from one block.
pub fn extract_fields(
    page: &RgbImage,
    bbox: PixelBox,
    ocr: &dyn OcrEngine,
    config: &FieldConfig,
    tables: &CompiledTables,
) -> Result<BlockFields, ScheduleError> {
    let (candidates, frequency) = gather_candidates(page, bbox, ocr, config)?;
    Ok(scoring::choose_fields(&candidates, &frequency, tables, config))
}
