pub mod assemble;
pub mod blocks;
pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod imaging;
pub mod ingest;
pub mod layout;
pub mod model;
pub mod ocr;
pub mod pipeline;
pub mod timing;
pub mod trace;

use image::RgbImage;

use config::schema::ParserConfig;
use config::tables::CompiledTables;
use error::ScheduleError;
use ingest::{PageImage, PageRenderer};
use model::{PageResult, PageStatus, ScheduleResult};
use ocr::OcrEngine;
use trace::{DiagnosticTrace, TraceStage};

/// Main API entry point: reconstruct the class slots of an uploaded file.
///
/// PDFs are rendered page by page through `renderer`; anything else is
/// decoded as a single image. Input that cannot be decoded at all is an
/// error, while problems on individual pages are reported per page.
pub fn parse_document(
    bytes: &[u8],
    renderer: &dyn PageRenderer,
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
) -> Result<ScheduleResult, ScheduleError> {
    let pages = ingest::decode_input(bytes, renderer)?;
    parse_pages(pages, ocr, config)
}

/// Parse already-decoded pages. A page that failed to decode is recorded
/// as failed and its siblings still parse.
pub fn parse_pages(
    pages: Vec<PageImage>,
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
) -> Result<ScheduleResult, ScheduleError> {
    config::validate_config(config)?;
    let tables = CompiledTables::compile(&config.tables)?;

    let mut trace = DiagnosticTrace::default();
    let mut results = Vec::with_capacity(pages.len());
    for (index, page) in pages.into_iter().enumerate() {
        let page_number = index + 1;
        let result = match page {
            Ok(image) => pipeline::parse_page(page_number, &image, ocr, config, &tables, &mut trace),
            Err(e) => {
                tracing::warn!(page = page_number, "page failed: {e}");
                trace.push(page_number, TraceStage::Page, format!("page failed: {e}"));
                PageResult {
                    page_number,
                    status: PageStatus::Failed(e.to_string()),
                    block_count: 0,
                    slots: Vec::new(),
                }
            }
        };
        results.push(result);
    }

    let slots = results.iter().flat_map(|p| p.slots.iter().cloned()).collect();
    Ok(ScheduleResult {
        slots,
        pages: results,
        trace,
    })
}

/// Parse a single in-memory raster.
pub fn parse_image(
    image: &RgbImage,
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
) -> Result<ScheduleResult, ScheduleError> {
    parse_pages(vec![Ok(image.clone())], ocr, config)
}
