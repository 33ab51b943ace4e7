use slotgrid_core::error::ScheduleError;
use slotgrid_core::ingest::pdftoppm::PdftoppmRenderer;
use slotgrid_core::model::PixelBox;
use slotgrid_core::ocr::tesseract::TesseractCli;
use slotgrid_core::ocr::{OcrEngine, OcrRequest, SegmentationMode};
use std::path::PathBuf;

use super::ConfigArgs;
use crate::output;

pub fn run(
    input_file: PathBuf,
    config_args: &ConfigArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
    show_trace: bool,
    dump_tokens: Option<PathBuf>,
) -> Result<(), ScheduleError> {
    let config = config_args.resolve()?;
    let bytes = std::fs::read(&input_file)?;
    if slotgrid_core::ingest::is_pdf(&bytes) && !PdftoppmRenderer::is_available() {
        return Err(ScheduleError::PdftoppmNotFound);
    }
    let renderer = PdftoppmRenderer::new();
    let ocr = TesseractCli::new();
    if !ocr.is_available() {
        return Err(ScheduleError::TesseractNotFound);
    }

    let pages = slotgrid_core::ingest::decode_input(&bytes, &renderer)?;

    if let Some(path) = dump_tokens {
        let request = OcrRequest::new(&config.fields.languages, SegmentationMode::Block);
        let mut dumped = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            if let Ok(image) = page {
                let region = PixelBox::new(0, 0, image.width(), image.height());
                dumped.push((i + 1, ocr.recognize(image, region, &request)?));
            }
        }
        let file = std::fs::File::create(&path)?;
        slotgrid_core::export::write_token_csv(&dumped, file)?;
        eprintln!("Tokens written to {}", path.display());
    }

    let result = slotgrid_core::parse_pages(pages, &ocr, &config)?;

    if show_trace {
        for line in result.trace.lines() {
            eprintln!("{line}");
        }
    }

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&result)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} slot(s) from {} page(s), written to {}",
                result.slots.len(),
                result.pages.len(),
                path.display()
            );
            output::table::print_page_warnings(&result);
        }
        None => match output_format {
            "json" => output::json::print(&result)?,
            _ => output::table::print(&result),
        },
    }

    Ok(())
}
