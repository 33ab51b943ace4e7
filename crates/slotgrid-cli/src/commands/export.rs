use slotgrid_core::error::ScheduleError;
use slotgrid_core::ingest::pdftoppm::PdftoppmRenderer;
use slotgrid_core::ocr::tesseract::TesseractCli;
use std::path::{Path, PathBuf};

use super::ConfigArgs;
use crate::output;

pub fn run(input_file: PathBuf, config_args: &ConfigArgs, dir: &Path) -> Result<(), ScheduleError> {
    let config = config_args.resolve()?;
    let bytes = std::fs::read(&input_file)?;
    if slotgrid_core::ingest::is_pdf(&bytes) && !PdftoppmRenderer::is_available() {
        return Err(ScheduleError::PdftoppmNotFound);
    }
    let ocr = TesseractCli::new();
    if !ocr.is_available() {
        return Err(ScheduleError::TesseractNotFound);
    }

    let result = slotgrid_core::parse_document(&bytes, &PdftoppmRenderer::new(), &ocr, &config)?;
    let written = slotgrid_core::export::write_subject_notes(&result.slots, dir)?;

    println!("Wrote {} note(s) to {}", written.len(), dir.display());
    for path in &written {
        println!("  {}", path.display());
    }
    output::table::print_page_warnings(&result);
    Ok(())
}
