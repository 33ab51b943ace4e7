pub mod pdftoppm;

use image::RgbImage;

use crate::error::ScheduleError;

/// One decoded page, or the reason it could not be decoded.
pub type PageImage = Result<RgbImage, ScheduleError>;

/// Trait for multi-page document renderers.
pub trait PageRenderer: Send + Sync {
    /// Render every page of a PDF, in page order.
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, ScheduleError>;

    /// Name of this rendering backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Decode uploaded bytes into page rasters.
///
/// PDFs go through `renderer`; everything else must be a single image the
/// `image` crate can read.
pub fn decode_input(
    bytes: &[u8],
    renderer: &dyn PageRenderer,
) -> Result<Vec<PageImage>, ScheduleError> {
    if bytes.is_empty() {
        return Err(ScheduleError::UnsupportedInput("empty input".into()));
    }

    if is_pdf(bytes) {
        let pages = renderer.render_pages(bytes)?;
        if pages.is_empty() {
            return Err(ScheduleError::UnsupportedInput(
                "document has no pages".into(),
            ));
        }
        tracing::debug!(backend = renderer.backend_name(), pages = pages.len(), "rendered document");
        return Ok(pages);
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| ScheduleError::UnsupportedInput(format!("cannot decode image: {}", e)))?;
    Ok(vec![Ok(image.to_rgb8())])
}
