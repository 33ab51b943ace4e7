use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ScheduleError;
use crate::ingest::{PageImage, PageRenderer};

/// Fixed rasterization resolution for PDF pages.
pub const RENDER_DPI: u32 = 220;

/// PDF renderer using pdftoppm (from poppler-utils).
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new() -> Self {
        PdftoppmRenderer { dpi: RENDER_DPI }
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageImage>, ScheduleError> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::File::create(&pdf_path)?.write_all(pdf_bytes)?;

        let prefix = workdir.path().join("page");
        let output = Command::new("pdftoppm")
            .args(["-r", &self.dpi.to_string()])
            .arg("-png")
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScheduleError::PdftoppmNotFound
                } else {
                    ScheduleError::UnsupportedInput(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ScheduleError::PdftoppmFailed { code, stderr });
        }

        let pages = page_files(workdir.path())?
            .into_iter()
            .map(|path| {
                image::open(&path)
                    .map(|img| img.to_rgb8())
                    .map_err(|e| {
                        tracing::warn!(path = %path.display(), "page decode failed: {}", e);
                        ScheduleError::UnsupportedInput(format!("cannot decode rendered page: {}", e))
                    })
            })
            .collect();
        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// `page-<n>.png` files in page order. pdftoppm zero-pads `n` to the width
/// of the page count, so sort numerically.
fn page_files(dir: &Path) -> Result<Vec<PathBuf>, ScheduleError> {
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(n) = page_number_of(&path) {
            numbered.push((n, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

fn page_number_of(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
