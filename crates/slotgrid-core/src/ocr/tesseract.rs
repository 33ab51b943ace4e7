use serde::Deserialize;
use std::process::Command;

use image::{ImageFormat, RgbImage};

use crate::error::ScheduleError;
use crate::model::{LineKey, PixelBox, TextToken};
use crate::ocr::{prepare_region, OcrEngine, OcrRequest};

/// OCR backend that shells out to the `tesseract` CLI and reads its TSV
/// output.
pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::with_binary("tesseract")
    }

    /// Use a specific executable path instead of the one on `PATH`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        TesseractCli {
            binary: binary.into(),
        }
    }

    /// Check if tesseract is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(
        &self,
        page: &RgbImage,
        region: PixelBox,
        request: &OcrRequest,
    ) -> Result<Vec<TextToken>, ScheduleError> {
        let Some(crop) = prepare_region(page, region, request.preprocess) else {
            return Ok(Vec::new());
        };

        let tmpfile = tempfile::Builder::new().suffix(".png").tempfile()?;
        crop.save_with_format(tmpfile.path(), ImageFormat::Png)?;

        let output = Command::new(&self.binary)
            .arg(tmpfile.path())
            .arg("stdout")
            .args(["-l", &request.languages])
            .args(["--psm", &request.mode.psm().to_string()])
            .args(["--oem", "1"])
            .args(["-c", "preserve_interword_spaces=1"])
            .arg("tsv")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScheduleError::TesseractNotFound
                } else {
                    ScheduleError::Ocr(format!("tesseract failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ScheduleError::TesseractFailed { code, stderr });
        }

        parse_tsv(output.stdout.as_slice(), region.left, region.top)
    }

    fn backend_name(&self) -> &str {
        "tesseract"
    }
}

/// One row of Tesseract's TSV output.
#[derive(Debug, Deserialize)]
struct TsvRecord {
    level: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
    conf: f32,
    #[serde(default)]
    text: String,
}

const WORD_LEVEL: u32 = 5;

/// Parse word rows out of a TSV stream, shifting boxes by the crop origin.
pub fn parse_tsv<R: std::io::Read>(
    reader: R,
    origin_x: u32,
    origin_y: u32,
) -> Result<Vec<TextToken>, ScheduleError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut tokens = Vec::new();
    for record in rdr.deserialize() {
        let record: TsvRecord = record?;
        let text = record.text.trim();
        if record.level != WORD_LEVEL || text.is_empty() {
            continue;
        }
        let left = origin_x as i64 + record.left.max(0);
        let top = origin_y as i64 + record.top.max(0);
        tokens.push(TextToken {
            text: text.to_string(),
            bbox: PixelBox::new(
                left as u32,
                top as u32,
                (left + record.width.max(0)) as u32,
                (top + record.height.max(0)) as u32,
            ),
            confidence: record.conf,
            line_key: Some(LineKey {
                block: record.block_num,
                paragraph: record.par_num,
                line: record.line_num,
            }),
        });
    }
    Ok(tokens)
}
