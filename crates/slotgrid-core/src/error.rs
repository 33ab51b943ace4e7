use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("pdftoppm not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftoppmNotFound,

    #[error("pdftoppm failed with exit code {code}: {stderr}")]
    PdftoppmFailed { code: i32, stderr: String },

    #[error("tesseract not found. Install it: brew install tesseract tesseract-lang (macOS) or apt install tesseract-ocr tesseract-ocr-kor (Linux)")]
    TesseractNotFound,

    #[error("tesseract failed with exit code {code}: {stderr}")]
    TesseractFailed { code: i32, stderr: String },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("malformed time label '{0}'")]
    MalformedTimeLabel(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
