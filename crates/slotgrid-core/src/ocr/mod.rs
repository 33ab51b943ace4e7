pub mod tesseract;

use image::{DynamicImage, RgbImage};

use crate::error::ScheduleError;
use crate::imaging::binarize::{otsu_binarize, to_gray};
use crate::imaging::crop_rgb;
use crate::model::{PixelBox, TextToken};

/// Page segmentation strategy requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// A uniform block of text (Tesseract `--psm 6`).
    Block,
    /// A single text line (Tesseract `--psm 7`).
    SingleLine,
}

impl SegmentationMode {
    pub fn psm(self) -> u8 {
        match self {
            SegmentationMode::Block => 6,
            SegmentationMode::SingleLine => 7,
        }
    }
}

/// Pixel preparation applied to the crop before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocess {
    None,
    Otsu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    pub languages: String,
    pub mode: SegmentationMode,
    pub preprocess: Preprocess,
}

impl OcrRequest {
    pub fn new(languages: &str, mode: SegmentationMode) -> Self {
        Self {
            languages: languages.to_string(),
            mode,
            preprocess: Preprocess::None,
        }
    }

    pub fn binarized(mut self) -> Self {
        self.preprocess = Preprocess::Otsu;
        self
    }
}

/// Trait for OCR backends.
///
/// Calls are blocking and must be idempotent: the same pixels and request
/// yield the same tokens.
pub trait OcrEngine: Send + Sync {
    /// Recognize words inside `region` of `page`. Token boxes are returned
    /// in page coordinates.
    fn recognize(
        &self,
        page: &RgbImage,
        region: PixelBox,
        request: &OcrRequest,
    ) -> Result<Vec<TextToken>, ScheduleError>;

    /// Name of this OCR backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Crop `region` out of the page and apply the requested preprocessing.
pub fn prepare_region(
    page: &RgbImage,
    region: PixelBox,
    preprocess: Preprocess,
) -> Option<DynamicImage> {
    let crop = crop_rgb(page, region)?;
    Some(match preprocess {
        Preprocess::None => DynamicImage::ImageRgb8(crop),
        Preprocess::Otsu => DynamicImage::ImageLuma8(otsu_binarize(&to_gray(&crop))),
    })
}

/// Tokens joined into the engine's own text lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenLine {
    pub text: String,
    pub bbox: PixelBox,
}

/// Regroup tokens by their engine line key, words ordered left to right.
/// Tokens without a key become single-word lines.
pub fn engine_lines(tokens: &[TextToken]) -> Vec<TokenLine> {
    let mut groups: Vec<(Option<crate::model::LineKey>, Vec<&TextToken>)> = Vec::new();
    for token in tokens {
        match token.line_key {
            Some(key) => match groups.iter_mut().find(|(k, _)| *k == Some(key)) {
                Some((_, members)) => members.push(token),
                None => groups.push((Some(key), vec![token])),
            },
            None => groups.push((None, vec![token])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, mut members)| {
            members.sort_by_key(|t| t.bbox.left);
            let text = members
                .iter()
                .map(|t| t.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            let bbox = members.iter().skip(1).fold(members[0].bbox, |acc, t| {
                PixelBox::new(
                    acc.left.min(t.bbox.left),
                    acc.top.min(t.bbox.top),
                    acc.right.max(t.bbox.right),
                    acc.bottom.max(t.bbox.bottom),
                )
            });
            Some(TokenLine { text, bbox })
        })
        .collect()
}

/// Tokens whose center falls inside `region`.
pub fn tokens_in<'a>(tokens: &'a [TextToken], region: &PixelBox) -> impl Iterator<Item = &'a TextToken> {
    let region = *region;
    tokens.iter().filter(move |t| {
        let (cx, cy) = t.center();
        region.contains_point(cx, cy)
    })
}
