//! Integration tests for the full parse pipeline.
//!
//! Uses a MockOcr that returns scripted tokens (page coordinates) filtered
//! by the requested region, over rasters drawn with imageproc, so these
//! tests run without tesseract or poppler-utils.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

use slotgrid_core::config::builtin::load_preset;
use slotgrid_core::config::schema::ParserConfig;
use slotgrid_core::config::tables::CompiledTables;
use slotgrid_core::error::ScheduleError;
use slotgrid_core::ingest::{PageImage, PageRenderer};
use slotgrid_core::layout::resolve_layout;
use slotgrid_core::model::{ClockTime, LineKey, PageStatus, PixelBox, TextToken, Weekday};
use slotgrid_core::ocr::{OcrEngine, OcrRequest};
use slotgrid_core::trace::{DiagnosticTrace, PageTrace, TraceStage};
use slotgrid_core::{parse_document, parse_image, parse_pages};

const W: u32 = 1160;
const H: u32 = 1000;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([40, 40, 40]);
const PASTEL: Rgb<u8> = Rgb([230, 240, 255]);

/// Column rules; day columns are Mon (150..350) through Fri (950..1160).
const VERTICAL_RULES: [u32; 5] = [150, 350, 550, 750, 950];

struct MockOcr {
    tokens: Vec<TextToken>,
    /// Requests for regions inside this box fail.
    fail_within: Option<PixelBox>,
}

impl MockOcr {
    fn new(tokens: Vec<TextToken>) -> Self {
        Self {
            tokens,
            fail_within: None,
        }
    }
}

impl OcrEngine for MockOcr {
    fn recognize(
        &self,
        _page: &RgbImage,
        region: PixelBox,
        _request: &OcrRequest,
    ) -> Result<Vec<TextToken>, ScheduleError> {
        if let Some(zone) = self.fail_within {
            if zone.intersect(&region) == Some(region) {
                return Err(ScheduleError::Ocr("mock engine crashed".into()));
            }
        }
        Ok(self
            .tokens
            .iter()
            .filter(|t| {
                let (x, y) = t.center();
                region.contains_point(x, y)
            })
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct NoPdf;

impl PageRenderer for NoPdf {
    fn render_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageImage>, ScheduleError> {
        Err(ScheduleError::PdftoppmNotFound)
    }

    fn backend_name(&self) -> &str {
        "none"
    }
}

fn tok(text: &str, left: u32, top: u32, right: u32, bottom: u32, line: u32) -> TextToken {
    TextToken {
        text: text.into(),
        bbox: PixelBox::new(left, top, right, bottom),
        confidence: 91.0,
        line_key: Some(LineKey {
            block: 1,
            paragraph: 1,
            line,
        }),
    }
}

/// White page with five day columns and hour rules every 100px from y=100.
fn ruled_grid() -> RgbImage {
    let mut img = RgbImage::from_pixel(W, H, WHITE);
    for x in VERTICAL_RULES {
        draw_filled_rect_mut(&mut img, Rect::at(x as i32, 0).of_size(2, H), INK);
    }
    for y in (100..=900).step_by(100) {
        draw_filled_rect_mut(&mut img, Rect::at(0, y).of_size(W, 2), INK);
    }
    img
}

fn paint(img: &mut RgbImage, left: u32, top: u32, right: u32, bottom: u32, color: Rgb<u8>) {
    draw_filled_rect_mut(
        img,
        Rect::at(left as i32, top as i32).of_size(right - left, bottom - top),
        color,
    );
}

/// Weekday headers above each column and 9시..17시 labels in the left margin.
fn grid_tokens() -> Vec<TextToken> {
    let mut tokens = Vec::new();
    let mut edges = VERTICAL_RULES.to_vec();
    edges.push(W);
    for (i, (w, name)) in edges.windows(2).zip(["월", "화", "수", "목", "금"]).enumerate() {
        let cx = (w[0] + w[1]) / 2;
        tokens.push(tok(name, cx - 12, 40, cx + 12, 64, 1 + i as u32));
    }
    for i in 0..9u32 {
        let hour = 9 + i;
        let (meridiem, shown) = match hour {
            h if h < 12 => ("오전", h),
            12 => ("오후", 12),
            h => ("오후", h - 12),
        };
        let cy = 150 + 100 * i;
        tokens.push(tok(meridiem, 8, cy - 10, 40, cy + 10, 100 + i));
        tokens.push(tok(&format!("{shown}시"), 44, cy - 10, 80, cy + 10, 100 + i));
    }
    tokens
}

/// Course, instructor and room lines inside a block whose top-left text
/// origin is (`x`, `y`).
fn block_text(title: &str, instructor: &str, room: &str, x: u32, y: u32, line: u32) -> Vec<TextToken> {
    vec![
        tok(title, x + 20, y + 40, x + 120, y + 70, line),
        tok(instructor, x, y + 90, x + 60, y + 115, line + 1),
        tok(room, x + 70, y + 90, x + 150, y + 115, line + 1),
    ]
}

fn wednesday_on_90() -> ParserConfig {
    let mut config = ParserConfig::default();
    config.timing.weekday_steps.insert(Weekday::Wed, 90);
    config
}

fn hm(s: &str) -> ClockTime {
    ClockTime::parse(s).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario A: one Wednesday block on a 90-minute grid
// ---------------------------------------------------------------------------
#[test]
fn scenario_a_single_wednesday_block() {
    let mut img = ruled_grid();
    // 10:30 to 12:00 at 100px per hour from 09:00 at y=100.
    paint(&mut img, 552, 250, 748, 400, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 580, 250, 500));

    let result = parse_image(&img, &MockOcr::new(tokens), &wednesday_on_90()).unwrap();

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.pages[0].status, PageStatus::Parsed);
    assert_eq!(result.slots.len(), 1);
    let slot = &result.slots[0];
    assert_eq!(slot.weekday, Weekday::Wed);
    assert_eq!(slot.start.to_string(), "10:30");
    assert_eq!(slot.end.to_string(), "12:00");
    assert_eq!(slot.title, "품질공학");
    assert_eq!(slot.instructor.as_deref(), Some("김민수"));
    assert_eq!(slot.room.as_deref(), Some("공5-301"));

    let lines = result.trace.lines();
    assert!(lines.iter().any(|l| l.starts_with("[COL] strategy=grid-lines")));
    assert!(lines.iter().any(|l| l.starts_with("[ANCHOR] Wed step=90min")));
    assert!(lines.iter().any(|l| l.starts_with("[SNAP] Wed")));
}

// ---------------------------------------------------------------------------
// Scenario B: blank page degrades to uniform layout with no blocks
// ---------------------------------------------------------------------------
#[test]
fn scenario_b_blank_page_is_empty_but_not_fatal() {
    let img = RgbImage::from_pixel(W, H, WHITE);
    let result = parse_image(&img, &MockOcr::new(Vec::new()), &ParserConfig::default()).unwrap();

    assert!(result.slots.is_empty());
    assert_eq!(result.pages[0].status, PageStatus::Parsed);
    assert_eq!(result.pages[0].block_count, 0);

    let lines = result.trace.lines();
    assert!(lines.iter().any(|l| l.contains("uniform expansion 1 -> 5 columns")));
    let block_events: Vec<_> = result.trace.stage_events(TraceStage::Blocks).collect();
    assert_eq!(block_events.len(), 5);
    assert!(block_events.iter().all(|e| e.message.ends_with("comps=0")));
}

#[test]
fn scenario_b_low_contrast_page() {
    let mut img = RgbImage::from_pixel(W, H, Rgb([250, 250, 250]));
    paint(&mut img, 300, 300, 700, 600, Rgb([246, 246, 246]));
    let result = parse_image(&img, &MockOcr::new(Vec::new()), &ParserConfig::default()).unwrap();
    assert!(result.slots.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario C: near-duplicate blocks and redundancy suppression
// ---------------------------------------------------------------------------
fn duplicate_blocks() -> (RgbImage, Vec<TextToken>) {
    let mut img = ruled_grid();
    // Solid block on the left, hollow frame on the right, same rows.
    paint(&mut img, 555, 250, 640, 400, PASTEL);
    paint(&mut img, 660, 250, 745, 400, PASTEL);
    paint(&mut img, 675, 270, 730, 380, WHITE);

    let mut tokens = grid_tokens();
    tokens.extend(vec![
        tok("품질공학", 565, 290, 635, 315, 600),
        tok("김민수", 562, 340, 598, 360, 601),
        tok("공5-301", 600, 340, 638, 360, 601),
        tok("품질공학", 670, 290, 740, 315, 700),
        tok("이영희", 667, 340, 703, 360, 701),
        tok("공5-301", 705, 340, 743, 360, 701),
    ]);
    (img, tokens)
}

#[test]
fn scenario_c_suppression_keeps_denser_block() {
    let (img, tokens) = duplicate_blocks();
    let mut config = wednesday_on_90();
    config.assembly.suppress_redundant = true;

    let result = parse_image(&img, &MockOcr::new(tokens), &config).unwrap();

    assert_eq!(result.pages[0].block_count, 2);
    assert_eq!(result.slots.len(), 1);
    assert_eq!(result.slots[0].instructor.as_deref(), Some("김민수"));
    assert_eq!(result.slots[0].title, "품질공학");
}

#[test]
fn scenario_c_without_suppression_keeps_both() {
    let (img, tokens) = duplicate_blocks();
    let result = parse_image(&img, &MockOcr::new(tokens), &wednesday_on_90()).unwrap();

    assert_eq!(result.slots.len(), 2);
    assert!(result
        .slots
        .iter()
        .all(|s| s.weekday == Weekday::Wed && s.start == hm("10:30") && s.end == hm("12:00")));
}

// ---------------------------------------------------------------------------
// Round trip: known grid, known half-hour-phase block, misread title
// ---------------------------------------------------------------------------
#[test]
fn round_trip_recovers_offset_and_corrects_title() {
    let mut img = ruled_grid();
    // Tuesday 09:30 to 11:00.
    paint(&mut img, 352, 150, 548, 300, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공핵", "박지훈", "공3-210", 380, 150, 500));

    let result = parse_image(&img, &MockOcr::new(tokens), &ParserConfig::default()).unwrap();

    assert_eq!(result.slots.len(), 1);
    let slot = &result.slots[0];
    assert_eq!(
        (slot.weekday, slot.start, slot.end),
        (Weekday::Tue, hm("09:30"), hm("11:00"))
    );
    assert_eq!(slot.title, "품질공학");
    assert_eq!(slot.instructor.as_deref(), Some("박지훈"));
    assert!(result
        .trace
        .lines()
        .iter()
        .any(|l| l.starts_with("[ANCHOR] Tue step=90min, offset=30min")));
}

// ---------------------------------------------------------------------------
// Ordering invariant and block-level OCR failure
// ---------------------------------------------------------------------------
#[test]
fn block_ocr_failure_keeps_time_span() {
    let mut img = ruled_grid();
    paint(&mut img, 552, 250, 748, 400, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 580, 250, 500));
    let ocr = MockOcr {
        tokens,
        fail_within: Some(PixelBox::new(550, 240, 750, 410)),
    };

    let result = parse_image(&img, &ocr, &wednesday_on_90()).unwrap();

    assert_eq!(result.slots.len(), 1);
    let slot = &result.slots[0];
    assert_eq!((slot.start, slot.end), (hm("10:30"), hm("12:00")));
    assert!(slot.title.is_empty());
    assert!(slot.instructor.is_none() && slot.room.is_none());
    assert!(result
        .trace
        .stage_events(TraceStage::Fields)
        .any(|e| e.message.contains("OCR failed")));
}

#[test]
fn every_slot_spans_at_least_one_step() {
    let mut img = ruled_grid();
    // A short Monday block, well under an hour tall.
    paint(&mut img, 152, 410, 348, 440, PASTEL);
    let mut tokens = grid_tokens();
    tokens.push(tok("품질공학", 200, 415, 300, 435, 500));

    let config = ParserConfig::default();
    let result = parse_image(&img, &MockOcr::new(tokens), &config).unwrap();

    assert_eq!(result.slots.len(), 1);
    for slot in &result.slots {
        let step = config.timing.step_for(slot.weekday);
        assert!(slot.end.minutes() >= slot.start.minutes() + step);
    }
}

// ---------------------------------------------------------------------------
// Contiguous merge with the hourly preset
// ---------------------------------------------------------------------------
#[test]
fn hourly_preset_merges_back_to_back_periods() {
    let mut img = ruled_grid();
    paint(&mut img, 152, 102, 348, 198, PASTEL);
    paint(&mut img, 152, 202, 348, 298, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 170, 80, 500));
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 170, 180, 600));

    let config = load_preset("ko-univ-hourly").unwrap();
    let result = parse_image(&img, &MockOcr::new(tokens), &config).unwrap();

    assert_eq!(result.pages[0].block_count, 2);
    assert_eq!(result.slots.len(), 1);
    assert_eq!(
        (result.slots[0].weekday, result.slots[0].start, result.slots[0].end),
        (Weekday::Mon, hm("09:00"), hm("11:00"))
    );
}

// ---------------------------------------------------------------------------
// Layout invariants
// ---------------------------------------------------------------------------
#[test]
fn resolved_layouts_are_well_formed() {
    let config = ParserConfig::default();
    let tables = CompiledTables::compile(&config.tables).unwrap();
    let ruled = ruled_grid();
    let blank = RgbImage::from_pixel(W, H, WHITE);

    for (img, tokens) in [(&ruled, grid_tokens()), (&blank, Vec::new())] {
        let ocr = MockOcr::new(tokens.clone());
        let mut trace = DiagnosticTrace::default();
        let mut page = PageTrace::new(1, &mut trace);
        let layout = resolve_layout(img, &tokens, &ocr, &config, &tables, &mut page);

        assert!(layout.columns.is_well_formed());
        assert_eq!(layout.columns.columns.len(), config.layout.day_columns);
        assert!(layout.rows.labels_strictly_increasing());
    }
}

#[test]
fn ruled_grid_reads_headers_and_labels() {
    let config = ParserConfig::default();
    let tables = CompiledTables::compile(&config.tables).unwrap();
    let tokens = grid_tokens();
    let mut trace = DiagnosticTrace::default();
    let mut page = PageTrace::new(1, &mut trace);
    let layout = resolve_layout(&ruled_grid(), &tokens, &MockOcr::new(tokens.clone()), &config, &tables, &mut page);

    let days: Vec<Weekday> = layout.columns.columns.iter().map(|c| c.weekday).collect();
    assert_eq!(
        days,
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    );
    assert_eq!(layout.rows.header_bottom, 100);
    assert_eq!(layout.rows.rows.len(), 9);
    assert_eq!(layout.rows.rows[0].start, hm("09:00"));
    assert_eq!(layout.rows.rows[8].start, hm("17:00"));
    assert_eq!(layout.axis.labels.len(), 9);
}

#[test]
fn fallback_rows_count_up_from_base_hour() {
    let mut config = ParserConfig::default();
    config.layout.base_hour = 8;
    let tables = CompiledTables::compile(&config.tables).unwrap();
    // Column rules only: no row evidence at all.
    let mut img = RgbImage::from_pixel(W, H, WHITE);
    for x in VERTICAL_RULES {
        draw_filled_rect_mut(&mut img, Rect::at(x as i32, 0).of_size(2, H), INK);
    }
    let mut trace = DiagnosticTrace::default();
    let mut page = PageTrace::new(1, &mut trace);
    let layout = resolve_layout(&img, &[], &MockOcr::new(Vec::new()), &config, &tables, &mut page);

    assert_eq!(layout.rows.rows[0].start, hm("08:00"));
    assert!(layout.rows.labels_strictly_increasing());
    assert!(trace.lines().iter().any(|l| l.contains("fallback to base hour 08:00")));
}

// ---------------------------------------------------------------------------
// Page guard and page isolation
// ---------------------------------------------------------------------------
#[test]
fn degenerate_page_is_layout_unresolved() {
    let img = RgbImage::from_pixel(3, 3, WHITE);
    let result = parse_image(&img, &MockOcr::new(Vec::new()), &ParserConfig::default()).unwrap();

    assert_eq!(result.pages[0].status, PageStatus::LayoutUnresolved);
    assert!(result.slots.is_empty());
    assert_eq!(result.trace.stage_events(TraceStage::Guard).count(), 1);
}

#[test]
fn failed_page_does_not_abort_siblings() {
    let mut img = ruled_grid();
    paint(&mut img, 552, 250, 748, 400, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 580, 250, 500));

    let pages: Vec<PageImage> = vec![
        Ok(img),
        Err(ScheduleError::UnsupportedInput("corrupt page".into())),
        Ok(RgbImage::from_pixel(W, H, WHITE)),
    ];
    let result = parse_pages(pages, &MockOcr::new(tokens), &wednesday_on_90()).unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.pages[0].status, PageStatus::Parsed);
    assert!(matches!(result.pages[1].status, PageStatus::Failed(_)));
    assert_eq!(result.pages[2].status, PageStatus::Parsed);
    assert_eq!(result.pages[0].slots.len(), 1);
    assert!(result.pages[1].slots.is_empty());
    assert_eq!(
        result.slots.len(),
        result.pages.iter().map(|p| p.slots.len()).sum::<usize>()
    );
    assert!(result.trace.lines().contains(&"---".to_string()));
}

// ---------------------------------------------------------------------------
// Document entry point
// ---------------------------------------------------------------------------
#[test]
fn png_bytes_parse_like_the_raster() {
    let mut img = ruled_grid();
    paint(&mut img, 552, 250, 748, 400, PASTEL);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 580, 250, 500));

    let result = parse_document(&bytes, &NoPdf, &MockOcr::new(tokens), &wednesday_on_90()).unwrap();
    assert_eq!(result.slots.len(), 1);
    assert_eq!(result.slots[0].title, "품질공학");
}

#[test]
fn undecodable_input_is_an_error() {
    let err = parse_document(b"not an image", &NoPdf, &MockOcr::new(Vec::new()), &ParserConfig::default());
    assert!(matches!(err, Err(ScheduleError::UnsupportedInput(_))));
}

#[test]
fn conflicting_assembly_options_are_rejected() {
    let mut config = ParserConfig::default();
    config.assembly.merge_contiguous = true;
    config.assembly.suppress_redundant = true;
    let img = RgbImage::from_pixel(W, H, WHITE);
    let err = parse_image(&img, &MockOcr::new(Vec::new()), &config);
    assert!(matches!(err, Err(ScheduleError::ConfigInvalid(_))));
}

#[test]
fn slots_serialize_with_clock_strings() {
    let mut img = ruled_grid();
    paint(&mut img, 552, 250, 748, 400, PASTEL);
    let mut tokens = grid_tokens();
    tokens.extend(block_text("품질공학", "김민수", "공5-301", 580, 250, 500));
    let result = parse_image(&img, &MockOcr::new(tokens), &wednesday_on_90()).unwrap();

    let json = serde_json::to_value(&result.slots).unwrap();
    assert_eq!(json[0]["weekday"], "Wed");
    assert_eq!(json[0]["start"], "10:30");
    assert_eq!(json[0]["end"], "12:00");
}
