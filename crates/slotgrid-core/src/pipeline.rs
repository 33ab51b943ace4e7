//! Single-page parse: layout, blocks, timing, fields, assembly.

use image::RgbImage;
use std::collections::BTreeMap;

use crate::assemble::{assemble, block_support, SlotDraft};
use crate::blocks::extract_blocks;
use crate::config::schema::ParserConfig;
use crate::config::tables::CompiledTables;
use crate::fields::{extract_fields, BlockFields};
use crate::layout::{resolve_layout, PageLayout};
use crate::model::{ClockTime, PageResult, PageStatus, ParsedSlot, PixelBox, TextToken, Weekday};
use crate::ocr::{OcrEngine, OcrRequest, SegmentationMode};
use crate::timing::anchors::AnchorModel;
use crate::timing::offset::estimate_offset;
use crate::timing::TimeModel;
use crate::trace::{DiagnosticTrace, PageTrace, TraceStage};

fn clock(minutes: f32) -> ClockTime {
    ClockTime::from_minutes(minutes.round().max(0.0) as u32)
}

/// Whole-page OCR. A failing engine leaves the page with no tokens; the
/// layout chain still has the ruled lines to work with.
pub fn page_tokens(
    page: &RgbImage,
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
    trace: &mut PageTrace,
) -> Vec<TextToken> {
    let (width, height) = page.dimensions();
    let request = OcrRequest::new(&config.fields.languages, SegmentationMode::Block);
    match ocr.recognize(page, PixelBox::new(0, 0, width, height), &request) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(page = trace.page_number(), "page OCR failed: {e}");
            trace.note(TraceStage::Page, format!("page OCR failed: {e}"));
            Vec::new()
        }
    }
}

fn unresolved(page_number: usize, trace: &mut PageTrace, reason: String) -> PageResult {
    trace.note(TraceStage::Guard, reason);
    PageResult {
        page_number,
        status: PageStatus::LayoutUnresolved,
        block_count: 0,
        slots: Vec::new(),
    }
}

fn layout_guard(layout: &PageLayout) -> Option<String> {
    let (cols, rows) = (layout.columns.band_count(), layout.rows.band_count());
    (cols < 2 || rows < 2).then(|| format!("insufficient bands (columns={cols}, rows={rows}), page skipped"))
}

/// Parse one rendered page into slots, recording every decision in `trace`.
pub fn parse_page(
    page_number: usize,
    page: &RgbImage,
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
    tables: &CompiledTables,
    trace: &mut DiagnosticTrace,
) -> PageResult {
    let mut trace = PageTrace::new(page_number, trace);
    let (width, height) = page.dimensions();
    trace.note(
        TraceStage::Page,
        format!("size={width}x{height} ocr={}", ocr.backend_name()),
    );

    let tokens = page_tokens(page, ocr, config, &mut trace);
    let layout = resolve_layout(page, &tokens, ocr, config, tables, &mut trace);
    if let Some(reason) = layout_guard(&layout) {
        return unresolved(page_number, &mut trace, reason);
    }
    let Some(model) = TimeModel::from_rows(&layout.rows) else {
        return unresolved(page_number, &mut trace, "rows have no height, page skipped".into());
    };

    let (model, bias) = model.calibrated(&layout.axis.labels, config.timing.label_calibration_limit);
    trace.note(
        TraceStage::TimeModel,
        format!(
            "origin_y={:.1} origin={} px_per_hour={:.1} calibration={}",
            model.origin_y,
            clock(model.origin_minutes),
            model.px_per_hour,
            bias.map_or("none".to_string(), |b| format!("{b:+.1}min")),
        ),
    );

    let blocks = extract_blocks(page, &tokens, &layout.columns, &layout.rows, &config.blocks, &mut trace);

    let mut samples: BTreeMap<Weekday, Vec<(f32, f32)>> = BTreeMap::new();
    for b in &blocks {
        samples
            .entry(b.weekday)
            .or_default()
            .push((model.minutes_at(b.bbox.top as f32), model.minutes_at(b.bbox.bottom as f32)));
    }
    let anchor_models: BTreeMap<Weekday, AnchorModel> = samples
        .iter()
        .map(|(&day, day_samples)| {
            let step = config.timing.step_for(day);
            let est = estimate_offset(day_samples, step, &config.timing);
            trace.note(
                TraceStage::Anchor,
                format!(
                    "{day} step={step}min, offset={}min (coverage={:.2}, mae={:.1})",
                    est.offset, est.coverage, est.mae
                ),
            );
            (day, AnchorModel::new(step, est.offset))
        })
        .collect();

    let mut drafts = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let anchors = anchor_models
            .get(&block.weekday)
            .copied()
            .unwrap_or_else(|| AnchorModel::new(config.timing.step_for(block.weekday), 0));
        let (raw_start, raw_end) = (
            model.minutes_at(block.bbox.top as f32),
            model.minutes_at(block.bbox.bottom as f32),
        );
        let span = anchors.snap_span(raw_start, raw_end, &config.timing);
        let (start, end) = (ClockTime::from_minutes(span.start), ClockTime::from_minutes(span.end));
        trace.note(
            TraceStage::Snap,
            format!(
                "{} #{i} y={}..{} raw={}..{} -> {start}..{end} ({}/{}){}",
                block.weekday,
                block.bbox.top,
                block.bbox.bottom,
                clock(raw_start),
                clock(raw_end),
                span.start_rule.as_str(),
                span.end_rule.as_str(),
                if span.end_forced { " end forced" } else { "" },
            ),
        );

        let fields = match extract_fields(page, block.bbox, ocr, &config.fields, tables) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(page = page_number, block = i, "block OCR failed: {e}");
                trace.note(TraceStage::Fields, format!("{} #{i} OCR failed: {e}", block.weekday));
                BlockFields::default()
            }
        };
        trace.note(
            TraceStage::Fields,
            format!(
                "{} #{i} title={:?} instructor={:?} room={:?}",
                block.weekday, fields.title, fields.instructor, fields.room
            ),
        );

        let support = if config.assembly.suppress_redundant {
            block_support(page, &tokens, block.bbox, &config.blocks)
        } else {
            0.0
        };
        drafts.push(SlotDraft {
            slot: ParsedSlot {
                weekday: block.weekday,
                start,
                end,
                title: fields.title,
                instructor: fields.instructor,
                room: fields.room,
                raw_text: fields.raw_text,
            },
            support,
        });
    }

    let slots = assemble(drafts, &config.assembly, &mut trace);
    tracing::info!(
        page = page_number,
        blocks = blocks.len(),
        slots = slots.len(),
        "page parsed"
    );
    PageResult {
        page_number,
        status: PageStatus::Parsed,
        block_count: blocks.len(),
        slots,
    }
}
