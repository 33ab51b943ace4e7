//! Grid and layout resolution.
//!
//! Columns and rows are each resolved by an ordered chain of strategies
//! (ruled lines, label text, word-position histogram) and degrade to fixed
//! defaults, so resolution itself never fails.

pub mod columns;
pub mod edges;
pub mod labels;
pub mod lines;
pub mod rows;

use image::RgbImage;

use crate::config::schema::{LayoutConfig, ParserConfig};
use crate::config::tables::CompiledTables;
use crate::imaging::binarize::{adaptive_threshold_inv, to_gray};
use crate::model::{ColumnLayout, RowLayout, TextToken};
use crate::ocr::OcrEngine;
use crate::trace::{PageTrace, TraceStage};
use labels::AxisLabels;
use lines::GridLines;

/// Read-only inputs shared by every layout strategy.
pub struct LayoutContext<'a> {
    pub width: u32,
    pub height: u32,
    pub tokens: &'a [TextToken],
    pub lines: &'a GridLines,
    /// Height of the assumed header band.
    pub header_height: u32,
    pub time_axis_guess: u32,
    pub config: &'a LayoutConfig,
    pub tables: &'a CompiledTables,
}

impl LayoutContext<'_> {
    pub fn min_column_width(&self) -> u32 {
        (self.width as f32 * self.config.min_day_column_fraction) as u32
    }
}

/// Everything the later stages need from the layout pass.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub columns: ColumnLayout,
    pub rows: RowLayout,
    pub axis: AxisLabels,
}

fn format_starts(rows: &RowLayout) -> String {
    match (rows.rows.first(), rows.rows.last()) {
        (Some(first), Some(last)) => format!("{}..{}", first.start, last.start),
        _ => "none".to_string(),
    }
}

/// Resolve the column and row layout of one page.
pub fn resolve_layout(
    page: &RgbImage,
    tokens: &[TextToken],
    ocr: &dyn OcrEngine,
    config: &ParserConfig,
    tables: &CompiledTables,
    trace: &mut PageTrace,
) -> PageLayout {
    let (width, height) = page.dimensions();
    let layout_cfg = &config.layout;

    let ink = adaptive_threshold_inv(
        &to_gray(page),
        layout_cfg.adaptive_block_radius,
        layout_cfg.adaptive_offset,
    );
    let grid = lines::detect_grid_lines(&ink, layout_cfg.line_kernel_fraction);
    trace.note(
        TraceStage::Lines,
        format!("x_lines={}, y_lines={}", grid.vertical.len(), grid.horizontal.len()),
    );

    let ctx = LayoutContext {
        width,
        height,
        tokens,
        lines: &grid,
        header_height: (height as f32 * layout_cfg.header_fraction) as u32,
        time_axis_guess: columns::guess_time_axis(tokens, width, height),
        config: layout_cfg,
        tables,
    };

    let mut column_layout = columns::COLUMN_CHAIN
        .iter()
        .find_map(|(name, strategy)| {
            let found = strategy(&ctx);
            if found.is_none() {
                trace.note(TraceStage::Columns, format!("{name}: insufficient signal"));
            }
            found
        })
        .unwrap_or_else(|| columns::fallback(&ctx));
    trace.note(
        TraceStage::Columns,
        format!(
            "strategy={} time_axis={} columns={}",
            column_layout.strategy,
            column_layout.time_axis_right,
            column_layout.columns.len()
        ),
    );

    if layout_cfg.assume_uniform_days {
        if let Some(expanded) = columns::expand_uniform(&column_layout, width, layout_cfg.day_columns) {
            trace.note(
                TraceStage::Columns,
                format!(
                    "uniform expansion {} -> {} columns",
                    column_layout.columns.len(),
                    expanded.columns.len()
                ),
            );
            column_layout = expanded;
        }
    }

    let strip = ((height as f32 * layout_cfg.header_ocr_fraction) as u32).max(2);
    let read = columns::label_weekdays(
        &mut column_layout,
        page,
        ocr,
        &config.fields.languages,
        strip,
        tables,
    );
    let days: Vec<&str> = column_layout.columns.iter().map(|c| c.weekday.as_str()).collect();
    trace.note(
        TraceStage::Columns,
        format!("weekdays={} (headers read {}/{})", days.join(","), read, days.len()),
    );

    let axis = labels::read_axis_labels(tokens, column_layout.time_axis_right, tables);
    let resolved = rows::resolve_rows(&ctx, &axis);
    trace.note(
        TraceStage::Rows,
        format!(
            "strategy={} header_bottom={} rows={} labels={} malformed={}",
            resolved.layout.strategy,
            resolved.layout.header_bottom,
            resolved.layout.rows.len(),
            axis.labels.len(),
            axis.malformed
        ),
    );
    if resolved.labels_aligned {
        trace.note(TraceStage::Rows, format!("starts={}", format_starts(&resolved.layout)));
    } else {
        trace.note(
            TraceStage::Rows,
            format!(
                "fallback to base hour {:02}:00 starts={}",
                layout_cfg.base_hour,
                format_starts(&resolved.layout)
            ),
        );
    }

    PageLayout {
        columns: column_layout,
        rows: resolved.layout,
        axis,
    }
}
