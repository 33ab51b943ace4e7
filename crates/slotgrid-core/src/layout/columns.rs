use image::RgbImage;

use super::edges::{
    group_positions, median_u32, midpoints, normalize_edges, outer_bounds, percentile, prune_slivers,
};
use super::labels::looks_like_time;
use super::LayoutContext;
use crate::config::tables::CompiledTables;
use crate::model::{ColumnLayout, ColumnStrategy, DayColumn, PixelBox, TextToken, Weekday};
use crate::ocr::{OcrEngine, OcrRequest, SegmentationMode};

/// Fewest label clusters that count as a week.
const MIN_LABEL_CLUSTERS: usize = 4;
const MIN_HISTOGRAM_TOKENS: usize = 20;

pub type ColumnStrategyFn = fn(&LayoutContext) -> Option<ColumnLayout>;

/// Column strategies in priority order; the first adequate result wins.
pub const COLUMN_CHAIN: [(ColumnStrategy, ColumnStrategyFn); 3] = [
    (ColumnStrategy::GridLines, from_grid_lines),
    (ColumnStrategy::HeaderLabels, from_header_labels),
    (ColumnStrategy::WordHistogram, from_word_histogram),
];

/// Build a layout from `[0, time_axis_right, day edges..., width]`, with
/// positional weekdays.
pub fn layout_from_edges(edges: &[u32], strategy: ColumnStrategy) -> Option<ColumnLayout> {
    if edges.len() < 2 {
        return None;
    }
    let columns = edges[1..]
        .windows(2)
        .enumerate()
        .map(|(i, w)| DayColumn {
            left: w[0],
            right: w[1],
            weekday: Weekday::from_index(i),
        })
        .collect();
    Some(ColumnLayout {
        time_axis_right: edges[1],
        columns,
        strategy,
        uniform_expanded: false,
    })
}

fn center_x(t: &TextToken) -> u32 {
    t.center().0 as u32
}

/// Right edge of the time-label column, from the spread of time-like tokens.
pub fn guess_time_axis(tokens: &[TextToken], width: u32, height: u32) -> u32 {
    let cutoff = height as f32 * 0.85;
    let xs: Vec<f32> = tokens
        .iter()
        .filter(|t| (t.bbox.top as f32) < cutoff && looks_like_time(&t.text))
        .map(|t| t.center().0)
        .collect();
    let guess = match percentile(&xs, 95.0) {
        Some(p) => p as u32 + 10,
        None => (width as f32 * 0.20) as u32,
    };
    guess.clamp((width as f32 * 0.10) as u32, (width as f32 * 0.35) as u32)
}

pub fn from_grid_lines(ctx: &LayoutContext) -> Option<ColumnLayout> {
    if ctx.lines.vertical.len() < ctx.config.min_vertical_lines {
        return None;
    }
    let mut edges = vec![0];
    edges.extend(&ctx.lines.vertical);
    edges.push(ctx.width);
    let edges = prune_slivers(&normalize_edges(edges, ctx.width), ctx.min_column_width());
    layout_from_edges(&edges, ColumnStrategy::GridLines).filter(|l| l.columns.len() >= 2)
}

pub fn from_header_labels(ctx: &LayoutContext) -> Option<ColumnLayout> {
    let band = (ctx.header_height as f32 * 1.4) as u32;
    let xs: Vec<u32> = ctx
        .tokens
        .iter()
        .filter(|t| t.bbox.top < band && ctx.tables.weekday_in(&t.text).is_some())
        .map(center_x)
        .collect();
    if xs.len() < MIN_LABEL_CLUSTERS {
        return None;
    }
    let gap = 20.max((ctx.width as f32 * 0.02) as u32);
    let centers = group_positions(&xs, gap);
    if centers.len() < MIN_LABEL_CLUSTERS {
        return None;
    }
    let (first_left, _) = outer_bounds(&centers, ctx.width)?;
    let mut edges = vec![0, first_left];
    edges.extend(midpoints(&centers));
    edges.push(ctx.width);
    layout_from_edges(&normalize_edges(edges, ctx.width), ColumnStrategy::HeaderLabels)
}

fn digit_ratio(s: &str) -> f32 {
    let n = s.chars().count().max(1);
    s.chars().filter(|c| c.is_ascii_digit()).count() as f32 / n as f32
}

/// Time-likelihood of the tokens clustered around `center`.
fn time_score(body: &[&TextToken], center: u32, bin_w: u32, width: u32) -> Option<f32> {
    let lo = center.saturating_sub(bin_w);
    let hi = center + bin_w;
    let seg: Vec<&&TextToken> = body
        .iter()
        .filter(|t| (lo..hi).contains(&center_x(t)))
        .collect();
    if seg.is_empty() {
        return None;
    }
    let n = seg.len() as f32;
    let time_frac = seg.iter().filter(|t| looks_like_time(&t.text)).count() as f32 / n;
    let digits = seg.iter().map(|t| digit_ratio(&t.text)).sum::<f32>() / n;
    Some(3.0 * time_frac + 1.5 * digits + 0.2 * (1.0 - center as f32 / width.max(1) as f32))
}

pub fn from_word_histogram(ctx: &LayoutContext) -> Option<ColumnLayout> {
    let width = ctx.width;
    let body: Vec<&TextToken> = ctx
        .tokens
        .iter()
        .filter(|t| t.bbox.top > ctx.header_height)
        .collect();
    if body.len() < MIN_HISTOGRAM_TOKENS {
        return None;
    }

    let bin_w = 30.max(width / 120);
    let xs: Vec<u32> = body.iter().map(|t| center_x(t)).collect();
    let mut hist = vec![0u32; (width / bin_w + 1) as usize];
    for &x in &xs {
        if let Some(slot) = hist.get_mut((x / bin_w) as usize) {
            *slot += 1;
        }
    }
    let counts: Vec<f32> = hist.iter().map(|&c| c as f32).collect();
    let threshold = 5.max(percentile(&counts, 85.0).unwrap_or(0.0) as u32);

    let mut centers: Vec<u32> = hist
        .iter()
        .enumerate()
        .filter(|(_, &c)| c >= threshold)
        .filter_map(|(i, _)| {
            let lo = i as u32 * bin_w;
            let members: Vec<u32> = xs.iter().copied().filter(|x| (lo..lo + bin_w).contains(x)).collect();
            if members.len() >= 5 { median_u32(&members) } else { None }
        })
        .collect();
    centers.sort_unstable();
    centers.dedup();
    if centers.len() < MIN_LABEL_CLUSTERS {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, &c) in centers.iter().take(3).enumerate() {
        if let Some(score) = time_score(&body, c, bin_w, width) {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
    }
    let time_idx = best.map_or(0, |(i, _)| i);
    let time_center = centers[time_idx];
    let day_centers: Vec<u32> = centers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, &c)| c)
        .collect();
    if day_centers.len() < MIN_LABEL_CLUSTERS {
        return None;
    }

    let first_day = day_centers.iter().copied().min()?;
    let axis = ((time_center + first_day) / 2).clamp(
        (width as f32 * 0.10) as u32,
        (width as f32 * 0.35) as u32,
    );
    let mut edges = vec![0];
    edges.extend(midpoints(&centers));
    edges.push(width);
    if edges.len() > 2 {
        edges[1] = axis;
    }
    layout_from_edges(&normalize_edges(edges, width), ColumnStrategy::WordHistogram)
}

/// Last resort: one column right of the guessed time axis.
pub fn fallback(ctx: &LayoutContext) -> ColumnLayout {
    let edges = normalize_edges(vec![0, ctx.time_axis_guess, ctx.width], ctx.width);
    layout_from_edges(&edges, ColumnStrategy::Fallback).unwrap_or(ColumnLayout {
        time_axis_right: ctx.width,
        columns: Vec::new(),
        strategy: ColumnStrategy::Fallback,
        uniform_expanded: false,
    })
}

/// Pad out to `days` equal-width columns between the time axis and the
/// right page edge. Assumes a Monday-first week.
pub fn expand_uniform(layout: &ColumnLayout, width: u32, days: usize) -> Option<ColumnLayout> {
    if layout.columns.is_empty() || layout.columns.len() >= days || days == 0 {
        return None;
    }
    let left = layout.time_axis_right;
    if width <= left {
        return None;
    }
    let step = ((width - left) / days as u32).max(1);
    let mut edges = vec![0, left];
    edges.extend((1..days as u32).map(|i| left + step * i));
    edges.push(width);
    let mut expanded = layout_from_edges(&normalize_edges(edges, width), layout.strategy)?;
    expanded.uniform_expanded = true;
    Some(expanded)
}

/// Read weekday names from a header strip above each column and relabel.
/// Columns the engine can't read keep positional labels. Returns how many
/// headers were read.
pub fn label_weekdays(
    layout: &mut ColumnLayout,
    page: &RgbImage,
    ocr: &dyn OcrEngine,
    languages: &str,
    strip_height: u32,
    tables: &CompiledTables,
) -> usize {
    let request = OcrRequest::new(languages, SegmentationMode::SingleLine);
    let top = 2;
    let bottom = strip_height.saturating_sub(2);

    let read: Vec<Option<Weekday>> = layout
        .columns
        .iter()
        .map(|col| {
            let region = PixelBox::new(col.left + 3, top, col.right.saturating_sub(3), bottom);
            if region.is_empty() {
                return None;
            }
            match ocr.recognize(page, region, &request) {
                Ok(tokens) => {
                    let text: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
                    tables.weekday_in(&text.join(" "))
                }
                Err(e) => {
                    tracing::warn!("header OCR failed: {}", e);
                    None
                }
            }
        })
        .collect();

    let found = read.iter().filter(|d| d.is_some()).count();
    let n = read.len();
    let use_read = found == n || (found > 0 && (5..=7).contains(&n));
    for (i, (col, day)) in layout.columns.iter_mut().zip(&read).enumerate() {
        col.weekday = match day {
            Some(d) if use_read => *d,
            _ => Weekday::from_index(i),
        };
    }
    found
}
