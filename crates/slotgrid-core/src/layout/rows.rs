use super::edges::{median_u32, midpoints, normalize_edges, outer_bounds, percentile, prune_slivers};
use super::labels::AxisLabels;
use super::LayoutContext;
use crate::model::{ClockTime, RowBand, RowLayout, RowStrategy, TextToken};

const MIN_HISTOGRAM_TOKENS: usize = 20;
const MIN_ROW_CLUSTERS: usize = 4;

/// Row edges are `[0, header_bottom, row bounds..., bottom]`.
fn rows_from_edges(edges: &[u32], starts: &[ClockTime], strategy: RowStrategy) -> RowLayout {
    let header_bottom = edges.get(1).copied().unwrap_or(0);
    let rows = edges
        .get(1..)
        .unwrap_or(&[])
        .windows(2)
        .zip(starts)
        .map(|(w, &start)| RowBand {
            top: w[0],
            bottom: w[1],
            start,
        })
        .collect();
    RowLayout {
        header_bottom,
        rows,
        strategy,
    }
}

pub fn edges_from_grid_lines(ctx: &LayoutContext) -> Option<Vec<u32>> {
    if ctx.lines.horizontal.len() < ctx.config.min_horizontal_lines {
        return None;
    }
    let mut edges = vec![0];
    edges.extend(&ctx.lines.horizontal);
    edges.push(ctx.height);
    let edges = normalize_edges(edges, ctx.height);
    let gaps: Vec<u32> = edges.windows(2).map(|w| w[1] - w[0]).collect();
    let min_gap = (median_u32(&gaps).unwrap_or(0) as f32 * 0.4) as u32;
    Some(prune_slivers(&edges, min_gap))
}

/// Rows centered on the time-axis labels.
pub fn edges_from_labels(ctx: &LayoutContext, axis: &AxisLabels) -> Option<Vec<u32>> {
    let centers: Vec<u32> = axis.labels.iter().map(|l| l.center_y as u32).collect();
    let (top, _) = outer_bounds(&centers, ctx.height)?;
    let mut edges = vec![0, top];
    edges.extend(midpoints(&centers));
    edges.push(ctx.height);
    Some(normalize_edges(edges, ctx.height))
}

pub fn edges_from_word_histogram(ctx: &LayoutContext) -> Option<Vec<u32>> {
    let height = ctx.height;
    let ys: Vec<u32> = ctx
        .tokens
        .iter()
        .filter(|t| t.bbox.top > ctx.header_height && t.bbox.top + 1 < height)
        .map(|t: &TextToken| t.center().1 as u32)
        .collect();
    if ys.len() < MIN_HISTOGRAM_TOKENS {
        return None;
    }

    let bin_h = 14.max(height / 120);
    let mut hist = vec![0u32; (height / bin_h + 1) as usize];
    for &y in &ys {
        if let Some(slot) = hist.get_mut((y / bin_h) as usize) {
            *slot += 1;
        }
    }
    let counts: Vec<f32> = hist.iter().map(|&c| c as f32).collect();
    let threshold = 5.max(percentile(&counts, 80.0).unwrap_or(0.0) as u32);

    let mut centers: Vec<u32> = hist
        .iter()
        .enumerate()
        .filter(|(_, &c)| c >= threshold)
        .filter_map(|(i, _)| {
            let lo = i as u32 * bin_h;
            let members: Vec<u32> = ys.iter().copied().filter(|y| (lo..lo + bin_h).contains(y)).collect();
            if members.len() >= 5 {
                median_u32(&members)
            } else {
                None
            }
        })
        .collect();
    centers.sort_unstable();
    centers.dedup();
    if centers.len() < MIN_ROW_CLUSTERS {
        return None;
    }

    let (top, _) = outer_bounds(&centers, height)?;
    let mut edges = vec![0, top.max(ctx.header_height)];
    edges.extend(midpoints(&centers));
    edges.push(height);
    Some(normalize_edges(edges, height))
}

/// Header over the top 12% and a single row below it.
pub fn fallback_edges(height: u32) -> Vec<u32> {
    normalize_edges(vec![0, (height as f32 * 0.12) as u32, height], height)
}

/// Start hour of every row, aligned to the earliest labelled row.
///
/// Returns `None` when no label lands in a row or the alignment implies a
/// first row outside the morning (before midnight or from noon on).
pub fn align_row_starts(edges: &[u32], axis: &AxisLabels) -> Option<Vec<ClockTime>> {
    let bounds = edges.get(1..)?;
    let row_count = bounds.len().checked_sub(1)?;
    let (row, hour) = axis
        .labels
        .iter()
        .filter_map(|l| {
            let y = l.center_y as u32;
            bounds
                .windows(2)
                .position(|w| y >= w[0] && y < w[1])
                .map(|row| (row, l.hour))
        })
        .min_by_key(|(row, _)| *row)?;
    let base = hour as i64 - row as i64;
    if !(0..12).contains(&base) {
        return None;
    }
    Some(
        (0..row_count)
            .map(|i| ClockTime::from_hm(base as u32 + i as u32, 0))
            .collect(),
    )
}

/// Hourly sequence from `base_hour`.
pub fn hourly_from(base_hour: u32, count: usize) -> Vec<ClockTime> {
    (0..count as u32)
        .map(|i| ClockTime::from_hm(base_hour + i, 0))
        .collect()
}

/// Resolved row layout plus whether the labels came from the page.
pub struct ResolvedRows {
    pub layout: RowLayout,
    pub labels_aligned: bool,
}

pub fn resolve_rows(ctx: &LayoutContext, axis: &AxisLabels) -> ResolvedRows {
    let (strategy, edges) = if let Some(e) = edges_from_grid_lines(ctx) {
        (RowStrategy::GridLines, e)
    } else if let Some(e) = edges_from_labels(ctx, axis) {
        (RowStrategy::TimeLabels, e)
    } else if let Some(e) = edges_from_word_histogram(ctx) {
        (RowStrategy::WordHistogram, e)
    } else {
        (RowStrategy::Fallback, fallback_edges(ctx.height))
    };

    let row_count = edges.len().saturating_sub(2);
    let (starts, labels_aligned) = match align_row_starts(&edges, axis) {
        Some(s) if strategy != RowStrategy::Fallback => (s, true),
        _ => (hourly_from(ctx.config.base_hour, row_count), false),
    };

    ResolvedRows {
        layout: rows_from_edges(&edges, &starts, strategy),
        labels_aligned,
    }
}
