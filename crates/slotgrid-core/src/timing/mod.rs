//! Pixel-to-clock mapping, per-weekday anchor grids, and snapping.

pub mod anchors;
pub mod offset;

use crate::layout::edges::median_f32;
use crate::layout::labels::RowLabel;
use crate::model::RowLayout;

/// Linear pixel -> minute-of-day model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeModel {
    /// y of the top of the first hour row.
    pub origin_y: f32,
    /// Minute of day at `origin_y`.
    pub origin_minutes: f32,
    pub px_per_hour: f32,
}

impl TimeModel {
    /// The first row's top is its label hour; the hour height is the median
    /// row height, ignoring the last row when there are more than two since
    /// it often runs into the page margin.
    pub fn from_rows(rows: &RowLayout) -> Option<TimeModel> {
        let first = rows.rows.first()?;
        let sample = if rows.rows.len() > 2 {
            &rows.rows[..rows.rows.len() - 1]
        } else {
            &rows.rows[..]
        };
        let heights: Vec<f32> = sample.iter().map(|r| r.bottom.saturating_sub(r.top) as f32).collect();
        let px_per_hour = median_f32(&heights)?;
        if px_per_hour <= 0.0 {
            return None;
        }
        Some(TimeModel {
            origin_y: first.top as f32,
            origin_minutes: first.start.minutes() as f32,
            px_per_hour,
        })
    }

    pub fn minutes_at(&self, y: f32) -> f32 {
        self.origin_minutes + (y - self.origin_y) / self.px_per_hour * 60.0
    }

    /// Median offset (minutes) between where labels sit and where the model
    /// puts the middle of their hour. Needs two labels.
    pub fn label_bias(&self, labels: &[RowLabel]) -> Option<f32> {
        if labels.len() < 2 {
            return None;
        }
        let diffs: Vec<f32> = labels
            .iter()
            .map(|l| self.minutes_at(l.center_y) - (l.hour as f32 * 60.0 + 30.0))
            .collect();
        median_f32(&diffs)
    }

    /// Shift the origin to cancel a label bias within `limit` minutes.
    pub fn calibrated(self, labels: &[RowLabel], limit: f32) -> (TimeModel, Option<f32>) {
        match self.label_bias(labels) {
            Some(bias) if bias.abs() <= limit && bias != 0.0 => (
                TimeModel {
                    origin_y: self.origin_y + bias / 60.0 * self.px_per_hour,
                    ..self
                },
                Some(bias),
            ),
            _ => (self, None),
        }
    }
}
