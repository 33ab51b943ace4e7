use super::anchors::AnchorModel;
use crate::config::schema::TimingConfig;

/// Result of the per-weekday phase search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetEstimate {
    pub offset: u32,
    /// Share of samples whose start and end both snap within primary
    /// tolerance.
    pub coverage: f32,
    /// Mean absolute snapping error in minutes.
    pub mae: f32,
}

/// Phase offsets worth trying for a grid step.
pub fn candidate_offsets(step: u32) -> Vec<u32> {
    match step {
        0 => vec![0],
        60 => vec![0],
        90 => vec![0, 30],
        _ => (0..step).step_by(5).collect(),
    }
}

fn nearest_distance(anchors: &[u32], value: f32) -> f32 {
    anchors
        .iter()
        .map(|&a| (value - a as f32).abs())
        .fold(f32::INFINITY, f32::min)
}

/// Pick the offset that lets the most (start, end) samples snap within the
/// primary tolerance; ties go to the lowest mean error, then the smaller
/// offset.
pub fn estimate_offset(samples: &[(f32, f32)], step: u32, timing: &TimingConfig) -> OffsetEstimate {
    let mut best = OffsetEstimate {
        offset: 0,
        coverage: 0.0,
        mae: f32::INFINITY,
    };
    if samples.is_empty() || step == 0 {
        return best;
    }

    let (lo, hi) = (timing.range_start.minutes(), timing.range_end.minutes());
    for offset in candidate_offsets(step) {
        let anchors = AnchorModel::new(step, offset).anchors(lo, hi);
        if anchors.is_empty() {
            continue;
        }
        let mut hits = 0usize;
        let mut total_err = 0.0f32;
        for &(s, e) in samples {
            let ds = nearest_distance(&anchors, s);
            let de = nearest_distance(&anchors, e);
            if ds <= timing.primary_tolerance && de <= timing.primary_tolerance {
                hits += 1;
            }
            total_err += ds + de;
        }
        let coverage = hits as f32 / samples.len() as f32;
        let mae = total_err / samples.len() as f32;
        if coverage > best.coverage || (coverage == best.coverage && mae < best.mae) {
            best = OffsetEstimate {
                offset,
                coverage,
                mae,
            };
        }
    }
    best
}
