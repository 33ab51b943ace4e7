//! Small numeric helpers for turning positions into band edges.

/// Median of integer positions; even counts average the middle pair.
pub fn median_u32(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_unstable();
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2
    } else {
        v[mid]
    })
}

pub fn median_f32(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(f32::total_cmp);
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    })
}

/// Linear-interpolated percentile, `p` in 0..=100.
pub fn percentile(values: &[f32], p: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(f32::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (v.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(v[lo] + (v[hi] - v[lo]) * (rank - lo as f32))
}

/// Split sorted positions wherever consecutive values are more than `gap`
/// apart.
fn runs(positions: &[u32], gap: u32) -> Vec<Vec<u32>> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let mut out: Vec<Vec<u32>> = Vec::new();
    for p in sorted {
        match out.last_mut() {
            Some(run) if run.last().is_some_and(|&last| p - last <= gap) => run.push(p),
            _ => out.push(vec![p]),
        }
    }
    out
}

/// Gap-tolerant clustering, one median per cluster.
pub fn group_positions(positions: &[u32], gap: u32) -> Vec<u32> {
    runs(positions, gap)
        .iter()
        .filter_map(|r| median_u32(r))
        .collect()
}

/// Gap-tolerant clustering, one mean per cluster.
pub fn coarsen(positions: &[u32], gap: u32) -> Vec<u32> {
    runs(positions, gap)
        .iter()
        .map(|r| (r.iter().map(|&v| v as u64).sum::<u64>() / r.len() as u64) as u32)
        .collect()
}

/// Boundaries between neighbouring centers, as midpoints.
pub fn midpoints(centers: &[u32]) -> Vec<u32> {
    centers.windows(2).map(|w| (w[0] + w[1]) / 2).collect()
}

/// Outer bounds of the first and last center, extrapolated by half the
/// neighbouring gap. Needs at least two centers.
pub fn outer_bounds(centers: &[u32], limit: u32) -> Option<(u32, u32)> {
    let n = centers.len();
    if n < 2 {
        return None;
    }
    let first = centers[0].saturating_sub((centers[1] - centers[0]) / 2);
    let last = (centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2).min(limit);
    Some((first, last))
}

/// Sort, dedupe and clamp edges into `0..=limit`.
pub fn normalize_edges(mut edges: Vec<u32>, limit: u32) -> Vec<u32> {
    for e in edges.iter_mut() {
        *e = (*e).min(limit);
    }
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// Drop interior edges that would leave a band narrower than `min_gap`.
/// The first and last edges always survive.
pub fn prune_slivers(edges: &[u32], min_gap: u32) -> Vec<u32> {
    let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
        return Vec::new();
    };
    if edges.len() < 3 {
        return edges.to_vec();
    }
    let mut kept = vec![first];
    for &e in &edges[1..edges.len() - 1] {
        if kept.last().is_some_and(|&prev| e - prev >= min_gap) {
            kept.push(e);
        }
    }
    while kept.len() > 1 && kept.last().is_some_and(|&prev| last - prev < min_gap) {
        kept.pop();
    }
    kept.push(last);
    kept
}
