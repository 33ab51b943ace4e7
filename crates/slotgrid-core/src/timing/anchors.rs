use crate::config::schema::TimingConfig;

/// Permitted start times for one weekday: every `offset + k * step` minutes
/// from midnight, inside the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorModel {
    pub step: u32,
    pub offset: u32,
}

/// Which rule produced a snapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapRule {
    Primary,
    Relaxed,
    Rounded,
}

impl SnapRule {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapRule::Primary => "primary",
            SnapRule::Relaxed => "relaxed",
            SnapRule::Rounded => "rounded",
        }
    }
}

/// A block span after snapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnappedSpan {
    pub start: u32,
    pub end: u32,
    pub start_rule: SnapRule,
    pub end_rule: SnapRule,
    /// End was pushed out to keep at least one step after start.
    pub end_forced: bool,
}

impl AnchorModel {
    pub fn new(step: u32, offset: u32) -> Self {
        Self { step, offset }
    }

    pub fn anchors(&self, range_start: u32, range_end: u32) -> Vec<u32> {
        if self.step == 0 {
            return Vec::new();
        }
        let k0 = if range_start > self.offset {
            (range_start - self.offset).div_ceil(self.step)
        } else {
            0
        };
        (k0..)
            .map(|k| self.offset + k * self.step)
            .take_while(|&a| a <= range_end)
            .collect()
    }

    /// Nearest anchor within `tolerance` minutes.
    pub fn snap(anchors: &[u32], value: f32, tolerance: f32) -> Option<u32> {
        anchors
            .iter()
            .map(|&a| (a, (value - a as f32).abs()))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .filter(|(_, d)| *d <= tolerance)
            .map(|(a, _)| a)
    }

    /// Nearest multiple of the step, counted from midnight.
    pub fn round_to_step(&self, value: f32) -> u32 {
        if self.step == 0 {
            return value.round().max(0.0) as u32;
        }
        let step = self.step as f32;
        ((value / step).round() * step).max(0.0) as u32
    }

    fn snap_one(&self, anchors: &[u32], value: f32, timing: &TimingConfig) -> (u32, SnapRule) {
        if let Some(a) = Self::snap(anchors, value, timing.primary_tolerance) {
            (a, SnapRule::Primary)
        } else if let Some(a) = Self::snap(anchors, value, timing.relaxed_tolerance) {
            (a, SnapRule::Relaxed)
        } else {
            (self.round_to_step(value), SnapRule::Rounded)
        }
    }

    /// Snap a raw (start, end) minute span: primary tolerance, then relaxed,
    /// then step rounding. End always lands at least one step after start.
    pub fn snap_span(&self, start: f32, end: f32, timing: &TimingConfig) -> SnappedSpan {
        let anchors = self.anchors(timing.range_start.minutes(), timing.range_end.minutes());
        let (s, start_rule) = self.snap_one(&anchors, start, timing);
        let (mut e, end_rule) = self.snap_one(&anchors, end, timing);
        let end_forced = e < s + self.step.max(1);
        if end_forced {
            e = s + self.step.max(1);
        }
        SnappedSpan {
            start: s,
            end: e,
            start_rule,
            end_rule,
            end_forced,
        }
    }
}
