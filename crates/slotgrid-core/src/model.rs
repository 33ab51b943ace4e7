use serde::{Deserialize, Serialize};
use std::fmt;

use crate::trace::DiagnosticTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Positional weekday: column 0 is Monday, wrapping after Sunday.
    pub fn from_index(index: usize) -> Weekday {
        Self::ALL[index % 7]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minute of day. Values past midnight wrap when displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const fn from_minutes(minutes: u32) -> Self {
        ClockTime(minutes)
    }

    pub const fn from_hm(hour: u32, minute: u32) -> Self {
        ClockTime(hour * 60 + minute)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn hour(self) -> u32 {
        (self.0 / 60) % 24
    }

    /// Parse "HH:MM" (or "H:MM").
    pub fn parse(s: &str) -> Option<ClockTime> {
        let (h, m) = s.trim().split_once(':')?;
        let h: u32 = h.trim().parse().ok()?;
        let m: u32 = m.trim().parse().ok()?;
        if h > 23 || m > 59 {
            return None;
        }
        Some(ClockTime::from_hm(h, m))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", (self.0 / 60) % 24, self.0 % 60)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClockTime::parse(&value).ok_or_else(|| format!("invalid clock time '{value}'"))
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Axis-aligned pixel rectangle; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelBox {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        PixelBox {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) as f32 / 2.0,
            (self.top + self.bottom) as f32 / 2.0,
        )
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left as f32 && x < self.right as f32 && y >= self.top as f32 && y < self.bottom as f32
    }

    pub fn intersect(&self, other: &PixelBox) -> Option<PixelBox> {
        let b = PixelBox::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!b.is_empty()).then_some(b)
    }

    /// Shrink by `pad` on every side; `None` if nothing is left.
    pub fn inset(&self, pad: u32) -> Option<PixelBox> {
        let b = PixelBox::new(
            self.left + pad,
            self.top + pad,
            self.right.saturating_sub(pad),
            self.bottom.saturating_sub(pad),
        );
        (!b.is_empty()).then_some(b)
    }

    /// Grow by `pad_x`/`pad_y`, clamped to a `width` x `height` raster.
    pub fn expand(&self, pad_x: u32, pad_y: u32, width: u32, height: u32) -> PixelBox {
        PixelBox::new(
            self.left.saturating_sub(pad_x),
            self.top.saturating_sub(pad_y),
            (self.right + pad_x).min(width),
            (self.bottom + pad_y).min(height),
        )
    }
}

/// Engine-reported line grouping (block, paragraph, line numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
}

/// A single OCR-recognized word in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    pub bbox: PixelBox,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_key: Option<LineKey>,
}

impl TextToken {
    pub fn center(&self) -> (f32, f32) {
        self.bbox.center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnStrategy {
    GridLines,
    HeaderLabels,
    WordHistogram,
    Fallback,
}

impl fmt::Display for ColumnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnStrategy::GridLines => "grid-lines",
            ColumnStrategy::HeaderLabels => "header-labels",
            ColumnStrategy::WordHistogram => "word-histogram",
            ColumnStrategy::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowStrategy {
    GridLines,
    TimeLabels,
    WordHistogram,
    Fallback,
}

impl fmt::Display for RowStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RowStrategy::GridLines => "grid-lines",
            RowStrategy::TimeLabels => "time-labels",
            RowStrategy::WordHistogram => "word-histogram",
            RowStrategy::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayColumn {
    pub left: u32,
    pub right: u32,
    pub weekday: Weekday,
}

/// Weekday columns to the right of the time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Right bound of the time-label column.
    pub time_axis_right: u32,
    pub columns: Vec<DayColumn>,
    pub strategy: ColumnStrategy,
    /// Set when the column count was padded out to a uniform week.
    pub uniform_expanded: bool,
}

impl ColumnLayout {
    /// Bounds strictly increasing and non-overlapping, left of first column
    /// not before the time axis.
    pub fn is_well_formed(&self) -> bool {
        let mut prev = self.time_axis_right;
        for c in &self.columns {
            if c.left < prev || c.right <= c.left {
                return false;
            }
            prev = c.right;
        }
        true
    }

    /// Number of resolved bands, counting the time axis.
    pub fn band_count(&self) -> usize {
        self.columns.len() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBand {
    pub top: u32,
    pub bottom: u32,
    pub start: ClockTime,
}

/// Hour rows below the header band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    pub header_bottom: u32,
    pub rows: Vec<RowBand>,
    pub strategy: RowStrategy,
}

impl RowLayout {
    pub fn labels_strictly_increasing(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].start < w[1].start)
    }

    /// Number of resolved bands, counting the header band.
    pub fn band_count(&self) -> usize {
        self.rows.len() + 1
    }
}

/// Connected component inside one weekday column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBlock {
    pub weekday: Weekday,
    pub column_index: usize,
    pub bbox: PixelBox,
}

/// One reconstructed class time-slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSlot {
    pub weekday: Weekday,
    pub start: ClockTime,
    pub end: ClockTime,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum PageStatus {
    Parsed,
    LayoutUnresolved,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub page_number: usize,
    pub status: PageStatus,
    pub block_count: usize,
    pub slots: Vec<ParsedSlot>,
}

/// Everything produced for one input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub slots: Vec<ParsedSlot>,
    pub pages: Vec<PageResult>,
    pub trace: DiagnosticTrace,
}
