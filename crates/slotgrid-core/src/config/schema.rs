use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ClockTime, Weekday};

/// Every tunable of the parser. Immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub blocks: BlockConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub fields: FieldConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub tables: PatternTables,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            name: "ko-univ".into(),
            description: Some(
                "Korean university weekly grid, Mon-Fri, Tue/Thu on 90-minute periods".into(),
            ),
            version: "1.0".into(),
            layout: LayoutConfig::default(),
            blocks: BlockConfig::default(),
            timing: TimingConfig::default(),
            fields: FieldConfig::default(),
            assembly: AssemblyConfig::default(),
            tables: PatternTables::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Expected number of weekday columns.
    pub day_columns: usize,
    /// Pad to `day_columns` equal-width columns when fewer resolve.
    pub assume_uniform_days: bool,
    /// Fraction of page height treated as the header band.
    pub header_fraction: f32,
    /// Fraction of page height cropped for per-column weekday OCR.
    pub header_ocr_fraction: f32,
    /// First row hour when no time label can be read.
    pub base_hour: u32,
    /// Day columns narrower than this fraction of the page width are pruned.
    pub min_day_column_fraction: f32,
    pub min_vertical_lines: usize,
    pub min_horizontal_lines: usize,
    /// Directional opening kernel length as a fraction of the page dimension.
    pub line_kernel_fraction: f32,
    pub adaptive_block_radius: u32,
    pub adaptive_offset: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            day_columns: 5,
            assume_uniform_days: true,
            header_fraction: 0.15,
            header_ocr_fraction: 0.18,
            base_hour: 9,
            min_day_column_fraction: 0.07,
            min_vertical_lines: 4,
            min_horizontal_lines: 6,
            line_kernel_fraction: 0.025,
            adaptive_block_radius: 15,
            adaptive_offset: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// HSV saturation (0-255) above which a pixel counts as colored.
    pub saturation_threshold: u8,
    /// CIE Lab chroma above which a pixel counts as colored.
    pub chroma_threshold: f32,
    /// Minimum component area as a fraction of the page area.
    pub area_min_fraction: f32,
    /// Width of the horizontal-only closing kernel.
    pub horizontal_close: u32,
    /// Square opening kernel that removes speckle.
    pub open_kernel: u32,
    pub min_block_height: u32,
    /// Components narrower than this fraction of their column are dropped.
    pub min_block_width_fraction: f32,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: 12,
            chroma_threshold: 6.0,
            area_min_fraction: 0.0008,
            horizontal_close: 9,
            open_kernel: 3,
            min_block_height: 8,
            min_block_width_fraction: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub range_start: ClockTime,
    pub range_end: ClockTime,
    pub default_step: u32,
    pub weekday_steps: BTreeMap<Weekday, u32>,
    pub primary_tolerance: f32,
    pub relaxed_tolerance: f32,
    /// Largest label-derived bias (minutes) applied to the anchor pixel.
    pub label_calibration_limit: f32,
}

impl TimingConfig {
    pub fn step_for(&self, weekday: Weekday) -> u32 {
        self.weekday_steps
            .get(&weekday)
            .copied()
            .unwrap_or(self.default_step)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let weekday_steps = Weekday::ALL
            .iter()
            .map(|&d| {
                let step = match d {
                    Weekday::Tue | Weekday::Thu => 90,
                    _ => 60,
                };
                (d, step)
            })
            .collect();
        Self {
            range_start: ClockTime::from_hm(8, 0),
            range_end: ClockTime::from_hm(20, 0),
            default_step: 60,
            weekday_steps,
            primary_tolerance: 12.0,
            relaxed_tolerance: 22.0,
            label_calibration_limit: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// OCR language set, engine syntax ("kor+eng").
    pub languages: String,
    pub vocab_threshold: f64,
    pub fuse_vertical_glyphs: bool,
    pub max_candidate_lines: usize,
    pub crop_padding: u32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            languages: "kor+eng".into(),
            vocab_threshold: 0.62,
            fuse_vertical_glyphs: true,
            max_candidate_lines: 8,
            crop_padding: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub merge_contiguous: bool,
    pub suppress_redundant: bool,
}

/// Institution-specific lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTables {
    /// Room-code shapes, tried in order.
    pub room_patterns: Vec<String>,
    /// Instructor name directly followed by a room code; groups 1 and 2.
    pub instructor_room_pattern: String,
    /// Whole-string personal-name shape.
    pub name_pattern: String,
    /// Valid first characters of an instructor name.
    pub surname_initials: String,
    pub course_suffixes: Vec<String>,
    pub course_vocab: Vec<String>,
    pub weekday_aliases: BTreeMap<Weekday, Vec<String>>,
    pub meridiem_am: Vec<String>,
    pub meridiem_pm: Vec<String>,
}

impl Default for PatternTables {
    fn default() -> Self {
        let aliases: [(Weekday, &[&str]); 7] = [
            (Weekday::Mon, &["월", "Mon", "MON", "Monday"]),
            (Weekday::Tue, &["화", "Tue", "TUE", "Tuesday"]),
            (Weekday::Wed, &["수", "Wed", "WED", "Wednesday"]),
            (Weekday::Thu, &["목", "Thu", "THU", "Thursday"]),
            (Weekday::Fri, &["금", "Fri", "FRI", "Friday"]),
            (Weekday::Sat, &["토", "Sat", "SAT", "Saturday"]),
            (Weekday::Sun, &["일", "Sun", "SUN", "Sunday"]),
        ];
        Self {
            room_patterns: vec![
                r"(?i)[가-힣A-Za-z]{1,4}\s?\d{1,3}[A-Za-z]?\s*[-–]?\s?\d{2,4}\b".into(),
                r"\d{2,3}\s*[-–]\s*\d{2,4}\b".into(),
                r"(?i)[A-Za-z]{1,3}\d{2,4}\b".into(),
            ],
            instructor_room_pattern:
                r"([가-힣]{2,4})\s*((?:공|[A-Za-z])\s?\d{1,3}[A-Za-z]?\s*[-–]?\s?\d{2,4})".into(),
            name_pattern: r"^[가-힣]{2,4}$".into(),
            surname_initials: "김이박최정강조윤장임한오서신권황안송류전홍고문양손배백허유남심노하곽성차주우민제기"
                .into(),
            course_suffixes: [
                "캡스톤디자인",
                "공학",
                "학",
                "론",
                "설계",
                "실습",
                "응용",
                "분석",
                "디자인",
                "활용",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            course_vocab: [
                "재무경영분석",
                "품질공학",
                "산업공학SW활용",
                "휴먼인터페이스공학",
                "데이터분석과응용",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            weekday_aliases: aliases
                .iter()
                .map(|(d, names)| (*d, names.iter().map(|s| s.to_string()).collect()))
                .collect(),
            meridiem_am: vec!["오전".into(), "AM".into(), "A.M.".into()],
            meridiem_pm: vec!["오후".into(), "PM".into(), "P.M.".into()],
        }
    }
}
