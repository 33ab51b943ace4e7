//! Time-axis label parsing.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::tables::CompiledTables;
use crate::error::ScheduleError;
use crate::model::TextToken;
use crate::ocr::engine_lines;

static KOREAN_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(오\s*[전후])?\s*(\d{1,2})\s*시").expect("korean hour pattern is valid")
});

static MERIDIEM_HOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::[0-5]\d)?\s*([ap]\.?\s?m\.?)")
        .expect("meridiem hour pattern is valid")
});

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("clock pattern is valid")
});

fn normalize_marker(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_uppercase)
        .collect()
}

fn is_marker(marker: &str, spellings: &[String]) -> bool {
    let m = normalize_marker(marker);
    spellings.iter().any(|s| normalize_marker(s) == m)
}

fn apply_meridiem(text: &str, hour: u32, marker: &str, tables: &CompiledTables) -> Result<u32, ScheduleError> {
    if !(1..=12).contains(&hour) {
        return Err(ScheduleError::MalformedTimeLabel(text.to_string()));
    }
    if is_marker(marker, &tables.meridiem_pm) {
        Ok(if hour < 12 { hour + 12 } else { hour })
    } else if is_marker(marker, &tables.meridiem_am) {
        Ok(if hour == 12 { 0 } else { hour })
    } else {
        Err(ScheduleError::MalformedTimeLabel(text.to_string()))
    }
}

/// Parse a row label into a 24-hour clock hour.
///
/// Accepts `오전 9시` / `오후 1시`, bare `13시`, `9 AM` / `1pm`, and `HH:MM`.
pub fn parse_time_label(text: &str, tables: &CompiledTables) -> Result<u32, ScheduleError> {
    let malformed = || ScheduleError::MalformedTimeLabel(text.to_string());

    if let Some(caps) = KOREAN_HOUR.captures(text) {
        let hour: u32 = caps[2].parse().map_err(|_| malformed())?;
        return match caps.get(1) {
            Some(marker) => apply_meridiem(text, hour, marker.as_str(), tables),
            None if hour <= 23 => Ok(hour),
            None => Err(malformed()),
        };
    }

    if let Some(caps) = MERIDIEM_HOUR.captures(text) {
        let hour: u32 = caps[1].parse().map_err(|_| malformed())?;
        return apply_meridiem(text, hour, &caps[2], tables);
    }

    if let Some(caps) = CLOCK.captures(text) {
        return caps[1].parse().map_err(|_| malformed());
    }

    Err(malformed())
}

/// Cheap check used for time-axis detection; no range validation.
pub fn looks_like_time(text: &str) -> bool {
    KOREAN_HOUR.is_match(text) || MERIDIEM_HOUR.is_match(text) || CLOCK.is_match(text)
}

/// Remove embedded time labels (`오후 1시`, `13:30`) from block text.
pub fn strip_time_labels(text: &str) -> String {
    let s = KOREAN_HOUR.replace_all(text, " ");
    let s = CLOCK.replace_all(&s, " ");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extend hours by one per position, forwards and backwards from the first
/// parsed entry. Positions that would leave 0..=23 get no hour, so the
/// sequence never wraps past midnight. `None` when nothing parsed.
pub fn monotonic_hours(parsed: &[Option<u32>]) -> Option<Vec<Option<u32>>> {
    let first = parsed.iter().position(Option::is_some)?;
    let base = parsed[first]? as i64;
    Some(
        (0..parsed.len())
            .map(|i| {
                let hour = base + i as i64 - first as i64;
                (0..24).contains(&hour).then_some(hour as u32)
            })
            .collect(),
    )
}

/// A time label recovered from the left margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLabel {
    pub center_y: f32,
    pub hour: u32,
    /// Read directly rather than extrapolated.
    pub parsed: bool,
}

/// Outcome of reading the time axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLabels {
    pub labels: Vec<RowLabel>,
    pub malformed: usize,
}

/// Read hour labels from tokens left of `axis_right`.
///
/// Engine lines are clustered by vertical center, only clusters with a
/// digit are considered, and the hours are then made monotonic.
pub fn read_axis_labels(tokens: &[TextToken], axis_right: u32, tables: &CompiledTables) -> AxisLabels {
    let left: Vec<TextToken> = tokens
        .iter()
        .filter(|t| t.bbox.left < axis_right)
        .cloned()
        .collect();
    let mut lines = engine_lines(&left);
    lines.sort_by(|a, b| a.bbox.center().1.total_cmp(&b.bbox.center().1));

    // y-cluster: lines whose centers sit within one line height merge.
    let mut clusters: Vec<(f32, f32, String)> = Vec::new();
    for line in lines {
        let (_, cy) = line.bbox.center();
        let h = line.bbox.height().max(1) as f32;
        match clusters.last_mut() {
            Some((ccy, ch, text)) if (cy - *ccy).abs() <= ch.max(h) * 0.6 => {
                text.push(' ');
                text.push_str(&line.text);
                *ccy = (*ccy + cy) / 2.0;
                *ch = ch.max(h);
            }
            _ => clusters.push((cy, h, line.text)),
        }
    }

    let candidates: Vec<(f32, String)> = clusters
        .into_iter()
        .filter(|(_, _, text)| text.chars().any(|c| c.is_ascii_digit()))
        .map(|(cy, _, text)| (cy, text))
        .collect();

    let mut malformed = 0;
    let parsed: Vec<Option<u32>> = candidates
        .iter()
        .map(|(_, text)| match parse_time_label(text, tables) {
            Ok(hour) => Some(hour),
            Err(e) => {
                tracing::debug!("skipping time label: {}", e);
                malformed += 1;
                None
            }
        })
        .collect();

    let labels = match monotonic_hours(&parsed) {
        Some(hours) => candidates
            .iter()
            .zip(hours)
            .zip(&parsed)
            .filter_map(|(((cy, _), hour), p)| {
                Some(RowLabel {
                    center_y: *cy,
                    hour: hour?,
                    parsed: p.is_some(),
                })
            })
            .collect(),
        None => Vec::new(),
    };

    AxisLabels { labels, malformed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PatternTables;
    use crate::model::{LineKey, PixelBox};

    fn tables() -> CompiledTables {
        CompiledTables::compile(&PatternTables::default()).unwrap()
    }

    #[test]
    fn korean_meridiem_labels() {
        let t = tables();
        assert_eq!(parse_time_label("오전 9시", &t).unwrap(), 9);
        assert_eq!(parse_time_label("오후 1시", &t).unwrap(), 13);
        assert_eq!(parse_time_label("오후12시", &t).unwrap(), 12);
        assert_eq!(parse_time_label("오전 12시", &t).unwrap(), 0);
        assert_eq!(parse_time_label("13시", &t).unwrap(), 13);
    }

    #[test]
    fn english_and_clock_labels() {
        let t = tables();
        assert_eq!(parse_time_label("9 AM", &t).unwrap(), 9);
        assert_eq!(parse_time_label("1pm", &t).unwrap(), 13);
        assert_eq!(parse_time_label("12 a.m.", &t).unwrap(), 0);
        assert_eq!(parse_time_label("14:00", &t).unwrap(), 14);
    }

    #[test]
    fn malformed_labels() {
        let t = tables();
        assert!(matches!(
            parse_time_label("시간", &t),
            Err(ScheduleError::MalformedTimeLabel(_))
        ));
        assert!(parse_time_label("오후 15시", &t).is_err());
        assert!(parse_time_label("31시", &t).is_err());
    }

    #[test]
    fn monotonic_from_first_anchor() {
        assert_eq!(
            monotonic_hours(&[None, Some(10), Some(3), None]),
            Some(vec![Some(9), Some(10), Some(11), Some(12)])
        );
        assert_eq!(monotonic_hours(&[None, None]), None);
    }

    #[test]
    fn monotonic_hours_do_not_wrap_past_midnight() {
        assert_eq!(
            monotonic_hours(&[Some(22), None, None, None]),
            Some(vec![Some(22), Some(23), None, None])
        );
        assert_eq!(
            monotonic_hours(&[None, None, Some(1)]),
            Some(vec![None, Some(0), Some(1)])
        );
    }

    #[test]
    fn strips_labels_from_text() {
        assert_eq!(strip_time_labels("오후 1시 품질공학"), "품질공학");
        assert_eq!(strip_time_labels("공5-301 10:30"), "공5-301");
    }

    #[test]
    fn axis_labels_cluster_and_extend() {
        let t = tables();
        let key = |line| Some(LineKey { block: 1, paragraph: 1, line });
        let tok = |text: &str, left, top, line| TextToken {
            text: text.into(),
            bbox: PixelBox::new(left, top, left + 30, top + 20),
            confidence: 90.0,
            line_key: key(line),
        };
        let tokens = vec![
            tok("시간", 10, 40, 1),
            tok("오전", 10, 140, 2),
            tok("9시", 45, 140, 2),
            tok("1O:OO", 10, 240, 3),
            tok("오후", 10, 340, 4),
            tok("7시", 45, 340, 4),
            tok("품질공학", 400, 250, 5),
        ];
        let axis = read_axis_labels(&tokens, 150, &t);
        let hours: Vec<u32> = axis.labels.iter().map(|l| l.hour).collect();
        assert_eq!(hours, vec![9, 10, 11]);
        assert_eq!(axis.malformed, 1);
        assert!(axis.labels[0].parsed);
        assert!(!axis.labels[1].parsed);
        assert_eq!(axis.labels[0].center_y, 150.0);
    }
}
