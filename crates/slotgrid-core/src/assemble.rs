//! Turn snapped, labelled blocks into the page's final slot list.

use image::RgbImage;
use std::collections::HashMap;

use crate::config::schema::{AssemblyConfig, BlockConfig};
use crate::fields::normalize::hangul_count;
use crate::imaging::color::fill_ratio;
use crate::imaging::crop_rgb;
use crate::model::{ClockTime, ParsedSlot, PixelBox, TextToken, Weekday};
use crate::ocr::tokens_in;
use crate::trace::{PageTrace, TraceStage};

/// A slot plus how strongly its source block supports it.
#[derive(Debug, Clone)]
pub struct SlotDraft {
    pub slot: ParsedSlot,
    pub support: f32,
}

/// Colored fill of the block plus 0.03 per Hangul syllable of page tokens
/// inside it. The block is shrunk first so neighbouring cells don't count.
pub fn block_support(page: &RgbImage, tokens: &[TextToken], bbox: PixelBox, config: &BlockConfig) -> f32 {
    let shrink = (bbox.width() / 10).max(6).min(bbox.height() / 2);
    let inner = bbox.inset(shrink).unwrap_or(bbox);
    let fill = crop_rgb(page, inner)
        .map(|crop| fill_ratio(&crop, config.saturation_threshold, config.chroma_threshold))
        .unwrap_or(0.0);
    let density: usize = tokens_in(tokens, &inner).map(|t| hangul_count(&t.text)).sum();
    fill + 0.03 * density as f32
}

fn sort_slots(slots: &mut [ParsedSlot]) {
    slots.sort_by_key(|s| (s.weekday, s.start, s.end));
}

/// Join back-to-back slots with identical fields into one span.
pub fn merge_contiguous(mut slots: Vec<ParsedSlot>) -> Vec<ParsedSlot> {
    sort_slots(&mut slots);
    let mut out: Vec<ParsedSlot> = Vec::with_capacity(slots.len());
    for slot in slots {
        if let Some(prev) = out.iter_mut().rev().find(|p| {
            p.weekday == slot.weekday
                && p.end == slot.start
                && p.title == slot.title
                && p.instructor == slot.instructor
                && p.room == slot.room
        }) {
            prev.end = slot.end;
            if !slot.raw_text.is_empty() && !prev.raw_text.contains(&slot.raw_text) {
                prev.raw_text = format!("{}\n{}", prev.raw_text, slot.raw_text);
            }
            continue;
        }
        out.push(slot);
    }
    out
}

type DuplicateKey = (Weekday, String, ClockTime, ClockTime, Option<String>);

/// Keep only the best-supported member of each (weekday, title, start, end,
/// room) group. Earlier drafts win ties.
pub fn suppress_redundant(drafts: Vec<SlotDraft>) -> Vec<ParsedSlot> {
    let mut best: HashMap<DuplicateKey, usize> = HashMap::new();
    for (i, d) in drafts.iter().enumerate() {
        let key = (
            d.slot.weekday,
            d.slot.title.clone(),
            d.slot.start,
            d.slot.end,
            d.slot.room.clone(),
        );
        match best.get(&key) {
            Some(&j) if drafts[j].support >= d.support => {}
            _ => {
                best.insert(key, i);
            }
        }
    }
    let mut keep: Vec<usize> = best.into_values().collect();
    keep.sort_unstable();
    keep.into_iter().map(|i| drafts[i].slot.clone()).collect()
}

/// Apply the configured post-processing and order the result.
pub fn assemble(drafts: Vec<SlotDraft>, config: &AssemblyConfig, trace: &mut PageTrace) -> Vec<ParsedSlot> {
    let before = drafts.len();
    let mut slots = if config.suppress_redundant {
        suppress_redundant(drafts)
    } else {
        drafts.into_iter().map(|d| d.slot).collect()
    };
    if config.merge_contiguous {
        slots = merge_contiguous(slots);
    }
    sort_slots(&mut slots);
    trace.note(
        TraceStage::Assemble,
        format!(
            "blocks={} slots={} merge={} suppress={}",
            before,
            slots.len(),
            config.merge_contiguous,
            config.suppress_redundant
        ),
    );
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::DiagnosticTrace;
    use image::Rgb;

    fn slot(day: Weekday, start: &str, end: &str, title: &str) -> ParsedSlot {
        ParsedSlot {
            weekday: day,
            start: ClockTime::parse(start).unwrap(),
            end: ClockTime::parse(end).unwrap(),
            title: title.into(),
            instructor: Some("김민수".into()),
            room: Some("공5-301".into()),
            raw_text: title.into(),
        }
    }

    fn draft(s: ParsedSlot, support: f32) -> SlotDraft {
        SlotDraft { slot: s, support }
    }

    #[test]
    fn contiguous_spans_merge() {
        let merged = merge_contiguous(vec![
            slot(Weekday::Mon, "10:00", "11:00", "품질공학"),
            slot(Weekday::Mon, "09:00", "10:00", "품질공학"),
            slot(Weekday::Mon, "12:00", "13:00", "품질공학"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].start, ClockTime::from_hm(9, 0));
        assert_eq!(merged[0].end, ClockTime::from_hm(11, 0));
        assert_eq!(merged[1].start, ClockTime::from_hm(12, 0));
    }

    #[test]
    fn different_titles_do_not_merge() {
        let merged = merge_contiguous(vec![
            slot(Weekday::Mon, "09:00", "10:00", "품질공학"),
            slot(Weekday::Mon, "10:00", "11:00", "재무경영분석"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn suppression_keeps_best_supported() {
        let kept = suppress_redundant(vec![
            draft(slot(Weekday::Wed, "10:30", "12:00", "품질공학"), 0.4),
            draft(
                ParsedSlot {
                    raw_text: "stronger".into(),
                    ..slot(Weekday::Wed, "10:30", "12:00", "품질공학")
                },
                0.9,
            ),
            draft(slot(Weekday::Thu, "10:30", "12:00", "품질공학"), 0.1),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].raw_text, "stronger");
        assert_eq!(kept[1].weekday, Weekday::Thu);
    }

    #[test]
    fn assemble_orders_by_day_then_time() {
        let mut trace = DiagnosticTrace::default();
        let mut page = PageTrace::new(1, &mut trace);
        let slots = assemble(
            vec![
                draft(slot(Weekday::Fri, "09:00", "10:00", "A학"), 0.0),
                draft(slot(Weekday::Mon, "13:00", "14:00", "B학"), 0.0),
                draft(slot(Weekday::Mon, "09:00", "10:00", "C학"), 0.0),
            ],
            &AssemblyConfig::default(),
            &mut page,
        );
        let order: Vec<&str> = slots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(order, vec!["C학", "B학", "A학"]);
        assert_eq!(trace.stage_events(TraceStage::Assemble).count(), 1);
    }

    #[test]
    fn support_grows_with_fill_and_text() {
        let mut page = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        let bbox = PixelBox::new(20, 20, 120, 120);
        let config = BlockConfig::default();
        let blank = block_support(&page, &[], bbox, &config);
        for y in 20..120 {
            for x in 20..120 {
                page.put_pixel(x, y, Rgb([255, 228, 196]));
            }
        }
        let filled = block_support(&page, &[], bbox, &config);
        let token = TextToken {
            text: "품질공학".into(),
            bbox: PixelBox::new(40, 50, 100, 70),
            confidence: 90.0,
            line_key: None,
        };
        let with_text = block_support(&page, &[token], bbox, &config);
        assert!(blank < 0.01);
        assert!(filled > 0.9);
        assert!((with_text - filled - 0.12).abs() < 1e-4);
    }
}
