use crate::fields::normalize::is_hangul;
use crate::layout::edges::median_u32;
use crate::model::TextToken;

/// One reconstructed text line inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub text: String,
    /// Built by stacking single glyphs top to bottom.
    pub vertical: bool,
}

impl CandidateLine {
    pub fn horizontal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vertical: false,
        }
    }
}

/// Turns loose word tokens into candidate lines.
pub trait LineReconstructor {
    fn reconstruct(&self, tokens: &[TextToken]) -> Vec<CandidateLine>;
}

/// Words whose tops are within 0.6 of the mean word height share a line.
pub struct RowGrouping;

impl LineReconstructor for RowGrouping {
    fn reconstruct(&self, tokens: &[TextToken]) -> Vec<CandidateLine> {
        let mut words: Vec<&TextToken> = tokens.iter().filter(|t| !t.text.trim().is_empty()).collect();
        if words.is_empty() {
            return Vec::new();
        }
        words.sort_by_key(|t| (t.bbox.top, t.bbox.left));
        let mean_h = words.iter().map(|t| t.bbox.height() as u64).sum::<u64>() / words.len() as u64;
        let y_tol = (0.6 * mean_h.max(1) as f32) as u32;

        let mut lines: Vec<Vec<&TextToken>> = Vec::new();
        for w in words {
            match lines.last_mut() {
                Some(line) if line.last().is_some_and(|prev| prev.bbox.top.abs_diff(w.bbox.top) <= y_tol) => {
                    line.push(w)
                }
                _ => lines.push(vec![w]),
            }
        }

        lines
            .into_iter()
            .map(|mut line| {
                line.sort_by_key(|t| t.bbox.left);
                let text = line.iter().map(|t| t.text.trim()).collect::<Vec<_>>().join(" ");
                CandidateLine::horizontal(text)
            })
            .collect()
    }
}

/// Single Hangul glyphs stacked in a column read as one word.
pub struct VerticalGlyphFusion;

impl LineReconstructor for VerticalGlyphFusion {
    fn reconstruct(&self, tokens: &[TextToken]) -> Vec<CandidateLine> {
        let mut glyphs: Vec<(char, f32, f32, u32)> = tokens
            .iter()
            .filter_map(|t| {
                let mut chars = t.text.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if is_hangul(c) => {
                        let (x, y) = t.center();
                        Some((c, x, y, t.bbox.width()))
                    }
                    _ => None,
                }
            })
            .collect();
        if glyphs.len() < 3 {
            return Vec::new();
        }
        glyphs.sort_by(|a, b| a.1.total_cmp(&b.1));
        let widths: Vec<u32> = glyphs.iter().map(|g| g.3).collect();
        let x_tol = 6.0f32.max(0.8 * median_u32(&widths).unwrap_or(1).max(1) as f32);

        let mut stacks: Vec<Vec<(char, f32, f32, u32)>> = Vec::new();
        for g in glyphs {
            match stacks.last_mut() {
                Some(stack) if stack.last().is_some_and(|prev| (g.1 - prev.1).abs() <= x_tol) => stack.push(g),
                _ => stacks.push(vec![g]),
            }
        }

        stacks
            .into_iter()
            .filter_map(|mut stack| {
                stack.sort_by(|a, b| a.2.total_cmp(&b.2));
                let word: String = stack.iter().map(|g| g.0).collect();
                (word.chars().count() >= 3).then_some(CandidateLine {
                    text: word,
                    vertical: true,
                })
            })
            .collect()
    }
}

/// Horizontal lines, followed by fused vertical words when enabled.
pub fn reconstruct_lines(tokens: &[TextToken], fuse_vertical: bool) -> Vec<CandidateLine> {
    let mut out = RowGrouping.reconstruct(tokens);
    if fuse_vertical {
        out.extend(VerticalGlyphFusion.reconstruct(tokens));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PixelBox;

    fn tok(text: &str, left: u32, top: u32, w: u32, h: u32) -> TextToken {
        TextToken {
            text: text.into(),
            bbox: PixelBox::new(left, top, left + w, top + h),
            confidence: 90.0,
            line_key: None,
        }
    }

    #[test]
    fn groups_words_by_row() {
        let tokens = vec![
            tok("공5-301", 80, 52, 60, 20),
            tok("품질공학", 20, 10, 80, 22),
            tok("김민수", 10, 50, 50, 20),
        ];
        let lines = RowGrouping.reconstruct(&tokens);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["품질공학", "김민수 공5-301"]);
    }

    #[test]
    fn fuses_stacked_glyphs() {
        let tokens = vec![
            tok("학", 20, 100, 18, 18),
            tok("품", 21, 10, 18, 18),
            tok("공", 19, 70, 18, 18),
            tok("질", 20, 40, 18, 18),
            tok("김민수", 80, 10, 50, 18),
        ];
        let fused = VerticalGlyphFusion.reconstruct(&tokens);
        assert_eq!(
            fused,
            vec![CandidateLine {
                text: "품질공학".into(),
                vertical: true
            }]
        );
        assert!(reconstruct_lines(&tokens, false).iter().all(|l| !l.vertical));
        assert!(reconstruct_lines(&tokens, true).iter().any(|l| l.vertical));
    }

    #[test]
    fn too_few_glyphs_do_not_fuse() {
        let tokens = vec![tok("월", 20, 10, 18, 18), tok("화", 20, 40, 18, 18)];
        assert!(VerticalGlyphFusion.reconstruct(&tokens).is_empty());
    }
}
