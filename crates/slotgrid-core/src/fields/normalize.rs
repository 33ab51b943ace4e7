use regex::Regex;
use std::sync::LazyLock;

static DIGIT_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s*[-–]\s*(\d)").expect("digit dash pattern is valid"));

static EDGE_QUOTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^["“”'`]+|["“”'`]+$"#).expect("edge quote pattern is valid")
});

// "산업공학 5/ 활용" is how the engine tends to read "산업공학SW활용".
static SW_MISREAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:5|S)\s*/\s*").expect("SW pattern is valid"));

pub fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

pub fn hangul_count(s: &str) -> usize {
    s.chars().filter(|&c| is_hangul(c)).count()
}

/// Length of the longest run of consecutive Hangul syllables.
pub fn longest_hangul_run(s: &str) -> usize {
    let mut best = 0;
    let mut cur = 0;
    for c in s.chars() {
        if is_hangul(c) {
            cur += 1;
            best = best.max(cur);
        } else {
            cur = 0;
        }
    }
    best
}

fn is_single_syllable(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if is_hangul(c))
}

/// Join runs of two or more space-separated single syllables
/// ("품 질 공 학" -> "품질공학"). Other words keep their spacing.
pub fn collapse_hangul_runs(s: &str) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    let mut out: Vec<String> = Vec::new();
    let mut i = 0;
    while i < words.len() {
        if is_single_syllable(words[i]) {
            let start = i;
            while i < words.len() && is_single_syllable(words[i]) {
                i += 1;
            }
            if i - start >= 2 {
                out.push(words[start..i].concat());
            } else {
                out.push(words[start].to_string());
            }
        } else {
            out.push(words[i].to_string());
            i += 1;
        }
    }
    out.join(" ")
}

/// Canonical form of one candidate line.
pub fn normalize_line(s: &str) -> String {
    let s = collapse_hangul_runs(s);
    let s = DIGIT_DASH.replace_all(&s, "$1-$2");
    let s = EDGE_QUOTES.replace_all(&s, "");
    let s = SW_MISREAD.replace_all(&s, "SW");
    s.trim().to_string()
}

fn without_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Closest vocabulary entry by normalized edit similarity, if it reaches
/// `threshold`.
pub fn vocab_correct(s: &str, vocab: &[String], threshold: f64) -> Option<String> {
    let base = without_whitespace(s);
    if base.is_empty() {
        return None;
    }
    let mut best: Option<(&String, f64)> = None;
    for entry in vocab {
        let sim = strsim::normalized_levenshtein(&base, &without_whitespace(entry));
        if best.map_or(true, |(_, s)| sim > s) {
            best = Some((entry, sim));
        }
    }
    best.filter(|(_, sim)| *sim >= threshold).map(|(e, _)| e.clone())
}
