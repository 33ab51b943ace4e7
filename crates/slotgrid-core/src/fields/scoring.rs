//! Pick title, instructor and room out of a block's candidate lines.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::schema::FieldConfig;
use crate::config::tables::CompiledTables;
use crate::fields::lines::CandidateLine;
use crate::fields::normalize::{hangul_count, longest_hangul_run, vocab_correct};

static LEADING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([가-힣]{2,4})(?:\s|$)").expect("leading name pattern is valid"));

static TRAILING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([가-힣]{2,4})$").expect("trailing name pattern is valid"));

/// The fields read from one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFields {
    pub title: String,
    pub instructor: Option<String>,
    pub room: Option<String>,
    pub raw_text: String,
}

fn without_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Split a line into an instructor name and a room code, either optional.
pub fn split_instructor_room(s: &str, tables: &CompiledTables) -> (Option<String>, Option<String>) {
    let mut instructor = None;
    let mut room = None;

    if let Some((name, code)) = tables.instructor_with_room(s) {
        if tables.looks_like_name(name) {
            instructor = Some(name.to_string());
        }
        room = Some(without_whitespace(code));
    }

    if room.is_none() {
        if let Some(m) = tables.find_room(s) {
            room = Some(without_whitespace(m.as_str()));
            let head = s[..m.start()].trim();
            if let Some(caps) = TRAILING_NAME.captures(head) {
                let name = &caps[1];
                if instructor.is_none() && tables.looks_like_name(name) {
                    instructor = Some(name.to_string());
                }
            }
        }
    }

    if instructor.is_none() && digit_count(s) == 0 {
        if let Some(caps) = LEADING_NAME.captures(s.trim()) {
            let name = &caps[1];
            if tables.looks_like_name(name) {
                instructor = Some(name.to_string());
            }
        }
    }

    (instructor, room)
}

struct RoomCandidate {
    score: f32,
    room: String,
    instructor: Option<String>,
}

struct InstructorCandidate {
    score: f32,
    name: String,
    has_room: bool,
    vertical: bool,
}

fn instructor_shape_score(name: &str, tables: &CompiledTables) -> f32 {
    let mut score = 0.0;
    if tables.is_name_shaped(name) {
        score += 2.0;
    }
    if tables.has_known_surname(name) {
        score += 1.0;
    }
    if digit_count(name) > 0 {
        score -= 1.0;
    }
    score
}

/// Higher is more title-like.
pub fn title_score(
    s: &str,
    frequency: usize,
    index: usize,
    instructor: Option<&str>,
    tables: &CompiledTables,
) -> f32 {
    let korean = hangul_count(s);
    let latin = s.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let digits = digit_count(s);
    let letters = (korean + latin + digits).max(1);
    let ascii_ratio = (latin + digits) as f32 / letters as f32;
    let hyphens = s.chars().filter(|c| matches!(c, '-' | '–' | '/')).count();

    let mut score = 1.3 * longest_hangul_run(s) as f32 + 0.4 * frequency.min(5) as f32;
    if s.chars().count() >= 3 && tables.course_suffix_of(s).is_some() {
        score += 1.6;
    }
    score -= 1.6 * ascii_ratio;
    score -= hyphens as f32;
    if tables.has_room(s) {
        score -= 2.5;
    }
    if tables.is_name_shaped(s) {
        score -= 2.0;
    }
    score -= 0.2 * index as f32;

    if let Some(name) = instructor {
        if s.contains(name) {
            score -= 3.5;
        }
        let chars: Vec<char> = name.chars().collect();
        if chars.len() >= 2 {
            let tail: String = chars[chars.len() - 2..].iter().collect();
            if s.contains(&tail) {
                score -= 1.8;
            }
        }
    }
    score
}

fn pick_room(lines: &[CandidateLine], tables: &CompiledTables) -> (Option<RoomCandidate>, Vec<InstructorCandidate>) {
    let mut best_room: Option<RoomCandidate> = None;
    let mut instructors = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let (name, room) = split_instructor_room(&line.text, tables);
        if let Some(code) = &room {
            let mut score = 2.0 + 0.25 * digit_count(code) as f32 - 0.05 * idx as f32;
            if name.is_some() {
                score += 0.8;
            }
            if best_room.as_ref().map_or(true, |b| score > b.score) {
                best_room = Some(RoomCandidate {
                    score,
                    room: code.clone(),
                    instructor: name.clone(),
                });
            }
        }
        if let Some(name) = name {
            let mut score = instructor_shape_score(&name, tables) - 0.05 * idx as f32;
            if room.is_some() {
                score += 1.2;
            } else if line.vertical {
                score -= 2.2;
            }
            instructors.push(InstructorCandidate {
                score,
                name,
                has_room: room.is_some(),
                vertical: line.vertical,
            });
        }
    }
    (best_room, instructors)
}

/// Strong lexical title: a course suffix and at least three syllables.
fn lexical_title<'a>(lines: &'a [CandidateLine], tables: &CompiledTables) -> Option<&'a str> {
    let mut best: Option<(&str, usize, usize)> = None;
    for line in lines {
        let korean = hangul_count(&line.text);
        if korean < 3 || tables.course_suffix_of(&line.text).is_none() {
            continue;
        }
        let ascii = line.text.chars().filter(|c| c.is_ascii_alphanumeric()).count();
        let better = best.map_or(true, |(_, k, a)| korean > k || (korean == k && ascii < a));
        if better {
            best = Some((&line.text, korean, ascii));
        }
    }
    best.map(|(text, _, _)| text)
}

/// Choose the block's fields from candidate lines in reading order.
///
/// `frequency` counts how many OCR passes produced each line.
pub fn choose_fields(
    lines: &[CandidateLine],
    frequency: &HashMap<String, usize>,
    tables: &CompiledTables,
    config: &FieldConfig,
) -> BlockFields {
    let lines = &lines[..lines.len().min(config.max_candidate_lines)];
    let raw_text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
    if lines.is_empty() {
        return BlockFields::default();
    }

    let (best_room, instructors) = pick_room(lines, tables);
    let room = best_room.as_ref().map(|r| r.room.clone());

    let instructor = match best_room.as_ref().and_then(|r| r.instructor.clone()) {
        Some(name) => instructors.into_iter().find(|c| c.name == name).map(|c| (c.name, c.has_room, c.vertical)),
        None => instructors
            .into_iter()
            .fold(None::<InstructorCandidate>, |best, c| match best {
                Some(b) if (b.has_room, b.score) >= (c.has_room, c.score) => Some(b),
                _ => Some(c),
            })
            .map(|c| (c.name, c.has_room, c.vertical)),
    };
    let instructor_name = instructor.as_ref().map(|(n, _, _)| n.as_str());

    let scored = lines.iter().take(6).enumerate().fold(None::<(&str, f32)>, |best, (idx, line)| {
        let freq = frequency.get(&line.text).copied().unwrap_or(1);
        let score = title_score(&line.text, freq, idx, instructor_name, tables);
        match best {
            Some((_, b)) if b >= score => best,
            _ => Some((line.text.as_str(), score)),
        }
    });
    let mut title = lexical_title(lines, tables)
        .or(scored.map(|(t, _)| t))
        .unwrap_or_default()
        .to_string();

    if let Some(name) = instructor_name {
        if title.contains(name) {
            title = title.replace(name, " ").split_whitespace().collect::<Vec<_>>().join(" ");
        }
    }
    title = tables.strip_rooms(&title);

    if tables.is_name_shaped(&title) {
        if let Some(line) = lines
            .iter()
            .find(|l| !tables.is_name_shaped(&l.text) && !tables.has_room(&l.text) && hangul_count(&l.text) >= 3)
        {
            title = line.text.clone();
        }
    }

    let corrected = vocab_correct(&title, &tables.course_vocab, config.vocab_threshold).or_else(|| {
        lines
            .iter()
            .find_map(|l| vocab_correct(&l.text, &tables.course_vocab, config.vocab_threshold))
    });
    let in_vocab = corrected.is_some();
    if let Some(c) = corrected {
        title = c;
    }
    if hangul_count(&title) < 2 && !in_vocab {
        title.clear();
    }

    let instructor = instructor.and_then(|(name, has_room, vertical)| (!vertical || has_room).then_some(name));

    BlockFields {
        title,
        instructor,
        room,
        raw_text,
    }
}
