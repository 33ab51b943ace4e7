use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::ScheduleError;
use crate::model::{ParsedSlot, TextToken};

const UNTITLED_FOLDER: &str = "기타";

static INVALID_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("path character pattern is valid"));

/// Folder name for a subject; titles that sanitize to nothing share one
/// catch-all folder.
pub fn subject_folder(title: &str) -> String {
    let name = INVALID_PATH_CHARS.replace_all(title.trim(), "");
    let name = name.trim();
    if name.is_empty() {
        UNTITLED_FOLDER.to_string()
    } else {
        name.to_string()
    }
}

/// `HH_MM-HH_MM_<weekday>.txt`
pub fn note_file_name(slot: &ParsedSlot) -> String {
    format!(
        "{}-{}_{}.txt",
        slot.start.to_string().replace(':', "_"),
        slot.end.to_string().replace(':', "_"),
        slot.weekday
    )
}

fn note_body(slot: &ParsedSlot) -> String {
    let or_na = |v: Option<&str>| v.filter(|s| !s.is_empty()).unwrap_or("N/A").to_string();
    [
        format!("과목: {}", or_na(Some(slot.title.as_str()))),
        format!("시간: {} ~ {}", slot.start, slot.end),
        format!("요일: {}", slot.weekday),
        format!("교수: {}", or_na(slot.instructor.as_deref())),
        format!("강의실: {}", or_na(slot.room.as_deref())),
        "\n---\n".to_string(),
        format!("[원본 OCR 텍스트]\n{}", slot.raw_text),
    ]
    .join("\n")
}

/// Write one note per slot under `dir/<subject>/`. Returns the written paths
/// in slot order.
pub fn write_subject_notes(slots: &[ParsedSlot], dir: &Path) -> Result<Vec<PathBuf>, ScheduleError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(slots.len());
    for slot in slots {
        let folder = dir.join(subject_folder(&slot.title));
        fs::create_dir_all(&folder)?;
        let path = folder.join(note_file_name(slot));
        fs::write(&path, note_body(slot))?;
        written.push(path);
    }
    tracing::info!(count = written.len(), dir = %dir.display(), "subject notes written");
    Ok(written)
}

#[derive(Serialize)]
struct TokenRow<'a> {
    page: usize,
    text: &'a str,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    confidence: f32,
}

/// Dump recognized tokens as CSV, one row per token, pages in order.
pub fn write_token_csv<W: Write>(pages: &[(usize, Vec<TextToken>)], writer: W) -> Result<(), ScheduleError> {
    let mut out = csv::Writer::from_writer(writer);
    for (page, tokens) in pages {
        for t in tokens {
            out.serialize(TokenRow {
                page: *page,
                text: &t.text,
                left: t.bbox.left,
                top: t.bbox.top,
                right: t.bbox.right,
                bottom: t.bbox.bottom,
                confidence: t.confidence,
            })?;
        }
    }
    out.flush()?;
    Ok(())
}
