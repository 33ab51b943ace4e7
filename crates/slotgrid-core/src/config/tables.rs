use regex::{Match, Regex};
use std::collections::HashSet;

use crate::config::schema::PatternTables;
use crate::error::ScheduleError;
use crate::model::Weekday;

/// `PatternTables` with every pattern compiled once per parse.
#[derive(Debug, Clone)]
pub struct CompiledTables {
    room_patterns: Vec<Regex>,
    instructor_room: Regex,
    name: Regex,
    surnames: HashSet<char>,
    pub course_suffixes: Vec<String>,
    pub course_vocab: Vec<String>,
    weekday_aliases: Vec<(Weekday, Vec<String>)>,
    pub meridiem_am: Vec<String>,
    pub meridiem_pm: Vec<String>,
}

impl CompiledTables {
    pub fn compile(tables: &PatternTables) -> Result<Self, ScheduleError> {
        let room_patterns = tables
            .room_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            room_patterns,
            instructor_room: Regex::new(&tables.instructor_room_pattern)?,
            name: Regex::new(&tables.name_pattern)?,
            surnames: tables.surname_initials.chars().collect(),
            course_suffixes: tables.course_suffixes.clone(),
            course_vocab: tables.course_vocab.clone(),
            weekday_aliases: tables
                .weekday_aliases
                .iter()
                .map(|(d, names)| (*d, names.clone()))
                .collect(),
            meridiem_am: tables.meridiem_am.clone(),
            meridiem_pm: tables.meridiem_pm.clone(),
        })
    }

    /// Leftmost room-code match; earlier patterns win ties.
    pub fn find_room<'h>(&self, haystack: &'h str) -> Option<Match<'h>> {
        self.room_patterns
            .iter()
            .filter_map(|re| re.find(haystack))
            .min_by_key(|m| m.start())
    }

    pub fn has_room(&self, haystack: &str) -> bool {
        self.room_patterns.iter().any(|re| re.is_match(haystack))
    }

    /// Remove every room-code occurrence.
    pub fn strip_rooms(&self, s: &str) -> String {
        let mut out = s.to_string();
        for re in &self.room_patterns {
            out = re.replace_all(&out, "").into_owned();
        }
        out.trim().to_string()
    }

    /// Instructor name immediately followed by a room code.
    pub fn instructor_with_room<'h>(&self, haystack: &'h str) -> Option<(&'h str, &'h str)> {
        let caps = self.instructor_room.captures(haystack)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }

    /// Name-shaped, regardless of the surname table.
    pub fn is_name_shaped(&self, s: &str) -> bool {
        self.name.is_match(s)
    }

    pub fn has_known_surname(&self, s: &str) -> bool {
        s.chars().next().is_some_and(|c| self.surnames.contains(&c))
    }

    /// Name-shaped and starting with a known surname.
    pub fn looks_like_name(&self, s: &str) -> bool {
        self.is_name_shaped(s) && self.has_known_surname(s)
    }

    pub fn course_suffix_of(&self, s: &str) -> Option<&str> {
        self.course_suffixes
            .iter()
            .find(|suffix| s.ends_with(suffix.as_str()))
            .map(|s| s.as_str())
    }

    /// First weekday (Mon first) with an alias occurring in `text`.
    pub fn weekday_in(&self, text: &str) -> Option<Weekday> {
        let lower = text.to_lowercase();
        self.weekday_aliases.iter().find_map(|(day, names)| {
            names
                .iter()
                .any(|n| !n.is_empty() && lower.contains(&n.to_lowercase()))
                .then_some(*day)
        })
    }
}
