pub mod builtin;
pub mod schema;
pub mod tables;

use crate::error::ScheduleError;
use schema::ParserConfig;
use std::path::Path;
use tables::CompiledTables;

/// Load a parser configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ParserConfig, ScheduleError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScheduleError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string read from `source`.
pub fn parse_config(json: &str, source: &Path) -> Result<ParserConfig, ScheduleError> {
    let config: ParserConfig =
        serde_json::from_str(json).map_err(|e| ScheduleError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<ParserConfig, ScheduleError> {
    let config: ParserConfig = serde_json::from_str(json).map_err(ScheduleError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is internally consistent.
pub fn validate_config(config: &ParserConfig) -> Result<(), ScheduleError> {
    let layout = &config.layout;
    if !(1..=7).contains(&layout.day_columns) {
        return Err(ScheduleError::ConfigInvalid(format!(
            "day_columns must be between 1 and 7, got {}",
            layout.day_columns
        )));
    }
    if layout.base_hour > 23 {
        return Err(ScheduleError::ConfigInvalid(format!(
            "base_hour must be an hour of day, got {}",
            layout.base_hour
        )));
    }
    for (name, v) in [
        ("header_fraction", layout.header_fraction),
        ("header_ocr_fraction", layout.header_ocr_fraction),
        ("min_day_column_fraction", layout.min_day_column_fraction),
        ("line_kernel_fraction", layout.line_kernel_fraction),
    ] {
        if !(v > 0.0 && v < 1.0) {
            return Err(ScheduleError::ConfigInvalid(format!(
                "{name} must be a fraction in (0, 1), got {v}"
            )));
        }
    }

    let timing = &config.timing;
    if timing.range_start >= timing.range_end {
        return Err(ScheduleError::ConfigInvalid(format!(
            "timing range {}..{} is empty",
            timing.range_start, timing.range_end
        )));
    }
    if timing.default_step == 0 {
        return Err(ScheduleError::ConfigInvalid(
            "default_step must be positive".into(),
        ));
    }
    for (day, step) in &timing.weekday_steps {
        if *step == 0 {
            return Err(ScheduleError::ConfigInvalid(format!(
                "step for {day} must be positive"
            )));
        }
    }
    if timing.primary_tolerance <= 0.0 || timing.relaxed_tolerance < timing.primary_tolerance {
        return Err(ScheduleError::ConfigInvalid(format!(
            "tolerances must satisfy 0 < primary ({}) <= relaxed ({})",
            timing.primary_tolerance, timing.relaxed_tolerance
        )));
    }

    if config.assembly.merge_contiguous && config.assembly.suppress_redundant {
        return Err(ScheduleError::ConfigInvalid(
            "merge_contiguous and suppress_redundant are mutually exclusive".into(),
        ));
    }

    let tables = &config.tables;
    if tables.weekday_aliases.values().all(|names| names.is_empty()) {
        return Err(ScheduleError::ConfigInvalid(
            "weekday_aliases must not be empty".into(),
        ));
    }
    if tables.room_patterns.is_empty() {
        return Err(ScheduleError::ConfigInvalid(
            "room_patterns must not be empty".into(),
        ));
    }
    CompiledTables::compile(tables).map_err(|e| {
        ScheduleError::ConfigInvalid(format!("pattern table does not compile: {e}"))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let json = r#"{ "name": "Test", "version": "1.0" }"#;
        let config = parse_config_str(json).unwrap();
        assert_eq!(config.name, "Test");
        assert_eq!(config.layout.day_columns, 5);
        assert_eq!(config.timing.primary_tolerance, 12.0);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let json = r#"{
            "name": "Test",
            "version": "1.0",
            "timing": { "weekday_steps": { "Wed": 90 } }
        }"#;
        let config = parse_config_str(json).unwrap();
        assert_eq!(config.timing.step_for(crate::model::Weekday::Wed), 90);
        assert_eq!(config.timing.step_for(crate::model::Weekday::Mon), 60);
        assert_eq!(config.timing.relaxed_tolerance, 22.0);
    }

    #[test]
    fn test_merge_and_suppress_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "assembly": { "merge_contiguous": true, "suppress_redundant": true }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_tolerance_order_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "timing": { "primary_tolerance": 20.0, "relaxed_tolerance": 10.0 }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_bad_room_pattern_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "tables": { "room_patterns": ["(unclosed"] }
        }"#;
        assert!(parse_config_str(json).is_err());
    }

    #[test]
    fn test_empty_range_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1.0",
            "timing": { "range_start": "20:00", "range_end": "08:00" }
        }"#;
        assert!(parse_config_str(json).is_err());
    }
}
