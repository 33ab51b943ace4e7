use slotgrid_core::config::builtin;
use slotgrid_core::config::schema::ParserConfig;
use slotgrid_core::error::ScheduleError;
use slotgrid_core::model::Weekday;
use std::path::Path;

pub fn list() -> Result<(), ScheduleError> {
    println!("Available presets:\n");
    for name in builtin::PRESETS {
        let config = builtin::load_preset(name)?;
        println!("  {:<16} {} (v{})", name, config.name, config.version);
        if let Some(ref desc) = config.description {
            println!("                   {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), ScheduleError> {
    let config = builtin::load_preset(preset)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn describe(config: &ParserConfig) {
    let steps: Vec<String> = Weekday::ALL
        .iter()
        .take(config.layout.day_columns)
        .map(|&d| format!("{d} {}min", config.timing.step_for(d)))
        .collect();
    println!("  Days: {}", config.layout.day_columns);
    println!("  Steps: {}", steps.join(", "));
    println!(
        "  Range: {} - {}",
        config.timing.range_start, config.timing.range_end
    );
    println!(
        "  Merge contiguous: {}, suppress redundant: {}",
        config.assembly.merge_contiguous, config.assembly.suppress_redundant
    );
    println!(
        "  Tables: {} room pattern(s), {} course name(s)",
        config.tables.room_patterns.len(),
        config.tables.course_vocab.len()
    );
}

pub fn validate(file: &Path) -> Result<(), ScheduleError> {
    let config = slotgrid_core::config::load_config(file)?;

    println!("Configuration '{}' (v{}) is valid.", config.name, config.version);
    describe(&config);

    // Potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    if !config.layout.assume_uniform_days && config.layout.day_columns > 5 {
        warnings.push("weekend columns are only found when the page shows them".to_string());
    }
    if config.tables.course_vocab.is_empty() {
        warnings.push("course_vocab is empty, titles will not be corrected".to_string());
    }
    if config.tables.surname_initials.is_empty() {
        warnings.push("surname_initials is empty, no instructor will be recognized".to_string());
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
