use crate::config::schema::ParserConfig;
use crate::config::validate_config;
use crate::error::ScheduleError;

const KO_UNIV_JSON: &str = include_str!("../../../../presets/ko-univ.json");
const KO_UNIV_HOURLY_JSON: &str = include_str!("../../../../presets/ko-univ-hourly.json");

/// Available predefined configurations. The first is the default.
pub const PRESETS: &[&str] = &["ko-univ", "ko-univ-hourly"];

/// Load a predefined configuration by name.
pub fn load_preset(name: &str) -> Result<ParserConfig, ScheduleError> {
    let json = match name {
        "ko-univ" => KO_UNIV_JSON,
        "ko-univ-hourly" => KO_UNIV_HOURLY_JSON,
        _ => {
            return Err(ScheduleError::ConfigInvalid(format!(
                "unknown preset '{}'. Available: {}",
                name,
                PRESETS.join(", ")
            )))
        }
    };
    let config: ParserConfig = serde_json::from_str(json)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;

    #[test]
    fn test_load_default_preset_matches_default() {
        let config = load_preset("ko-univ").unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_hourly_preset() {
        let config = load_preset("ko-univ-hourly").unwrap();
        assert_eq!(config.timing.step_for(Weekday::Tue), 60);
        assert!(config.assembly.merge_contiguous);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}
