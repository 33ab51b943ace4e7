pub mod config;
pub mod export;
pub mod parse;

use clap::Args;
use slotgrid_core::config::builtin;
use slotgrid_core::config::schema::ParserConfig;
use slotgrid_core::error::ScheduleError;
use std::path::PathBuf;

/// Configuration selection shared by every parsing command.
#[derive(Args)]
pub struct ConfigArgs {
    /// Built-in preset: ko-univ (default) or ko-univ-hourly
    #[arg(short, long, value_name = "NAME", conflicts_with = "config")]
    pub preset: Option<String>,

    /// Custom JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Join back-to-back slots of the same class
    #[arg(long, conflicts_with = "suppress")]
    pub merge: bool,

    /// Drop near-duplicate detections, keeping the best supported
    #[arg(long)]
    pub suppress: bool,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<ParserConfig, ScheduleError> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => slotgrid_core::config::load_config(path)?,
            (None, Some(name)) => builtin::load_preset(name)?,
            (None, None) => ParserConfig::default(),
        };
        if self.merge {
            config.assembly.merge_contiguous = true;
            config.assembly.suppress_redundant = false;
        }
        if self.suppress {
            config.assembly.suppress_redundant = true;
            config.assembly.merge_contiguous = false;
        }
        Ok(config)
    }
}
