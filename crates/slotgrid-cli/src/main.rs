mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::ConfigArgs;

#[derive(Parser)]
#[command(
    name = "slotgrid",
    version,
    about = "Reconstruct weekly class slots from timetable images and PDFs"
)]
struct Cli {
    /// Log every pipeline decision to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a timetable image or PDF into class slots
    Parse {
        /// Path to an image (PNG, JPEG, ...) or PDF
        input_file: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the full result as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Print the diagnostic trace to stderr
        #[arg(long)]
        trace: bool,

        /// Write the first-pass page tokens as CSV
        #[arg(long = "dump-tokens", value_name = "FILE")]
        dump_tokens: Option<PathBuf>,
    },
    /// Parse a timetable and write one note per slot, grouped by subject
    Export {
        /// Path to an image (PNG, JPEG, ...) or PDF
        input_file: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output directory
        #[arg(short, long, default_value = "schedule_output")]
        dir: PathBuf,
    },
    /// Inspect and validate parser configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List built-in presets
    List,
    /// Print a preset as JSON
    Show {
        /// Preset name (e.g., "ko-univ")
        preset: String,
    },
    /// Validate a custom configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Parse {
            input_file,
            config,
            output,
            out,
            trace,
            dump_tokens,
        } => commands::parse::run(input_file, &config, &output, out, trace, dump_tokens),
        Commands::Export {
            input_file,
            config,
            dir,
        } => commands::export::run(input_file, &config, &dir),
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Show { preset } => commands::config::show(&preset),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
