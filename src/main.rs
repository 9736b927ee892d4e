//! zim-waveform - chunked RMS waveform extraction for local and remote audio.
//!
//! The `extract` command resolves a path or URL, materializes remote audio
//! into a local copy when needed, and reduces it to a fixed number of RMS
//! amplitude buckets while reporting progress bucket by bucket. `batch` does
//! the same for whole directories and writes a JSON sidecar per file.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use zim_waveform::config::{Config, LOG_LEVELS};

mod cli;

use cli::extract::{ExtractOptions, OutputFormat};

#[derive(Parser)]
#[command(name = "zim-waveform")]
#[command(about = "Chunked RMS waveform extraction for local and remote audio")]
#[command(version)]
struct Cli {
    /// Override the configured log level
    #[arg(long, global = true, value_parser = PossibleValuesParser::new(LOG_LEVELS))]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the waveform of one file or URL
    Extract {
        /// Local path, file:// URL or http(s) URL
        source: String,
        /// Number of output buckets (defaults to the configured value)
        #[arg(short, long)]
        pixels: Option<usize>,
        /// First bucket to extract; negative values count back from the start position
        #[arg(short, long, allow_hyphen_values = true)]
        offset: Option<i64>,
        /// Maximum number of buckets to extract
        #[arg(short, long)]
        length: Option<u64>,
        /// Request header for remote sources, as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Session key reported with every progress event
        #[arg(short, long)]
        key: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Blocks)]
        format: OutputFormat,
    },
    /// Extract waveforms of many files and write a sidecar next to each
    Batch {
        /// Audio files or directories to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Number of output buckets (defaults to the configured value)
        #[arg(short, long)]
        pixels: Option<usize>,
        /// Write sidecars into this directory instead
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(cli::config::CONFIG_KEYS))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file location
    Path,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn init_logging(config: &Config, level_override: Option<&str>) -> Result<(), Box<dyn Error>> {
    let level = level_override
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| config.level_filter());

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(log_file) = config.resolved_log_file() {
        loggers.push(WriteLogger::new(
            level,
            simplelog::Config::default(),
            File::create(log_file)?,
        ));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(&config, cli.log_level.as_deref())?;

    match cli.command {
        Commands::Extract {
            source,
            pixels,
            offset,
            length,
            headers,
            key,
            format,
        } => {
            cli::extract::handle_extract(
                ExtractOptions {
                    source,
                    pixels,
                    offset,
                    length,
                    headers,
                    key,
                    format,
                },
                &config,
            )?;
        }
        Commands::Batch {
            inputs,
            pixels,
            out_dir,
        } => {
            cli::batch::handle_batch(&inputs, pixels, out_dir.as_deref(), &config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Path => {
                cli::config::handle_config_path()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
