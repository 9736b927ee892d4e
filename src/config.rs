//! Application configuration management.
//!
//! Persistent settings for zim-waveform: the bounded waits applied to remote
//! sources, the default number of waveform buckets, where materialized copies
//! are written, and logging. Configuration is stored in the user's config
//! directory (typically ~/.config/zim-waveform/config.toml); every key has a
//! default, so a missing file or a partial one is never an error.

use crate::constants::{
    DEFAULT_EXPORT_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SAMPLES_PER_PIXEL,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,
    #[serde(default = "default_samples_per_pixel")]
    pub samples_per_pixel: usize,
    /// Directory for materialized remote audio, `~` is expanded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_export_timeout_secs() -> u64 {
    DEFAULT_EXPORT_TIMEOUT_SECS
}

fn default_samples_per_pixel() -> usize {
    DEFAULT_SAMPLES_PER_PIXEL
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            export_timeout_secs: default_export_timeout_secs(),
            samples_per_pixel: default_samples_per_pixel(),
            temp_dir: None,
            log_level: default_log_level(),
            log_file: None,
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // XDG_CONFIG_HOME wins so tests can point at a scratch directory
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("zim-waveform")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("zim-waveform")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "fetch_timeout_secs" => self.fetch_timeout_secs = parse_positive(key, value)?,
            "export_timeout_secs" => self.export_timeout_secs = parse_positive(key, value)?,
            "samples_per_pixel" => {
                self.samples_per_pixel = usize::try_from(parse_positive(key, value)?)
                    .map_err(|_| format!("{key} is out of range"))?;
            }
            "temp_dir" => self.temp_dir = non_empty(value),
            "log_level" => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(format!(
                        "Invalid log level '{value}'. Expected one of: {}",
                        LOG_LEVELS.join(", ")
                    )
                    .into());
                }
                self.log_level = level;
            }
            "log_file" => self.log_file = non_empty(value),
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }

    /// Directory materialized copies are written to, falling back to the
    /// system temp directory
    pub fn resolved_temp_dir(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => std::env::temp_dir(),
        }
    }

    pub fn resolved_log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(|file| PathBuf::from(shellexpand::tilde(file).as_ref()))
    }

    /// Unknown levels fall back to `info`
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, Box<dyn Error>> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("{key} must be a positive whole number").into()),
        Ok(n) => Ok(n),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
