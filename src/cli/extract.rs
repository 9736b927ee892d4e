use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use zim_waveform::config::Config;
use zim_waveform::constants::KEY_PROGRESS;
use zim_waveform::locator::{self, SourceDescriptor};
use zim_waveform::render::render_blocks;
use zim_waveform::utils::progress::{
    create_extraction_bar, create_progress_spinner, set_fraction,
};
use zim_waveform::{AmplitudeMatrix, ExtractionRequest, MaterializeOptions, spawn_extraction};

const DISPLAY_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Blocks,
}

/// Options of `zim-waveform extract`
#[derive(Debug)]
pub struct ExtractOptions {
    pub source: String,
    pub pixels: Option<usize>,
    pub offset: Option<i64>,
    pub length: Option<u64>,
    pub headers: Vec<String>,
    pub key: Option<String>,
    pub format: OutputFormat,
}

/// JSON document printed by `extract` and written by `batch`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformReport<'a> {
    pub source: &'a str,
    pub session_key: &'a str,
    pub samples_per_pixel: usize,
    pub channels: &'a [Vec<f32>],
    pub waveform: Vec<f32>,
}

impl<'a> WaveformReport<'a> {
    pub fn new(
        source: &'a str,
        session_key: &'a str,
        matrix: &'a AmplitudeMatrix,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            source,
            session_key,
            samples_per_pixel: matrix.len(),
            channels: matrix.channels(),
            waveform: matrix.merged()?,
        })
    }
}

pub fn handle_extract(options: ExtractOptions, config: &Config) -> Result<(), Box<dyn Error>> {
    let mut descriptor = SourceDescriptor::new(options.source.as_str());
    for header in &options.headers {
        let (name, value) = parse_header(header)?;
        descriptor = descriptor.with_header(name, value);
    }
    let locator = locator::resolve(None, Some(&descriptor))?;

    let session_key = options
        .key
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = ExtractionRequest::new(options.pixels.unwrap_or(config.samples_per_pixel))
        .with_offset(Some(options.offset.unwrap_or(0)))
        .with_length_limit(options.length);

    // Remote audio has to be fetched and exported before the first bucket,
    // the spinner covers that stretch and is cleared by the first event
    let spinner = create_progress_spinner();
    if locator.is_remote() {
        spinner.set_message(format!("Fetching {}", options.source));
        spinner.enable_steady_tick(Duration::from_millis(100));
    }
    let bar = create_extraction_bar();
    let sink = {
        let bar = bar.clone();
        let spinner = spinner.clone();
        move |_event: &str, payload: Value| {
            if let Some(progress) = payload[KEY_PROGRESS].as_f64() {
                if !spinner.is_finished() {
                    spinner.finish_and_clear();
                }
                set_fraction(&bar, progress);
            }
        }
    };

    log::info!("Extracting {} as session {session_key}", options.source);
    let handle = spawn_extraction(
        locator,
        MaterializeOptions::from_config(config),
        request,
        session_key.as_str(),
        Arc::new(sink),
    )?;
    let result = handle.join();
    spinner.finish_and_clear();
    bar.finish_and_clear();

    // Nothing on this path cancels the handle
    let matrix = result
        .map_err(Box::<dyn Error>::from)?
        .ok_or("extraction was cancelled")?;

    let report = WaveformReport::new(&options.source, &session_key, &matrix)?;
    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Blocks => print_blocks(&report),
    }

    Ok(())
}

/// Split a `Name: value` header argument
pub fn parse_header(header: &str) -> Result<(String, String), Box<dyn Error>> {
    let (name, value) = header
        .split_once(':')
        .ok_or_else(|| format!("Invalid header '{header}'. Expected NAME:VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid header '{header}'. Header name is empty").into());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn print_blocks(report: &WaveformReport) {
    println!(
        "{} {} ({} buckets)",
        "✓".green().bold(),
        report.source.cyan().bold(),
        report.samples_per_pixel
    );

    for (index, channel) in report.channels.iter().enumerate() {
        println!(
            "  {} │{}│",
            format!("ch{index}").dimmed(),
            render_blocks(channel, DISPLAY_WIDTH, true)
        );
    }
    println!(
        "  {} │{}│",
        "mix".yellow(),
        render_blocks(&report.waveform, DISPLAY_WIDTH, true)
    );
}
