use crate::cli::extract::WaveformReport;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use serde_json::Value;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zim_waveform::config::Config;
use zim_waveform::constants::WAVEFORM_SIDECAR_SUFFIX;
use zim_waveform::utils::progress::create_progress_bar;
use zim_waveform::utils::scan::collect_inputs;
use zim_waveform::{
    CancellationToken, ExtractionRequest, SampleSource, SessionEvents, WaveformError,
    WaveformExtractor,
};

pub fn handle_batch(
    inputs: &[PathBuf],
    pixels: Option<usize>,
    out_dir: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        println!("No audio files found");
        return Ok(());
    }

    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    let samples_per_pixel = pixels.unwrap_or(config.samples_per_pixel);
    println!(
        "Extracting {} files at {} buckets each",
        files.len(),
        samples_per_pixel
    );

    let pb = create_progress_bar(files.len() as u64);
    let results: Vec<(PathBuf, Result<PathBuf, String>)> = files
        .par_iter()
        .map(|file| {
            let result = write_sidecar(file, samples_per_pixel, out_dir).map_err(|e| e.to_string());
            pb.inc(1);
            (file.clone(), result)
        })
        .collect();
    pb.finish_and_clear();

    let mut failed = 0;
    for (file, result) in &results {
        match result {
            Ok(sidecar) => println!("{} {}", "✓".green().bold(), sidecar.display()),
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), file.display(), e);
            }
        }
    }

    println!("\n✓ Batch complete!");
    println!("  Written: {} sidecar files", results.len() - failed);
    if failed > 0 {
        return Err(format!("{failed} files failed").into());
    }

    Ok(())
}

/// Where the waveform of `file` is written: next to it, or inside `out_dir`
pub fn sidecar_path(file: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}.{WAVEFORM_SIDECAR_SUFFIX}");

    match out_dir {
        Some(dir) => dir.join(name),
        None => file.with_file_name(name),
    }
}

/// Extract the full waveform of one local file and write its sidecar
pub fn write_sidecar(
    file: &Path,
    samples_per_pixel: usize,
    out_dir: Option<&Path>,
) -> Result<PathBuf, WaveformError> {
    let source = SampleSource::open_local(file)?;
    let events = SessionEvents::new(Arc::new(|_: &str, _: Value| {}));
    let mut extractor = WaveformExtractor::new(source, events, CancellationToken::new());

    let session_key = file.display().to_string();
    let result = extractor.extract(&ExtractionRequest::new(samples_per_pixel), &session_key);
    extractor.close();

    let Some(matrix) = result? else {
        return Err(WaveformError::Read("extraction was cancelled".to_string()));
    };

    let report = WaveformReport::new(&session_key, &session_key, &matrix)
        .map_err(|e| WaveformError::Merge(e.to_string()))?;

    let path = sidecar_path(file, out_dir);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, &report).map_err(io::Error::from)?;
    log::debug!("Wrote {}", path.display());

    Ok(path)
}
