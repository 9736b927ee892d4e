//! Materialization of remote audio into local, seekable copies.
//!
//! A remote asset goes through two bounded phases:
//!
//! 1. **Fetch** - the body is downloaded into a private temporary file and its
//!    container header is probed (channels, sample rate, length). The whole
//!    phase shares one deadline.
//! 2. **Export** - the probed audio is transcoded into a uniquely named 32-bit
//!    float WAV in the configured temp directory, checking its own deadline
//!    between chunks.
//!
//! The intermediate download never outlives the call, and on failure neither
//! does the export. A successful call hands ownership of the exported file to
//! the caller as a [`TempPath`], which deletes it when dropped.

use crate::config::Config;
use crate::constants::{
    DEFAULT_EXPORT_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS, TEMP_FILE_PREFIX,
};
use crate::error::{MaterializeError, MaterializePhase};
use crate::source::{FrameBuffer, FrameSource};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempPath;

const EXPORT_CHUNK_FRAMES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub fetch_timeout: Duration,
    pub export_timeout: Duration,
    pub temp_dir: PathBuf,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            export_timeout: Duration::from_secs(DEFAULT_EXPORT_TIMEOUT_SECS),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl MaterializeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            export_timeout: Duration::from_secs(config.export_timeout_secs),
            temp_dir: config.resolved_temp_dir(),
        }
    }
}

/// Header facts gathered while probing a downloaded asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub channels: usize,
    pub sample_rate: u32,
    pub frames: u64,
    pub duration: Duration,
}

impl AssetInfo {
    fn of(frames: &dyn FrameSource) -> Self {
        let rate = frames.sample_rate().max(1);
        Self {
            channels: frames.channel_count(),
            sample_rate: frames.sample_rate(),
            frames: frames.frame_count(),
            duration: Duration::from_secs_f64(frames.frame_count() as f64 / f64::from(rate)),
        }
    }
}

/// Fetch `url` and export it into a fresh local WAV file
#[cfg(feature = "remote")]
pub fn materialize(
    url: &str,
    headers: &[(String, String)],
    options: &MaterializeOptions,
) -> Result<TempPath, MaterializeError> {
    log::info!("Materializing remote audio: {url}");

    let fetch_deadline = Instant::now() + options.fetch_timeout;
    let download = fetch(url, headers, options, fetch_deadline)?;
    let mut frames = crate::source::open_frames(&download)
        .map_err(|e| MaterializeError::LoadFailed(e.to_string()))?;
    if Instant::now() >= fetch_deadline {
        return Err(MaterializeError::Timeout(MaterializePhase::Fetch));
    }

    let info = AssetInfo::of(frames.as_ref());
    log::info!(
        "Remote asset loaded: {} channels, {} Hz, {:.2}s",
        info.channels,
        info.sample_rate,
        info.duration.as_secs_f64()
    );

    let export_deadline = Instant::now() + options.export_timeout;
    let exported = export_to_wav(frames.as_mut(), &options.temp_dir, export_deadline)?;
    log::debug!("Remote asset exported to {}", exported.display());

    Ok(exported)
}

#[cfg(not(feature = "remote"))]
pub fn materialize(
    url: &str,
    _headers: &[(String, String)],
    _options: &MaterializeOptions,
) -> Result<TempPath, MaterializeError> {
    Err(MaterializeError::LoadFailed(format!(
        "{url}: remote sources require the `remote` feature"
    )))
}

#[cfg(feature = "remote")]
fn fetch(
    url: &str,
    headers: &[(String, String)],
    options: &MaterializeOptions,
    deadline: Instant,
) -> Result<TempPath, MaterializeError> {
    use std::io::{Read, Write};

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(options.fetch_timeout))
        .build()
        .into();

    let mut request = agent.get(url);
    for (key, value) in headers {
        request = request.header(key.as_str(), value.as_str());
    }

    let response = request.call().map_err(|e| match e {
        ureq::Error::Timeout(_) => MaterializeError::Timeout(MaterializePhase::Fetch),
        ureq::Error::StatusCode(code) => {
            MaterializeError::LoadFailed(format!("{url} answered with HTTP {code}"))
        }
        other => MaterializeError::LoadFailed(other.to_string()),
    })?;

    let (mut file, download) = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(".download")
        .tempfile_in(&options.temp_dir)
        .map_err(|e| MaterializeError::LoadFailed(e.to_string()))?
        .into_parts();

    let mut body = response.into_body();
    let mut reader = body.as_reader();
    let mut chunk = vec![0u8; 64 * 1024];
    let mut received = 0usize;

    loop {
        if Instant::now() >= deadline {
            return Err(MaterializeError::Timeout(MaterializePhase::Fetch));
        }
        let n = reader.read(&mut chunk).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                MaterializeError::Timeout(MaterializePhase::Fetch)
            } else {
                MaterializeError::LoadFailed(e.to_string())
            }
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&chunk[..n])
            .map_err(|e| MaterializeError::LoadFailed(e.to_string()))?;
        received += n;
    }
    file.flush()
        .map_err(|e| MaterializeError::LoadFailed(e.to_string()))?;

    if received == 0 {
        return Err(MaterializeError::LoadFailed(format!("{url} returned no data")));
    }
    log::debug!("Downloaded {received} bytes from {url}");

    Ok(download)
}

fn export_failed(error: impl std::fmt::Display) -> MaterializeError {
    MaterializeError::ExportFailed(error.to_string())
}

/// Write every frame of `frames` into a new float WAV inside `dir`
pub fn export_to_wav(
    frames: &mut dyn FrameSource,
    dir: &Path,
    deadline: Instant,
) -> Result<TempPath, MaterializeError> {
    let channels = frames.channel_count();
    let spec = WavSpec {
        channels: u16::try_from(channels).map_err(export_failed)?,
        sample_rate: frames.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let (file, output) = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(".wav")
        .tempfile_in(dir)
        .map_err(export_failed)?
        .into_parts();
    let mut writer = WavWriter::new(BufWriter::new(file), spec).map_err(export_failed)?;

    let total = frames.frame_count();
    let mut buffer = FrameBuffer::new(channels, EXPORT_CHUNK_FRAMES);
    let mut start = 0u64;

    while start < total {
        if Instant::now() >= deadline {
            return Err(MaterializeError::Timeout(MaterializePhase::Export));
        }
        let delivered = frames
            .read_frames(start, EXPORT_CHUNK_FRAMES, &mut buffer)
            .map_err(export_failed)?;
        if delivered == 0 {
            break;
        }
        for frame in 0..delivered {
            for channel in 0..channels {
                writer
                    .write_sample(buffer.channel(channel)[frame])
                    .map_err(export_failed)?;
            }
        }
        start += delivered as u64;
    }

    writer.finalize().map_err(export_failed)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BufferedFrames, open_frames};
    use tempfile::tempdir;

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn test_export_round_trips_frames() {
        let dir = tempdir().unwrap();
        let mut frames =
            BufferedFrames::from_channels(22050, &[vec![0.25, -0.5, 0.75], vec![0.0, 0.1, 0.2]]);

        let exported =
            export_to_wav(&mut frames, dir.path(), Instant::now() + Duration::from_secs(5))
                .unwrap();
        let name = exported.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(TEMP_FILE_PREFIX));
        assert!(name.ends_with(".wav"));

        let mut reopened = open_frames(&exported).unwrap();
        assert_eq!(reopened.frame_count(), 3);
        assert_eq!(reopened.channel_count(), 2);
        assert_eq!(reopened.sample_rate(), 22050);

        let mut buffer = FrameBuffer::new(2, 3);
        reopened.read_frames(0, 3, &mut buffer).unwrap();
        assert_eq!(buffer.channel(0), &[0.25, -0.5, 0.75]);
    }

    #[test]
    fn test_export_timeout_leaves_no_file() {
        let dir = tempdir().unwrap();
        let mut frames = BufferedFrames::new(1, 8000, vec![0.5; 100]);

        let err = export_to_wav(&mut frames, dir.path(), Instant::now()).unwrap_err();
        assert!(matches!(
            err,
            MaterializeError::Timeout(MaterializePhase::Export)
        ));
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_exported_copy_removed_on_drop() {
        let dir = tempdir().unwrap();
        let mut frames = BufferedFrames::new(1, 8000, vec![0.5; 10]);

        let exported =
            export_to_wav(&mut frames, dir.path(), Instant::now() + Duration::from_secs(5))
                .unwrap();
        assert!(!dir_is_empty(dir.path()));
        drop(exported);
        assert!(dir_is_empty(dir.path()));
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = Config::new();
        config.fetch_timeout_secs = 5;
        config.export_timeout_secs = 7;
        config.temp_dir = Some("/tmp/zim-waveform-test".to_string());

        let options = MaterializeOptions::from_config(&config);
        assert_eq!(options.fetch_timeout, Duration::from_secs(5));
        assert_eq!(options.export_timeout, Duration::from_secs(7));
        assert_eq!(options.temp_dir, PathBuf::from("/tmp/zim-waveform-test"));
    }

    #[test]
    fn test_default_timeouts() {
        let options = MaterializeOptions::default();
        assert_eq!(options.fetch_timeout, Duration::from_secs(30));
        assert_eq!(options.export_timeout, Duration::from_secs(60));
    }
}
