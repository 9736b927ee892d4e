//! Seekable WAV frame source backed by hound.
//!
//! Only the frames asked for are decoded: every read seeks the underlying
//! reader and pulls `frames * channels` samples, so long recordings never
//! have to fit in memory.

use super::{FrameBuffer, FrameSource};
use crate::error::{WaveformError, WaveformResult};
use hound::{SampleFormat, WavReader, WavSpec};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

type Reader = WavReader<BufReader<File>>;

pub struct WavFrames {
    reader: Reader,
    path: PathBuf,
    spec: WavSpec,
    frames: u64,
}

impl WavFrames {
    pub fn open(path: &Path) -> WaveformResult<Self> {
        let reader = WavReader::open(path)
            .map_err(|e| WaveformError::Decode(format!("{}: {e}", path.display())))?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(WaveformError::Decode(format!(
                "{}: no audio channels",
                path.display()
            )));
        }
        if spec.sample_format == SampleFormat::Int && !(1..=32).contains(&spec.bits_per_sample) {
            return Err(WaveformError::Decode(format!(
                "Unsupported bit depth: {}",
                spec.bits_per_sample
            )));
        }

        log::info!(
            "WAV format: {} Hz, {} channels, {} bits, {:?}",
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );

        Ok(Self {
            frames: u64::from(reader.duration()),
            reader,
            path: path.to_path_buf(),
            spec,
        })
    }
}

/// Pull up to `wanted` interleaved samples into `buffer`.
///
/// Returns `true` when the data chunk ended before its declared length, as
/// it does for recordings cut off mid-write.
fn fill<S: hound::Sample>(
    reader: &mut Reader,
    channels: usize,
    wanted: usize,
    buffer: &mut FrameBuffer,
    to_float: impl Fn(S) -> f32,
) -> WaveformResult<bool> {
    for (n, sample) in reader.samples::<S>().take(wanted).enumerate() {
        match sample {
            Ok(sample) => buffer.push(n % channels, to_float(sample)),
            Err(hound::Error::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                return Ok(true);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(false)
}

impl FrameSource for WavFrames {
    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn channel_count(&self) -> usize {
        usize::from(self.spec.channels)
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn read_frames(
        &mut self,
        start: u64,
        frames: usize,
        buffer: &mut FrameBuffer,
    ) -> WaveformResult<usize> {
        buffer.clear();
        if start >= self.frames || frames == 0 {
            return Ok(0);
        }

        // duration() is a u32, so any in-range start fits
        let position = u32::try_from(start).map_err(|_| {
            WaveformError::Read(format!("frame {start} is beyond the WAV addressable range"))
        })?;
        self.reader
            .seek(position)
            .map_err(|e| WaveformError::Read(e.to_string()))?;

        let channels = self.channel_count();
        let wanted = (self.frames - start).min(frames as u64) as usize * channels;

        let truncated = match self.spec.sample_format {
            SampleFormat::Float => fill(&mut self.reader, channels, wanted, buffer, |s: f32| s)?,
            SampleFormat::Int => {
                let scale = (1i64 << (self.spec.bits_per_sample - 1)) as f32;
                fill(&mut self.reader, channels, wanted, buffer, |s: i32| {
                    s as f32 / scale
                })?
            }
        };

        if truncated {
            log::warn!(
                "{}: audio data ends at frame {} of {}",
                self.path.display(),
                start + buffer.frame_len() as u64,
                self.frames
            );
            // hound counts the failed sample as read, so its seek bookkeeping
            // no longer matches the file. Start over from a fresh reader.
            self.reader = WavReader::open(&self.path)
                .map_err(|e| WaveformError::Read(format!("{}: {e}", self.path.display())))?;
        }

        Ok(buffer.frame_len())
    }
}
