//! Randomly seekable PCM sample sources.
//!
//! A [`SampleSource`] owns one decoded audio stream for the lifetime of an
//! extraction session. It is opened either straight from a local file or from
//! a local copy materialized out of a remote asset, in which case the copy is
//! deleted when the source is closed or dropped.

mod buffer;
mod flac;
mod wav;

pub use buffer::{BufferedFrames, FrameBuffer};
pub use flac::decode_flac;
pub use wav::WavFrames;

use crate::error::{WaveformError, WaveformResult};
use crate::locator::Locator;
use crate::remote::{self, MaterializeOptions};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A finite stream of multi-channel frames that can be read at any offset.
pub trait FrameSource: Send {
    fn frame_count(&self) -> u64;

    fn channel_count(&self) -> usize;

    fn sample_rate(&self) -> u32;

    /// Read up to `frames` frames starting at `start` into `buffer`.
    ///
    /// Returns the number of frames delivered, which is smaller than `frames`
    /// only at the end of the stream.
    fn read_frames(
        &mut self,
        start: u64,
        frames: usize,
        buffer: &mut FrameBuffer,
    ) -> WaveformResult<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Flac,
}

impl AudioFormat {
    /// Detect the container from its magic bytes, falling back to the extension
    pub fn detect(path: &Path) -> WaveformResult<Self> {
        let mut magic = [0u8; 4];
        let sniffed = File::open(path)
            .and_then(|mut file| file.read_exact(&mut magic))
            .is_ok();

        if sniffed {
            match &magic {
                b"RIFF" | b"RIFX" | b"RF64" => return Ok(AudioFormat::Wav),
                b"fLaC" => return Ok(AudioFormat::Flac),
                _ => {}
            }
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "wav" | "wave" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            _ => Err(WaveformError::Decode(format!(
                "Unsupported audio format: {}",
                path.display()
            ))),
        }
    }
}

/// Open a local audio file with the decoder matching its format
pub fn open_frames(path: &Path) -> WaveformResult<Box<dyn FrameSource>> {
    if !path.is_file() {
        return Err(WaveformError::Decode(format!(
            "Audio file not found: {}",
            path.display()
        )));
    }

    match AudioFormat::detect(path)? {
        AudioFormat::Wav => Ok(Box::new(WavFrames::open(path)?)),
        AudioFormat::Flac => Ok(Box::new(decode_flac(path)?)),
    }
}

enum Backing {
    Local(Option<PathBuf>),
    Materialized(TempPath),
}

/// The audio stream owned by one extraction session.
pub struct SampleSource {
    frames: Box<dyn FrameSource>,
    position: u64,
    backing: Backing,
}

impl SampleSource {
    /// Open a locator, materializing remote assets into a local copy first
    pub fn open(locator: &Locator, options: &MaterializeOptions) -> WaveformResult<Self> {
        match locator {
            Locator::Local(path) => Self::open_local(path),
            Locator::Remote { url, headers } => {
                let local = remote::materialize(url, headers, options)?;
                let frames = open_frames(&local)?;
                log::info!("Opened materialized copy of {url} at {}", local.display());
                Ok(Self {
                    frames,
                    position: 0,
                    backing: Backing::Materialized(local),
                })
            }
        }
    }

    pub fn open_local(path: &Path) -> WaveformResult<Self> {
        let frames = open_frames(path)?;
        log::info!(
            "Opened {}: {} frames, {} channels, {} Hz",
            path.display(),
            frames.frame_count(),
            frames.channel_count(),
            frames.sample_rate()
        );
        Ok(Self {
            frames,
            position: 0,
            backing: Backing::Local(Some(path.to_path_buf())),
        })
    }

    /// Wrap an already decoded stream
    pub fn from_frames(frames: Box<dyn FrameSource>) -> Self {
        Self {
            frames,
            position: 0,
            backing: Backing::Local(None),
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.frames.frame_count()
    }

    pub fn channel_count(&self) -> usize {
        self.frames.channel_count()
    }

    pub fn sample_rate(&self) -> u32 {
        self.frames.sample_rate()
    }

    /// Current read position as a frame index
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn set_position(&mut self, frame: u64) {
        self.position = frame;
    }

    pub fn is_remote_backed(&self) -> bool {
        matches!(self.backing, Backing::Materialized(_))
    }

    /// File the frames are read from, if any
    pub fn path(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Local(path) => path.as_deref(),
            Backing::Materialized(temp) => Some(&**temp),
        }
    }

    /// Read `frame_count` frames at `start_frame`, leaving the position just
    /// after the last delivered frame.
    pub fn read(
        &mut self,
        start_frame: u64,
        frame_count: usize,
        buffer: &mut FrameBuffer,
    ) -> WaveformResult<usize> {
        self.position = start_frame;
        let delivered = self.frames.read_frames(start_frame, frame_count, buffer)?;
        self.position = start_frame + delivered as u64;
        Ok(delivered)
    }

    /// Release the stream, deleting a materialized copy.
    ///
    /// Deletion failures are logged and otherwise ignored.
    pub fn close(self) {
        let SampleSource {
            frames, backing, ..
        } = self;
        drop(frames);

        if let Backing::Materialized(temp) = backing {
            let path = temp.to_path_buf();
            match temp.close() {
                Ok(()) => log::debug!("Removed materialized copy {}", path.display()),
                Err(e) => log::warn!(
                    "Failed to remove materialized copy {}: {e}",
                    path.display()
                ),
            }
        }
    }
}

impl std::fmt::Debug for SampleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSource")
            .field("total_frames", &self.total_frames())
            .field("channels", &self.channel_count())
            .field("sample_rate", &self.sample_rate())
            .field("position", &self.position)
            .field("remote", &self.is_remote_backed())
            .finish()
    }
}
