//! FLAC decoding through claxon.

use super::BufferedFrames;
use crate::error::{WaveformError, WaveformResult};
use std::path::Path;

/// Decode a whole FLAC stream into memory
pub fn decode_flac(path: &Path) -> WaveformResult<BufferedFrames> {
    let mut reader = claxon::FlacReader::open(path)
        .map_err(|e| WaveformError::Decode(format!("{}: {e}", path.display())))?;
    let info = reader.streaminfo();

    if info.channels == 0 || info.bits_per_sample == 0 {
        return Err(WaveformError::Decode(format!(
            "{}: invalid stream info",
            path.display()
        )));
    }

    let scale = (1i64 << (info.bits_per_sample - 1)) as f32;
    let mut samples = Vec::with_capacity(
        info.samples
            .map(|frames| frames as usize * info.channels as usize)
            .unwrap_or_default(),
    );
    for sample in reader.samples() {
        samples.push(sample? as f32 / scale);
    }

    log::info!(
        "FLAC loaded: {} Hz, {} channels, {} samples",
        info.sample_rate,
        info.channels,
        samples.len()
    );

    Ok(BufferedFrames::new(
        info.channels as usize,
        info.sample_rate,
        samples,
    ))
}
