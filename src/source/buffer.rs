//! Per-channel sample buffers and the in-memory frame source.

use super::FrameSource;
use crate::error::WaveformResult;

/// Deinterleaved float samples for one read.
///
/// The buffer is reused across reads; every read clears it first so the
/// channel slices always hold exactly the frames that were delivered.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    channels: Vec<Vec<f32>>,
}

impl FrameBuffer {
    pub fn new(channel_count: usize, frame_capacity: usize) -> Self {
        Self {
            channels: (0..channel_count)
                .map(|_| Vec::with_capacity(frame_capacity))
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples delivered for `channel`; empty for channels that do not exist
    pub fn channel(&self, channel: usize) -> &[f32] {
        self.channels.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of complete frames held
    pub fn frame_len(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Append interleaved samples (L,R,L,R,...) frame by frame
    pub fn push_interleaved(&mut self, samples: &[f32]) {
        let count = self.channels.len();
        if count == 0 {
            return;
        }
        for frame in samples.chunks_exact(count) {
            for (channel, &sample) in self.channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
    }

    pub(crate) fn push(&mut self, channel: usize, sample: f32) {
        if let Some(samples) = self.channels.get_mut(channel) {
            samples.push(sample);
        }
    }
}

/// Fully decoded audio held in memory as interleaved samples.
///
/// FLAC streams are decoded into this up front since claxon cannot seek;
/// it also backs synthetic sources.
#[derive(Debug, Clone)]
pub struct BufferedFrames {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl BufferedFrames {
    /// Wrap interleaved samples. A trailing partial frame is dropped.
    pub fn new(channels: usize, sample_rate: u32, mut samples: Vec<f32>) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels;
        samples.truncate(whole);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Build from one vector per channel; shorter channels are zero padded
    pub fn from_channels(sample_rate: u32, channels: &[Vec<f32>]) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels.len());
        for frame in 0..frames {
            for channel in channels {
                samples.push(channel.get(frame).copied().unwrap_or(0.0));
            }
        }
        Self::new(channels.len(), sample_rate, samples)
    }
}

impl FrameSource for BufferedFrames {
    fn frame_count(&self) -> u64 {
        (self.samples.len() / self.channels) as u64
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(
        &mut self,
        start: u64,
        frames: usize,
        buffer: &mut FrameBuffer,
    ) -> WaveformResult<usize> {
        buffer.clear();
        let total = self.frame_count();
        if start >= total {
            return Ok(0);
        }
        let available = (total - start).min(frames as u64) as usize;
        let from = start as usize * self.channels;
        let to = from + available * self.channels;
        buffer.push_interleaved(&self.samples[from..to]);
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_interleaved_deinterleaves() {
        let mut buffer = FrameBuffer::new(2, 4);
        buffer.push_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3]);

        assert_eq!(buffer.frame_len(), 2);
        assert_eq!(buffer.channel(0), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1), &[-0.1, -0.2]);
        assert!(buffer.channel(2).is_empty());
    }

    #[test]
    fn test_buffered_read_partial_at_end() {
        let mut frames = BufferedFrames::new(1, 8000, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut buffer = FrameBuffer::new(1, 4);

        let delivered = frames.read_frames(3, 4, &mut buffer).unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(buffer.channel(0), &[4.0, 5.0]);

        let delivered = frames.read_frames(5, 4, &mut buffer).unwrap();
        assert_eq!(delivered, 0);
        assert!(buffer.channel(0).is_empty());
    }

    #[test]
    fn test_from_channels_pads_short_channel() {
        let frames = BufferedFrames::from_channels(44100, &[vec![1.0, 1.0, 1.0], vec![0.5]]);
        assert_eq!(frames.frame_count(), 3);
        assert_eq!(frames.channel_count(), 2);
        assert_eq!(frames.samples, vec![1.0, 0.5, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_trailing_partial_frame_dropped() {
        let frames = BufferedFrames::new(2, 8000, vec![0.0, 0.0, 1.0]);
        assert_eq!(frames.frame_count(), 1);
    }
}
