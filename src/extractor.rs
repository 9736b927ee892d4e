//! The extraction controller.
//!
//! [`WaveformExtractor::extract`] walks the planned buckets one at a time:
//! read the bucket's frames, reduce every channel to its RMS, store the
//! values in the [`AmplitudeMatrix`], then merge the channels and emit a
//! progress event. The cancellation token is polled before each bucket.
//!
//! The source position observed when the call starts is restored on every
//! way out of it: completion, error and cancellation alike.

use crate::cancel::CancellationToken;
use crate::constants::DEFAULT_SAMPLES_PER_PIXEL;
use crate::error::WaveformResult;
use crate::events::{ProgressEvent, SessionEvents};
use crate::merger;
use crate::planner;
use crate::reducer;
use crate::source::{FrameBuffer, SampleSource};
use serde::Serialize;

/// Parameters of one `extract` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Number of output buckets, at least 1
    pub samples_per_pixel: usize,
    /// First bucket; `None` continues from the source position and a
    /// negative value reaches back from it
    pub offset: Option<i64>,
    /// Maximum number of buckets to produce
    pub length_limit: Option<u64>,
}

impl Default for ExtractionRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_PIXEL)
    }
}

impl ExtractionRequest {
    pub fn new(samples_per_pixel: usize) -> Self {
        Self {
            samples_per_pixel: samples_per_pixel.max(1),
            offset: Some(0),
            length_limit: None,
        }
    }

    pub fn with_offset(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_length_limit(mut self, length_limit: Option<u64>) -> Self {
        self.length_limit = length_limit;
        self
    }
}

/// RMS amplitude per channel per bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmplitudeMatrix {
    channels: Vec<Vec<f32>>,
}

impl AmplitudeMatrix {
    pub fn zeroed(channel_count: usize, samples_per_pixel: usize) -> Self {
        Self {
            channels: vec![vec![0.0; samples_per_pixel]; channel_count],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Buckets per channel
    pub fn len(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Channels merged into the single displayed waveform
    pub fn merged(&self) -> WaveformResult<Vec<f32>> {
        merger::merge_channels(&self.channels)
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    fn set(&mut self, channel: usize, bucket: usize, amplitude: f32) {
        if let Some(slot) = self
            .channels
            .get_mut(channel)
            .and_then(|c| c.get_mut(bucket))
        {
            *slot = amplitude;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Idle,
    Planning,
    Reading,
    Reducing,
    Emitting,
    Done,
    Aborted,
    Failed,
}

/// One extraction session: exclusive owner of a source and its event channel
#[derive(Debug)]
pub struct WaveformExtractor {
    source: SampleSource,
    events: SessionEvents,
    cancel: CancellationToken,
    state: ExtractionState,
}

impl WaveformExtractor {
    pub fn new(source: SampleSource, events: SessionEvents, cancel: CancellationToken) -> Self {
        Self {
            source,
            events,
            cancel,
            state: ExtractionState::Idle,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop at the next bucket boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut SampleSource {
        &mut self.source
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Extract the waveform described by `request`.
    ///
    /// Returns `Ok(None)` when cancelled; no event or error is produced for a
    /// cancellation. Events emitted before a failure stay delivered.
    pub fn extract(
        &mut self,
        request: &ExtractionRequest,
        session_key: &str,
    ) -> WaveformResult<Option<AmplitudeMatrix>> {
        let samples_per_pixel = request.samples_per_pixel.max(1);
        let saved_position = self.source.position();

        self.state = ExtractionState::Planning;
        let plan = planner::plan(
            self.source.total_frames(),
            samples_per_pixel,
            request.offset,
            request.length_limit,
            saved_position,
        )
        .inspect_err(|e| {
            log::warn!("Waveform plan rejected for {session_key}: {e}");
            self.state = ExtractionState::Failed;
        })?;

        log::debug!(
            "Extracting {session_key}: buckets {}..{} of {}, {} frames each from frame {}",
            plan.start_bucket,
            plan.end_bucket,
            samples_per_pixel,
            plan.frames_per_bucket,
            plan.start_frame
        );

        let channel_count = self.source.channel_count();
        let mut matrix = AmplitudeMatrix::zeroed(channel_count, samples_per_pixel);
        let mut buffer = FrameBuffer::new(channel_count, plan.frames_per_bucket as usize);
        let mut processed = 0usize;

        let mut source = scopeguard::guard(&mut self.source, move |source| {
            source.set_position(saved_position);
        });

        for bucket in plan.buckets() {
            if self.cancel.take() {
                log::info!(
                    "Extraction {session_key} cancelled before bucket {}",
                    bucket.index
                );
                self.state = ExtractionState::Aborted;
                return Ok(None);
            }

            self.state = ExtractionState::Reading;
            let delivered = source
                .read(bucket.start_frame, bucket.frame_count as usize, &mut buffer)
                .inspect_err(|e| {
                    log::warn!("Extraction {session_key} failed at bucket {}: {e}", bucket.index);
                    self.state = ExtractionState::Failed;
                })?;

            self.state = ExtractionState::Reducing;
            for channel in 0..channel_count {
                let rms = reducer::reduce(buffer.channel(channel), delivered);
                matrix.set(channel, bucket.index, rms);
            }

            self.state = ExtractionState::Emitting;
            processed += 1;
            let waveform_data = matrix.merged().inspect_err(|_| {
                self.state = ExtractionState::Failed;
            })?;
            self.events.emit_progress(&ProgressEvent {
                waveform_data,
                progress: processed as f32 / samples_per_pixel as f32,
                session_key: session_key.to_string(),
            });
        }

        self.state = ExtractionState::Done;
        log::info!("Extraction {session_key} finished after {processed} buckets");
        Ok(Some(matrix))
    }

    /// End the session: no more events, and a materialized copy is deleted
    pub fn close(self) {
        self.events.mark_torn_down();
        self.source.close();
    }
}
