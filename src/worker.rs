//! Running an extraction session on its own thread.
//!
//! Opening the source (including any remote materialization) and the whole
//! bucket loop happen on a dedicated worker, so the caller's thread only ever
//! blocks when it chooses to [`join`](ExtractionHandle::join).

use crate::cancel::CancellationToken;
use crate::error::{ErrorPayload, WaveformError};
use crate::events::{EventSink, SessionEvents};
use crate::extractor::{AmplitudeMatrix, ExtractionRequest, WaveformExtractor};
use crate::locator::Locator;
use crate::remote::MaterializeOptions;
use crate::source::SampleSource;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub type ExtractionResult = Result<Option<AmplitudeMatrix>, ErrorPayload>;

/// Caller-side handle on a running extraction
#[derive(Debug)]
pub struct ExtractionHandle {
    session_key: String,
    cancel: CancellationToken,
    events: SessionEvents,
    worker: JoinHandle<ExtractionResult>,
}

impl ExtractionHandle {
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Stop at the next bucket boundary. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Mark the owning context as gone: no further events are dispatched
    pub fn tear_down(&self) {
        self.events.mark_torn_down();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker. `Ok(None)` means the extraction was cancelled.
    pub fn join(self) -> ExtractionResult {
        self.worker.join().unwrap_or_else(|_| {
            Err(ErrorPayload::from(WaveformError::Worker(
                "worker thread panicked".to_string(),
            )))
        })
    }
}

/// Open `locator` and extract `request` on a new worker thread
pub fn spawn_extraction(
    locator: Locator,
    options: MaterializeOptions,
    request: ExtractionRequest,
    session_key: impl Into<String>,
    sink: Arc<dyn EventSink>,
) -> io::Result<ExtractionHandle> {
    let session_key = session_key.into();
    let cancel = CancellationToken::new();
    let events = SessionEvents::new(sink);

    let worker = {
        let cancel = cancel.clone();
        let events = events.clone();
        let session_key = session_key.clone();
        thread::Builder::new()
            .name(format!("waveform-{session_key}"))
            .spawn(move || run_session(&locator, &options, &request, &session_key, events, cancel))?
    };

    Ok(ExtractionHandle {
        session_key,
        cancel,
        events,
        worker,
    })
}

fn run_session(
    locator: &Locator,
    options: &MaterializeOptions,
    request: &ExtractionRequest,
    session_key: &str,
    events: SessionEvents,
    cancel: CancellationToken,
) -> ExtractionResult {
    let source = SampleSource::open(locator, options).map_err(|e| {
        log::warn!("Session {session_key} could not open its source: {e}");
        ErrorPayload::from(e)
    })?;

    let mut extractor = WaveformExtractor::new(source, events, cancel);
    let result = extractor.extract(request, session_key);
    extractor.close();

    result.map_err(ErrorPayload::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelSink;
    use serde_json::Value;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, mpsc};
    use tempfile::tempdir;

    fn write_stereo(path: &Path, frames: u32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(8192i16).unwrap();
            writer.write_sample(-8192i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_worker_extracts_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_stereo(&path, 2000);

        let (sink, rx) = ChannelSink::new();
        let handle = spawn_extraction(
            Locator::Local(path),
            MaterializeOptions::default(),
            ExtractionRequest::new(20),
            "session-a",
            Arc::new(sink),
        )
        .unwrap();
        assert_eq!(handle.session_key(), "session-a");

        let matrix = handle.join().unwrap().unwrap();
        assert_eq!(matrix.channel_count(), 2);
        assert!(matrix.merged().unwrap().iter().all(|&a| (a - 0.25).abs() < 1e-4));
        assert_eq!(rx.try_iter().count(), 20);
    }

    #[test]
    fn test_worker_reports_decode_error() {
        let (sink, _rx) = ChannelSink::new();
        let handle = spawn_extraction(
            Locator::Local(PathBuf::from("/nonexistent/take.wav")),
            MaterializeOptions::default(),
            ExtractionRequest::default(),
            "session-b",
            Arc::new(sink),
        )
        .unwrap();

        let payload = handle.join().unwrap_err();
        assert_eq!(payload.code, "DECODE_ERROR");
    }

    #[test]
    fn test_worker_cancelled_before_first_bucket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_stereo(&path, 2000);

        let token = CancellationToken::new();
        token.cancel();
        let (sink, rx) = ChannelSink::new();
        let source = SampleSource::open_local(&path).unwrap();
        let events = SessionEvents::new(Arc::new(sink));

        let result = run_session_with(source, events, token);
        assert!(result.unwrap().is_none());
        assert!(rx.try_recv().is_err());
    }

    fn run_session_with(
        source: SampleSource,
        events: SessionEvents,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        let mut extractor = WaveformExtractor::new(source, events, cancel);
        let result = extractor.extract(&ExtractionRequest::new(20), "session-c");
        extractor.close();
        result.map_err(ErrorPayload::from)
    }

    #[test]
    fn test_tear_down_silences_running_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_stereo(&path, 2000);

        // The sink holds the worker inside the first event until the gate
        // sender is dropped
        let (tx, rx) = mpsc::channel::<f64>();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate = Mutex::new(gate_rx);
        let sink = move |_: &str, payload: Value| {
            let _ = tx.send(payload["progress"].as_f64().unwrap_or_default());
            let _ = gate.lock().unwrap().recv();
        };

        let handle = spawn_extraction(
            Locator::Local(path),
            MaterializeOptions::default(),
            ExtractionRequest::new(20),
            "session-e",
            Arc::new(sink),
        )
        .unwrap();

        assert!((rx.recv().unwrap() - 0.05).abs() < 1e-6);
        handle.tear_down();
        drop(gate_tx);

        // The extraction itself still completes
        let matrix = handle.join().unwrap().unwrap();
        assert_eq!(matrix.len(), 20);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_range_error_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_stereo(&path, 100);

        let (sink, _rx) = ChannelSink::new();
        let handle = spawn_extraction(
            Locator::Local(path),
            MaterializeOptions::default(),
            ExtractionRequest::new(100).with_offset(Some(150)),
            "session-d",
            Arc::new(sink),
        )
        .unwrap();

        let payload = handle.join().unwrap_err();
        assert_eq!(payload.code, "RANGE_ERROR");
    }
}
