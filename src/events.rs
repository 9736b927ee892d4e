//! Progress events and the sink they are dispatched to.
//!
//! The host application injects an [`EventSink`]; the engine never reaches for
//! a global dispatcher. Delivery is fire-and-forget. Once a session is torn
//! down its [`SessionEvents`] silently drops everything, so a worker that is
//! still finishing a bucket cannot dispatch into a destroyed context.

use crate::constants::EVENT_EXTRACTION_PROGRESS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

pub trait EventSink: Send + Sync {
    fn dispatch(&self, event_name: &str, payload: Value);
}

impl<F> EventSink for F
where
    F: Fn(&str, Value) + Send + Sync,
{
    fn dispatch(&self, event_name: &str, payload: Value) {
        self(event_name, payload)
    }
}

/// Forwards events over an mpsc channel; a dropped receiver is ignored
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<(String, Value)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<(String, Value)>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn dispatch(&self, event_name: &str, payload: Value) {
        let _ = self.tx.send((event_name.to_string(), payload));
    }
}

/// Payload of [`EVENT_EXTRACTION_PROGRESS`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Merged amplitudes of every bucket so far, unprocessed buckets are 0.0
    pub waveform_data: Vec<f32>,
    /// Fraction of the requested buckets processed, in (0, 1]
    pub progress: f32,
    pub session_key: String,
}

/// Session-scoped handle on the injected sink
#[derive(Clone)]
pub struct SessionEvents {
    sink: Arc<dyn EventSink>,
    torn_down: Arc<AtomicBool>,
}

impl SessionEvents {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            torn_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Suppress every later dispatch from this session and its clones
    pub fn mark_torn_down(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    pub fn emit_progress(&self, event: &ProgressEvent) {
        if self.is_torn_down() {
            log::debug!(
                "Session {} torn down, dropping progress {:.3}",
                event.session_key,
                event.progress
            );
            return;
        }

        match serde_json::to_value(event) {
            Ok(payload) => self.sink.dispatch(EVENT_EXTRACTION_PROGRESS, payload),
            Err(e) => log::warn!("Failed to encode progress event: {e}"),
        }
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents")
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
